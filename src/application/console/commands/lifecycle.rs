//! `help` and `exit`.

use std::io::Write;

use tracing::info;

use super::super::command::{Arity, CommandHandler, CommandOutcome};
use crate::application::context::NodeContext;
use crate::error::CommandError;

/// Prints the help text captured when the registry was built.
pub struct Help {
    text: String,
}

impl Help {
    #[must_use]
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

impl CommandHandler for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    fn usage(&self) -> &'static str {
        "help"
    }

    fn summary(&self) -> &'static str {
        "Show this list"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        _ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        write!(out, "{}", self.text)?;
        Ok(CommandOutcome::Continue)
    }
}

pub struct Exit;

impl CommandHandler for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["quit", "bye"]
    }

    fn usage(&self) -> &'static str {
        "exit"
    }

    fn summary(&self) -> &'static str {
        "Shut the daemon down"
    }

    fn arity(&self) -> Arity {
        Arity::NONE
    }

    fn execute(
        &self,
        _args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError> {
        if ctx.shutdown.fire() {
            info!("Exit requested from console");
        }
        writeln!(out, "Exit in progress, please wait")?;
        Ok(CommandOutcome::Exit)
    }
}
