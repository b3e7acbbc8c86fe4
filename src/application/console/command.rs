//! Command handler capability and the parsed form of one input line.

use std::io::Write;
use std::str::FromStr;

use crate::application::context::NodeContext;
use crate::error::CommandError;

/// What the dispatcher does after a command ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    /// Leave the console loop; the shutdown signal has been fired.
    Exit,
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub const NONE: Self = Self::Exactly(0);

    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::Between(lo, hi) => count >= lo && count <= hi,
            Self::AtLeast(n) => count >= n,
        }
    }
}

/// One console command.
///
/// The dispatcher checks [`arity`](Self::arity) and then
/// [`validate`](Self::validate) before calling [`execute`](Self::execute);
/// a handler must not touch any state before those pass.
pub trait CommandHandler: Send + Sync {
    /// Primary name, lowercase.
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line usage, e.g. `ban <ip> [seconds]`.
    fn usage(&self) -> &'static str;

    fn summary(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Changes local or collaborator state.
    fn mutating(&self, _args: &[String]) -> bool {
        false
    }

    /// Check argument formats. Runs before any side effect.
    fn validate(&self, _args: &[String]) -> Result<(), CommandError> {
        Ok(())
    }

    fn execute(
        &self,
        args: &[String],
        ctx: &NodeContext,
        out: &mut dyn Write,
    ) -> Result<CommandOutcome, CommandError>;
}

/// A tokenized input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    /// Lowercased command name.
    pub name: String,
    pub args: Vec<String>,
}

impl CommandContext {
    /// Split a line on whitespace. `None` for a blank line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?.to_lowercase();
        Some(Self {
            name,
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// Parse one argument, mapping failure to the handler's usage line.
pub fn parse_arg<T: FromStr>(value: &str, usage: &'static str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::Usage(usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lowercases_name_only() {
        let cmd = CommandContext::parse("  BAN 10.0.0.5  60 ").unwrap();
        assert_eq!(cmd.name, "ban");
        assert_eq!(cmd.args, ["10.0.0.5", "60"]);

        let cmd = CommandContext::parse("config node_tag My Node").unwrap();
        assert_eq!(cmd.args, ["node_tag", "My", "Node"]);
    }

    #[test]
    fn blank_line_is_none() {
        assert!(CommandContext::parse("   ").is_none());
    }

    #[test]
    fn arity_bounds() {
        assert!(Arity::NONE.accepts(0));
        assert!(!Arity::Exactly(1).accepts(2));
        assert!(Arity::Between(1, 2).accepts(2));
        assert!(!Arity::Between(1, 2).accepts(0));
        assert!(Arity::AtLeast(1).accepts(5));
    }

    #[test]
    fn parse_arg_reports_usage() {
        let err = parse_arg::<u64>("ten", "pop [count]").unwrap_err();
        assert!(matches!(err, CommandError::Usage("pop [count]")));
    }
}
