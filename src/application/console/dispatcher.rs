//! Read-eval loop over a [`LineSource`].

use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use super::command::{CommandContext, CommandOutcome};
use super::input::{LineEvent, LineSource};
use super::output;
use super::registry::CommandRegistry;
use crate::application::context::NodeContext;
use crate::application::panic_reason;
use crate::error::CommandError;

const EXIT_HINT: &str = "to exit type exit";

/// Runs console commands against the node context.
///
/// Each line is tokenized, checked against the handler's arity and argument
/// formats, and only then executed. A failing handler is reported inline; a
/// panicking one restarts the loop.
pub struct Dispatcher {
    ctx: NodeContext,
    registry: Arc<CommandRegistry>,
    out: Box<dyn Write + Send>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(ctx: NodeContext, registry: Arc<CommandRegistry>, out: Box<dyn Write + Send>) -> Self {
        Self { ctx, registry, out }
    }

    /// Run one line. Blank lines do nothing.
    pub fn dispatch(&mut self, line: &str) -> CommandOutcome {
        let Some(command) = CommandContext::parse(line) else {
            return CommandOutcome::Continue;
        };
        let outcome = match self.execute(&command) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(&command, &err);
                CommandOutcome::Continue
            }
        };
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "Failed to flush console output");
        }
        outcome
    }

    fn execute(&mut self, command: &CommandContext) -> Result<CommandOutcome, CommandError> {
        let Some(handler) = self.registry.lookup(&command.name).cloned() else {
            writeln!(
                self.out,
                "unknown command `{}`, type help for the list",
                command.name
            )?;
            return Ok(CommandOutcome::Continue);
        };

        if !handler.arity().accepts(command.args.len()) {
            return Err(CommandError::Usage(handler.usage()));
        }
        handler.validate(&command.args)?;

        if handler.mutating(&command.args) && self.ctx.shutdown.is_fired() {
            return Err(CommandError::Rejected(
                "shutdown in progress, command refused".into(),
            ));
        }

        debug!(command = %command.name, args = ?command.args, "Executing console command");
        handler.execute(&command.args, &self.ctx, &mut *self.out)
    }

    fn report(&mut self, command: &CommandContext, err: &CommandError) {
        let written = match err {
            CommandError::Usage(_) => writeln!(self.out, "{err}"),
            CommandError::Rejected(_) => output::error(&mut *self.out, err),
            CommandError::Failed(_) => {
                warn!(command = %command.name, error = %err, "Console command failed");
                output::error(&mut *self.out, err)
            }
        };
        if let Err(e) = written {
            warn!(error = %e, "Failed to write console output");
        }
    }

    fn hint(&mut self, text: &str) {
        if let Err(e) = output::hint(&mut *self.out, text).and_then(|()| self.out.flush()) {
            warn!(error = %e, "Failed to write console output");
        }
    }

    /// Read and execute lines until `exit` or the shutdown signal.
    pub async fn run(&mut self, source: &mut dyn LineSource) {
        info!(commands = self.registry.len(), "Console ready");
        loop {
            match AssertUnwindSafe(self.session(source)).catch_unwind().await {
                Ok(()) => break,
                Err(panic) => {
                    error!(reason = %panic_reason(&*panic), "Console command panicked, restarting console");
                    if self.ctx.shutdown.is_fired() {
                        break;
                    }
                }
            }
        }
        debug!("Console stopped");
    }

    async fn session(&mut self, source: &mut dyn LineSource) {
        let shutdown = self.ctx.shutdown.clone();
        loop {
            if shutdown.is_fired() {
                return;
            }
            let event = tokio::select! {
                event = source.next_line() => event,
                () = shutdown.wait() => return,
            };
            match event {
                LineEvent::Line(line) => {
                    if self.dispatch(&line) == CommandOutcome::Exit {
                        return;
                    }
                }
                LineEvent::Interrupted(partial) if partial.trim().is_empty() => self.hint(EXIT_HINT),
                LineEvent::Interrupted(_) => {}
                LineEvent::Eof => self.hint(EXIT_HINT),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::console::command::Arity;
    use crate::application::console::commands::lifecycle::Exit;
    use crate::application::console::CommandHandler;
    use crate::port::outbound::{PeerNetwork, TxPool};
    use crate::testkit::{plain, ScriptedLines, TestNode};

    // ------------------------------------------------------------------------
    // dispatch
    // ------------------------------------------------------------------------

    #[test]
    fn unknown_command_is_reported() {
        let node = TestNode::new();
        let out = node.run("frobnicate now");
        assert!(out.contains("unknown command `frobnicate`"));
    }

    #[test]
    fn blank_line_does_nothing() {
        let node = TestNode::new();
        let (outcome, out) = node.run_outcome("   ");
        assert_eq!(outcome, CommandOutcome::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn names_are_case_insensitive() {
        let node = TestNode::new();
        assert!(node.run("VERSION").contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn arity_violation_prints_usage_and_mutates_nothing() {
        let node = TestNode::builder().peers(1).build();
        let out = node.run("ban");
        assert_eq!(out.trim(), "usage: ban <ip> [seconds]");
        assert!(node.network.bans().is_empty());
    }

    #[test]
    fn malformed_argument_prints_usage_and_mutates_nothing() {
        let node = TestNode::builder().peers(1).build();
        let out = node.run("ban 10.0.0.1 -5");
        assert!(out.starts_with("usage: ban"));
        assert!(node.network.bans().is_empty());
    }

    #[test]
    fn mutating_command_refused_after_shutdown() {
        let node = TestNode::new();
        node.mempool.add(vec![1], 1);
        node.ctx.shutdown.fire();

        let out = node.run("mempool_flush");
        assert!(out.contains("shutdown in progress, command refused"));
        assert_eq!(node.mempool.len(), 1);

        // read-only commands still answer
        assert!(node.run("mempool_print").contains("mempool (1 transactions)"));
    }

    #[test]
    fn config_menu_answers_after_shutdown_but_changes_are_refused() {
        let node = TestNode::new();
        node.ctx.shutdown.fire();

        assert!(node.run("config").contains("Running Configuration"));

        let before = node.ctx.config.snapshot().min_peers;
        let out = node.run("config min_peers 20");
        assert!(out.contains("shutdown in progress, command refused"));
        assert_eq!(node.ctx.config.snapshot().min_peers, before);
    }

    // ------------------------------------------------------------------------
    // run
    // ------------------------------------------------------------------------

    struct Boom;

    impl CommandHandler for Boom {
        fn name(&self) -> &'static str {
            "boom"
        }

        fn usage(&self) -> &'static str {
            "boom"
        }

        fn summary(&self) -> &'static str {
            "Panic"
        }

        fn arity(&self) -> Arity {
            Arity::NONE
        }

        fn execute(
            &self,
            _args: &[String],
            _ctx: &NodeContext,
            _out: &mut dyn Write,
        ) -> Result<CommandOutcome, CommandError> {
            panic!("handler exploded")
        }
    }

    #[tokio::test]
    async fn exit_ends_the_loop_and_fires_shutdown() {
        let node = TestNode::new();
        let (mut dispatcher, buffer) = node.dispatcher();
        let mut lines = ScriptedLines::new(["version", "exit", "status"]);

        dispatcher.run(&mut lines).await;

        assert_eq!(lines.remaining(), 1);
        assert!(node.ctx.shutdown.is_fired());
        assert!(plain(&buffer.contents()).contains("Exit in progress, please wait"));
    }

    #[tokio::test]
    async fn panicking_handler_restarts_the_loop() {
        let node = TestNode::new();
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(Boom)).register(Arc::new(Exit));
        let buffer = crate::testkit::SharedBuffer::new();
        let mut dispatcher = Dispatcher::new(node.ctx.clone(), Arc::new(registry), Box::new(buffer.clone()));
        let mut lines = ScriptedLines::new(["boom", "exit"]);

        dispatcher.run(&mut lines).await;

        assert_eq!(lines.remaining(), 0);
        assert!(buffer.contents().contains("Exit in progress"));
    }

    #[tokio::test]
    async fn interrupt_on_empty_line_prints_exit_hint() {
        let node = TestNode::new();
        let (mut dispatcher, buffer) = node.dispatcher();
        let mut lines = ScriptedLines::new(Vec::<String>::new())
            .then(LineEvent::Interrupted(String::new()))
            .then(LineEvent::Interrupted("half typed".into()))
            .then(LineEvent::Line("exit".into()));

        dispatcher.run(&mut lines).await;

        let out = plain(&buffer.contents());
        assert_eq!(out.matches(EXIT_HINT).count(), 1);
        assert!(!node.run("version").is_empty());
    }

    #[tokio::test]
    async fn shutdown_unblocks_idle_console() {
        let node = TestNode::new();
        let (mut dispatcher, _buffer) = node.dispatcher();
        let mut lines = ScriptedLines::new(Vec::<String>::new());

        let signal = node.ctx.shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            signal.fire();
        });

        tokio::time::timeout(Duration::from_secs(1), dispatcher.run(&mut lines))
            .await
            .unwrap();
    }
}
