//! Operator console: command registry, dispatcher and built-in handlers.

pub mod command;
pub mod commands;
pub mod dispatcher;
pub mod input;
pub mod output;
pub mod registry;

pub use command::{Arity, CommandContext, CommandHandler, CommandOutcome};
pub use dispatcher::Dispatcher;
pub use input::{LineEvent, LineSource};
pub use registry::CommandRegistry;
