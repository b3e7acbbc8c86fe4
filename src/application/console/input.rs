//! Line input abstraction for the console.

use async_trait::async_trait;

/// One event from the operator's terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, without the trailing newline.
    Line(String),
    /// Interrupt keystroke; carries whatever had been typed so far.
    Interrupted(String),
    /// End of input.
    Eof,
}

/// Source of console lines.
#[async_trait]
pub trait LineSource: Send {
    async fn next_line(&mut self) -> LineEvent;
}
