//! Operator terminal: a line editor on its own thread and the status prompt.
//!
//! The editor blocks on the terminal, so it never runs on the async
//! runtime. The console asks for one line at a time; the editor only holds
//! the terminal between a request and its answer, which keeps command
//! output from interleaving with a half-drawn prompt.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    ConditionalEventHandler, Editor, Event, EventContext, EventHandler, Helper, KeyEvent,
    RepeatCount,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::console::{LineEvent, LineSource};
use crate::application::telemetry::StatusSink;
use crate::error::Result;

/// History file name, placed in the system temp directory.
pub const HISTORY_FILE: &str = "dagd_readline.tmp";

/// Prompt shown until the first status line is rendered.
pub const DEFAULT_PROMPT: &str = "DAGD >> ";

#[must_use]
pub fn history_path() -> PathBuf {
    std::env::temp_dir().join(HISTORY_FILE)
}

/// The prompt text, written by the status renderer and read by the editor
/// each time it asks for a line.
#[derive(Debug, Clone)]
pub struct Prompt(Arc<ArcSwap<String>>);

impl Prompt {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self(Arc::new(ArcSwap::from_pointee(initial.to_string())))
    }

    pub fn set(&self, text: &str) {
        self.0.store(Arc::new(text.to_string()));
    }

    #[must_use]
    pub fn get(&self) -> Arc<String> {
        self.0.load_full()
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl StatusSink for Prompt {
    fn show(&self, line: &str) {
        self.set(line);
    }
}

/// Completes the first word of a line against the registered command names.
#[derive(Debug, Clone, Default)]
pub struct CommandCompleter {
    names: Vec<String>,
}

impl CommandCompleter {
    #[must_use]
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort_unstable();
        names.dedup();
        Self { names }
    }

    /// Names matching what was typed so far. Arguments are not completed.
    #[must_use]
    pub fn candidates(&self, typed: &str) -> Vec<String> {
        let typed = typed.trim_start();
        if typed.contains(char::is_whitespace) {
            return Vec::new();
        }
        let typed = typed.to_lowercase();
        self.names
            .iter()
            .filter(|name| name.starts_with(&typed))
            .cloned()
            .collect()
    }
}

impl Completer for CommandCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let typed = &line[..pos];
        let start = typed.len() - typed.trim_start().len();
        Ok((start, self.candidates(typed)))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}

/// Remembers the partial line when Ctrl-C is pressed, then lets the editor
/// interrupt as usual.
struct CapturePartial(Arc<Mutex<String>>);

impl ConditionalEventHandler for CapturePartial {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<rustyline::Cmd> {
        *self.0.lock() = ctx.line().to_string();
        None
    }
}

/// Translate one editor result into a console event.
#[must_use]
pub fn line_event(read: rustyline::Result<String>, partial: &Mutex<String>) -> LineEvent {
    match read {
        Ok(line) => LineEvent::Line(line),
        Err(ReadlineError::Interrupted) => LineEvent::Interrupted(std::mem::take(&mut *partial.lock())),
        Err(ReadlineError::Eof) => LineEvent::Eof,
        Err(e) => {
            warn!(error = %e, "Console input failed");
            LineEvent::Eof
        }
    }
}

/// Console lines from the line editor thread.
///
/// After end of input the source reports [`LineEvent::Eof`] once and then
/// stays pending, so a detached daemon keeps running until it is signalled.
pub struct EditorLines {
    requests: mpsc::UnboundedSender<()>,
    events: mpsc::Receiver<LineEvent>,
    closed: bool,
}

impl EditorLines {
    /// Start the editor thread.
    ///
    /// # Errors
    /// Fails when the thread cannot be spawned.
    pub fn spawn(completer: CommandCompleter, prompt: Prompt) -> Result<Self> {
        let (requests, pending) = mpsc::unbounded_channel();
        let (answers, events) = mpsc::channel(1);
        std::thread::Builder::new()
            .name("dagd-console".into())
            .spawn(move || read_loop(completer, &prompt, pending, &answers))?;
        Ok(Self {
            requests,
            events,
            closed: false,
        })
    }
}

fn build_editor(
    completer: CommandCompleter,
    partial: &Arc<Mutex<String>>,
) -> rustyline::Result<Editor<CommandCompleter, DefaultHistory>> {
    let mut editor = Editor::new()?;
    editor.set_helper(Some(completer));
    editor.bind_sequence(
        KeyEvent::ctrl('C'),
        EventHandler::Conditional(Box::new(CapturePartial(Arc::clone(partial)))),
    );
    Ok(editor)
}

fn read_loop(
    completer: CommandCompleter,
    prompt: &Prompt,
    mut requests: mpsc::UnboundedReceiver<()>,
    answers: &mpsc::Sender<LineEvent>,
) {
    let partial = Arc::new(Mutex::new(String::new()));
    let mut editor = match build_editor(completer, &partial) {
        Ok(editor) => editor,
        Err(e) => {
            warn!(error = %e, "Line editor unavailable");
            let _ = answers.blocking_send(LineEvent::Eof);
            return;
        }
    };

    let history = history_path();
    if let Err(e) = editor.load_history(&history) {
        debug!(path = %history.display(), error = %e, "No console history loaded");
    }

    while requests.blocking_recv().is_some() {
        let event = line_event(editor.readline(&prompt.get()), &partial);
        if let LineEvent::Line(line) = &event {
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
                if let Err(e) = editor.save_history(&history) {
                    debug!(path = %history.display(), error = %e, "Failed to save console history");
                }
            }
        }
        let eof = event == LineEvent::Eof;
        if answers.blocking_send(event).is_err() || eof {
            break;
        }
    }
    debug!("Console input thread stopped");
}

#[async_trait]
impl LineSource for EditorLines {
    async fn next_line(&mut self) -> LineEvent {
        if self.closed || self.requests.send(()).is_err() {
            self.closed = true;
            return std::future::pending().await;
        }
        match self.events.recv().await {
            Some(event) => {
                self.closed = event == LineEvent::Eof;
                event
            }
            None => {
                self.closed = true;
                LineEvent::Eof
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_carries_the_partial_line_once() {
        let partial = Mutex::new("ban 10.0".to_string());
        assert_eq!(
            line_event(Err(ReadlineError::Interrupted), &partial),
            LineEvent::Interrupted("ban 10.0".into())
        );
        assert_eq!(
            line_event(Err(ReadlineError::Interrupted), &partial),
            LineEvent::Interrupted(String::new())
        );
    }

    #[test]
    fn editor_results_map_to_events() {
        let partial = Mutex::new(String::new());
        assert_eq!(line_event(Ok("status".into()), &partial), LineEvent::Line("status".into()));
        assert_eq!(line_event(Err(ReadlineError::Eof), &partial), LineEvent::Eof);
    }

    #[test]
    fn completion_covers_the_command_word_only() {
        let completer = CommandCompleter::new(["peer_list", "peer_info", "pop", "bans", "pop"]);
        assert_eq!(completer.candidates("pe"), ["peer_info", "peer_list"]);
        assert_eq!(completer.candidates("  PO"), ["pop"]);
        assert_eq!(completer.candidates("").len(), 4);
        assert!(completer.candidates("ban 10").is_empty());
    }

    #[test]
    fn status_lines_become_the_prompt() {
        let prompt = Prompt::default();
        assert_eq!(prompt.get().as_str(), DEFAULT_PROMPT);
        prompt.show("DAGD: 10/10 [10/10] >> ");
        assert_eq!(prompt.get().as_str(), "DAGD: 10/10 [10/10] >> ");
    }

    #[test]
    fn history_lives_in_the_temp_dir() {
        let path = history_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert!(path.ends_with(HISTORY_FILE));
    }
}
