//! Console doubles: captured output and scripted input.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::console::{LineEvent, LineSource};

/// Clonable writer whose bytes can be read back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replays a fixed list of events, then blocks like an idle terminal.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    events: VecDeque<LineEvent>,
}

impl ScriptedLines {
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: lines.into_iter().map(|l| LineEvent::Line(l.into())).collect(),
        }
    }

    #[must_use]
    pub fn then(mut self, event: LineEvent) -> Self {
        self.events.push_back(event);
        self
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> LineEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

/// Strip ANSI colour sequences.
#[must_use]
pub fn plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strips_colour_codes() {
        assert_eq!(plain("\x1b[32mok\x1b[39m done"), "ok done");
        assert_eq!(plain("no codes"), "no codes");
    }

    #[test]
    fn buffer_clones_share_bytes() {
        let buffer = SharedBuffer::new();
        let mut writer = buffer.clone();
        write!(writer, "hello").unwrap();
        assert_eq!(buffer.contents(), "hello");
        buffer.clear();
        assert!(buffer.contents().is_empty());
    }
}
