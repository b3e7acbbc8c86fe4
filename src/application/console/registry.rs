//! Name to handler lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::command::CommandHandler;
use super::commands;

/// Table of console commands keyed by name and alias.
#[derive(Default)]
pub struct CommandRegistry {
    handlers: Vec<Arc<dyn CommandHandler>>,
    index: HashMap<&'static str, usize>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in command, `help` included.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for handler in commands::all() {
            registry.register(handler);
        }
        let help = commands::lifecycle::Help::new(registry.help_text());
        registry.register(Arc::new(help));
        registry
    }

    /// Add a handler. A later registration under the same name wins.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> &mut Self {
        let slot = self.handlers.len();
        for name in std::iter::once(handler.name()).chain(handler.aliases().iter().copied()) {
            if self.index.insert(name, slot).is_some() {
                warn!(command = name, "Duplicate command registration, replacing");
            }
        }
        self.handlers.push(handler);
        self
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.index.get(name).map(|&slot| &self.handlers[slot])
    }

    /// Registered handlers in registration order.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn CommandHandler>> {
        self.handlers.iter()
    }

    /// Every name and alias, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.index.keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// One line per command: usage, aliases and summary.
    #[must_use]
    pub fn help_text(&self) -> String {
        let mut text = String::from("Commands:\n");
        for handler in &self.handlers {
            let aliases = handler.aliases();
            let summary = if aliases.is_empty() {
                handler.summary().to_string()
            } else {
                format!("{} (also: {})", handler.summary(), aliases.join(", "))
            };
            text.push_str(&format!("  {:<42} {summary}\n", handler.usage()));
        }
        text.push_str(&format!("  {:<42} Show this list\n", "help"));
        text
    }
}
