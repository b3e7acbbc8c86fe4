//! Console output helpers.
//!
//! Every handler writes through these so section headers, tables and hints
//! look the same across commands.

use std::fmt::Display;
use std::io::{self, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

/// Bold section header followed by a blank line.
pub fn section(out: &mut dyn Write, title: impl Display) -> io::Result<()> {
    writeln!(out, "{}", title.to_string().bold())?;
    writeln!(out)
}

/// Render rows as a table. Prints nothing for an empty set.
pub fn table<T: Tabled>(out: &mut dyn Write, rows: Vec<T>) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}", Table::new(rows))
}

/// `label: value`, label dimmed.
pub fn field(out: &mut dyn Write, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(out, "{:<28} {}", format!("{label}:").dimmed(), value)
}

/// Operator hint, e.g. how to leave the console.
pub fn hint(out: &mut dyn Write, text: impl Display) -> io::Result<()> {
    writeln!(out, "{} {}", "hint:".cyan().bold(), text)
}

pub fn success(out: &mut dyn Write, text: impl Display) -> io::Result<()> {
    writeln!(out, "{} {}", "✓".green(), text)
}

pub fn error(out: &mut dyn Write, text: impl Display) -> io::Result<()> {
    writeln!(out, "{} {}", "error:".red().bold(), text)
}

/// Percentage with two decimals.
#[must_use]
pub fn pct(value: f64) -> String {
    format!("{value:.2}%")
}

/// Red when a counter is non-zero.
#[must_use]
pub fn alert_count(value: u64) -> String {
    if value >= 1 {
        value.red().to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: &'static str,
    }

    #[test]
    fn empty_table_prints_nothing() {
        let mut buf = Vec::new();
        table::<Row>(&mut buf, Vec::new()).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn table_uses_renamed_headers() {
        let mut buf = Vec::new();
        table(&mut buf, vec![Row { name: "alpha" }]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Name"));
        assert!(text.contains("alpha"));
    }

    #[test]
    fn pct_has_two_decimals() {
        assert_eq!(pct(12.345), "12.35%");
        assert_eq!(pct(0.0), "0.00%");
    }
}
