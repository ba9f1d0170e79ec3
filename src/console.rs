//! The host console, untouched by interception.
//!
//! Delivery failures are reported here directly so they can never re-enter a source queue.

use crate::domain::Level;
use std::io::{self, Write};

pub trait ConsoleSink: Send + Sync {
    fn write(&self, level: Level, text: &str);

    fn error(&self, text: &str) {
        self.write(Level::Error, text);
    }
}

/// Writes `warn`/`error` to stderr and everything else to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsole;

impl ConsoleSink for StdConsole {
    fn write(&self, level: Level, text: &str) {
        // Broken pipes must not take the process down with them.
        let _ = match level {
            Level::Warn | Level::Error => writeln!(io::stderr().lock(), "[{level}] {text}"),
            _ => writeln!(io::stdout().lock(), "[{level}] {text}"),
        };
    }
}

/// Discards everything. Useful when the host has no console.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl ConsoleSink for NullConsole {
    fn write(&self, _level: Level, _text: &str) {}
}
