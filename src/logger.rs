use std::collections::VecDeque;
use std::io::{self, IsTerminal, Write};

use crossterm::style::{style, Color, Stylize};

pub const MAX_LOGS: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Clone, Debug)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

/// Console logger with a bounded history of everything it was handed.
pub struct Logger {
    lines: VecDeque<LogLine>,
    echo: bool,
    quiet: bool,
    color: bool,
}

impl Logger {
    pub fn new(quiet: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            echo: true,
            quiet,
            color: io::stdout().is_terminal(),
        }
    }

    /// Records without printing.
    pub fn silent() -> Self {
        Self {
            lines: VecDeque::new(),
            echo: false,
            quiet: true,
            color: false,
        }
    }

    /// Quiet mode drops `Info` and `Success` from the console, never from history.
    pub fn log(&mut self, level: LogLevel, msg: impl Into<String>) {
        let shown = !self.quiet || matches!(level, LogLevel::Warn | LogLevel::Error);
        self.push(level, msg.into(), shown);
    }

    /// Always printed, quiet or not.
    pub fn announce(&mut self, level: LogLevel, msg: impl Into<String>) {
        self.push(level, msg.into(), true);
    }

    pub fn history(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// Warnings and errors, oldest first.
    pub fn problems(&self) -> Vec<String> {
        self.history()
            .filter(|l| matches!(l.level, LogLevel::Warn | LogLevel::Error))
            .map(|l| l.text.clone())
            .collect()
    }

    fn push(&mut self, level: LogLevel, text: String, shown: bool) {
        if self.echo && shown {
            self.print(level, &text);
        }

        if self.lines.len() >= MAX_LOGS {
            self.lines.pop_front();
        }

        self.lines.push_back(LogLine { level, text });
    }

    fn print(&self, level: LogLevel, text: &str) {
        let mut out = io::stdout().lock();

        let color = match level {
            LogLevel::Info => None,
            LogLevel::Success => Some(Color::Green),
            LogLevel::Warn => Some(Color::Yellow),
            LogLevel::Error => Some(Color::Red),
        };

        // child processes share this stdout, so flush before they run
        let _ = match color {
            Some(c) if self.color => writeln!(out, "{}", style(text).with(c).bold()),
            _ => writeln!(out, "{}", text),
        };
        let _ = out.flush();
    }
}
