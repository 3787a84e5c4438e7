//! Terminal capability detection and utilities

use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Color as error (red)
    fn error(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        paint(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self, |s| s.fg::<css::LightBlue>().to_string())
    }

    fn error(&self) -> String {
        paint(self, |s| s.fg::<css::Red>().to_string())
    }

    fn dim(&self) -> String {
        paint(self, |s| s.dimmed().to_string())
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn info(&self) -> String {
        self.as_str().info()
    }

    fn error(&self) -> String {
        self.as_str().error()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

fn paint(s: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(s)
    } else {
        s.to_string()
    }
}
