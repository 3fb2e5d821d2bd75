//! Shared CLI output: colors, status lines, JSON mode.

use std::io::IsTerminal;

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Color output unless `NO_COLOR` is set or stderr is not a terminal.
pub fn color_enabled() -> bool {
    std::env::var("NO_COLOR").is_err() && std::io::stderr().is_terminal()
}

/// Colored string builder.
pub struct Styled {
    use_color: bool,
}

impl Styled {
    pub fn new() -> Self {
        Self {
            use_color: color_enabled(),
        }
    }

    pub fn ok_sym(&self) -> &str {
        if self.use_color {
            "\x1b[32m\u{2713}\x1b[0m"
        } else {
            "OK"
        }
    }

    pub fn warn_sym(&self) -> &str {
        if self.use_color {
            "\x1b[33m\u{26a0}\x1b[0m"
        } else {
            "??"
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    pub fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    pub fn yellow(&self, s: &str) -> String {
        self.paint(YELLOW, s)
    }

    pub fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }
}

/// A `label  value` line under a status symbol.
pub fn print_check(symbol: &str, label: &str, value: &str) {
    eprintln!("  {symbol} {label:<16} {value}");
}

/// Format elapsed milliseconds (e.g. "850ms", "2m 14s").
pub fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    if secs == 0 {
        format!("{ms}ms")
    } else if secs < 60 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn is_quiet() -> bool {
    std::env::var("GRADCAFE_QUIET").is_ok()
}

pub fn is_json() -> bool {
    std::env::var("GRADCAFE_JSON").is_ok()
}

/// Pretty JSON on stdout.
pub fn print_json(value: &serde_json::Value) {
    if let Ok(s) = serde_json::to_string_pretty(value) {
        println!("{s}");
    }
}
