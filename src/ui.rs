//! Operator-facing status lines.
//!
//! These lines are the product surface, not a log: diagnostics go through
//! `tracing` to stderr, while this module prints the handful of colored
//! one-liners an operator actually reads. Color is dropped automatically
//! when the stream is not a terminal.

use crossterm::tty::IsTty;

const BOLD_CYAN: &str = "\u{1b}[1;36m";
const CYAN: &str = "\u{1b}[36m";
const GREEN: &str = "\u{1b}[32m";
const YELLOW: &str = "\u{1b}[33m";
const RED: &str = "\u{1b}[31m";
const RESET: &str = "\u{1b}[0m";

/// Prints the bold banner line a session opens with.
pub fn title(text: &str) {
    println!("{}", render(text, "", BOLD_CYAN, stdout_colors()));
}

/// Prints a neutral progress line.
pub fn info(text: &str) {
    println!("{}", render(text, "◆", CYAN, stdout_colors()));
}

/// Prints a success line.
pub fn success(text: &str) {
    println!("{}", render(text, "✔", GREEN, stdout_colors()));
}

/// Prints a warning line. Warnings never stop the session.
pub fn warn(text: &str) {
    println!("{}", render(text, "▲", YELLOW, stdout_colors()));
}

/// Prints a fatal error line to stderr.
pub fn error(text: &str) {
    eprintln!("{}", render(text, "✖", RED, stderr_colors()));
}

fn stdout_colors() -> bool {
    std::io::stdout().is_tty()
}

fn stderr_colors() -> bool {
    std::io::stderr().is_tty()
}

fn render(text: &str, symbol: &str, color: &str, colored: bool) -> String {
    match (symbol.is_empty(), colored) {
        (true, true) => format!("{}{}{}", color, text, RESET),
        (true, false) => text.to_string(),
        (false, true) => format!("{}{}{} {}", color, symbol, RESET, text),
        (false, false) => format!("{} {}", symbol, text),
    }
}
