//! User-facing console lines. These are printed regardless of the log level.

use crossterm::style::Stylize;
use humansize::{format_size, DECIMAL};

/// Width of the horizontal rules around previews and summaries
pub const RULE_WIDTH: usize = 80;

pub fn info(msg: &str) {
    println!("{} {}", "[INFO]".cyan(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "[✓]".green(), msg);
}

pub fn failure(msg: &str) {
    println!("{} {}", "[✗]".red(), msg);
}

pub fn stats(msg: &str) {
    println!("{} {}", "[STATS]".cyan(), msg);
}

pub fn rule() {
    println!("{}", "─".repeat(RULE_WIDTH));
}

pub fn human_size(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Size for display, `?` when the stat failed
pub fn optional_size(bytes: Option<u64>) -> String {
    bytes.map(human_size).unwrap_or_else(|| "?".to_string())
}
