use colored::Colorize;
use declarative::{Diagnostics, Severity};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print diagnostics, errors to stderr
pub fn diagnostics(subject: &str, diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        match d.severity {
            Severity::Error => {
                error(&format!("{subject}: {}", d.summary));
                if !d.detail.is_empty() {
                    eprintln!("  {}", d.detail.dimmed());
                }
            }
            Severity::Warning => {
                warn(&format!("{subject}: {}", d.summary));
                if !d.detail.is_empty() {
                    dim(&d.detail);
                }
            }
        }
    }
}
