use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::MESH, text.style(theme().header));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn));
}

/// `label: value` status line, value highlighted
pub fn info(label: &str, value: &str) {
    let theme = theme();
    println!(
        "{} {}: {}",
        Icons::INFO,
        label.style(theme.label),
        value.style(theme.accent)
    );
}
