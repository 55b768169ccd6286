use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Terminal columns taken by `text`.
pub fn text_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Compute the max display width of a column, with a minimum of `min`.
pub fn column_width<'a>(values: impl Iterator<Item = &'a str>, min: usize) -> usize {
    values.map(text_width).max().unwrap_or(min).max(min)
}

/// Left-align `text` in a column `width` terminal cells wide.
pub fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text_width(text));
    format!("{text}{}", " ".repeat(fill))
}

/// Print a horizontal separator of box-drawing chars.
pub fn separator(width: usize) -> String {
    "\u{2500}".repeat(width)
}

/// Serialize to pretty JSON and print to stdout.
pub fn print_json_stdout(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `1 issue` / `3 issues`.
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
#[path = "report_helpers_test.rs"]
mod tests;
