use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::Serialize;

use super::LineParser;

const COMMIT: &str = "commit ";
const DATE: &str = "Date:";

static AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Author: (.*) <(.*)>").expect("log author pattern"));

/// Metadata of one commit in a `git log` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub commit: String,
    pub author: String,
    pub author_mail: String,
    pub date: Option<DateTime<FixedOffset>>,
}

/// Parse a commit date as printed by git, either `--date=rfc` or the default
/// `Mon Oct 16 12:00:00 2023 +0200` form.
pub fn parse_git_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_str(text, "%a %b %e %H:%M:%S %Y %z"))
        .ok()
}

/// Accumulates `git log` output one line at a time.
///
/// A `commit` line opens a record seeded with the author, mail and date seen
/// so far; the `Author:`/`Date:` lines printed after it then overwrite both
/// the carried values and the open record. Records are stored as soon as
/// their commit line is read, so the last commit needs no separate flush.
#[derive(Debug, Default)]
pub struct LogParser {
    outputs: Vec<LogRecord>,
    author: String,
    author_mail: String,
    date: Option<DateTime<FixedOffset>>,
}

impl LogParser {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn outputs(&self) -> &[LogRecord] {
        &self.outputs
    }
}

impl LineParser for LogParser {
    type Output = Vec<LogRecord>;

    fn read_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        if let Some(caps) = AUTHOR.captures(line) {
            self.author = caps[1].to_string();
            self.author_mail = caps[2].to_string();
            if let Some(current) = self.outputs.last_mut() {
                current.author = self.author.clone();
                current.author_mail = self.author_mail.clone();
            }
            return;
        }

        if let Some(rest) = line.strip_prefix(DATE) {
            // Unparsable dates keep the previous value.
            if let Some(date) = parse_git_date(rest) {
                self.date = Some(date);
                if let Some(current) = self.outputs.last_mut() {
                    current.date = Some(date);
                }
            }
            return;
        }

        if let Some(rest) = line.strip_prefix(COMMIT) {
            let Some(commit) = rest.split_whitespace().next() else {
                return;
            };
            self.outputs.push(LogRecord {
                commit: commit.to_string(),
                author: self.author.clone(),
                author_mail: self.author_mail.clone(),
                date: self.date,
            });
        }
    }

    fn finish(self) -> Vec<LogRecord> {
        self.outputs
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;
