use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::LineParser;

const AUTHOR: &str = "author ";
const AUTHOR_MAIL: &str = "author-mail ";

/// `<sha> <old-line> <new-line> [count]`; content lines start with a tab and never match.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-f0-9]{40}) ([0-9]+) ([0-9]+)(.*)$").expect("blame header pattern")
});

/// Authorship of one line of a blamed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlameRecord {
    pub commit: String,
    pub author: String,
    pub author_mail: String,
    pub old_line: u32,
    pub new_line: u32,
}

/// Accumulates `git blame -p` output (normal or `--reverse`) one line at a
/// time.
///
/// Porcelain output prints `author`/`author-mail` only the first time a
/// commit appears. A header for a commit already described takes that
/// commit's author; any other header carries the last seen values forward
/// until an `author`/`author-mail` line overwrites them. Metadata lines that
/// follow a header also update the record that header opened.
#[derive(Debug, Default)]
pub struct BlameParser {
    outputs: Vec<BlameRecord>,
    author: String,
    author_mail: String,
    known: HashMap<String, (String, String)>,
}

impl BlameParser {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn outputs(&self) -> &[BlameRecord] {
        &self.outputs
    }
}

impl LineParser for BlameParser {
    type Output = Vec<BlameRecord>;

    fn read_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        if let Some(name) = line.strip_prefix(AUTHOR) {
            self.author = name.trim().to_string();
            if let Some(current) = self.outputs.last_mut() {
                current.author = self.author.clone();
                self.known.insert(
                    current.commit.clone(),
                    (current.author.clone(), current.author_mail.clone()),
                );
            }
            return;
        }

        if let Some(mail) = line.strip_prefix(AUTHOR_MAIL) {
            self.author_mail = mail.trim().trim_matches(['<', '>']).to_string();
            if let Some(current) = self.outputs.last_mut() {
                current.author_mail = self.author_mail.clone();
                self.known.insert(
                    current.commit.clone(),
                    (current.author.clone(), current.author_mail.clone()),
                );
            }
            return;
        }

        let Some(caps) = HEADER.captures(line) else {
            return;
        };
        let (Ok(old_line), Ok(new_line)) = (caps[2].parse(), caps[3].parse()) else {
            return;
        };

        let commit = caps[1].to_string();
        let (author, author_mail) = match self.known.get(&commit) {
            Some((author, mail)) => (author.clone(), mail.clone()),
            None => (self.author.clone(), self.author_mail.clone()),
        };
        self.outputs.push(BlameRecord {
            commit,
            author,
            author_mail,
            old_line,
            new_line,
        });
    }

    fn finish(self) -> Vec<BlameRecord> {
        self.outputs
    }
}

#[cfg(test)]
#[path = "blame_test.rs"]
mod tests;
