//! Contributor attribution: maps scored fragments to the authors who
//! introduced or removed them, using blame output as ground truth.
//!
//! Two modes share the same bookkeeping. "New" mode blames each file at the
//! head commit and credits the author of every fragment line. "Removal" mode
//! reverse-blames each file over `base..head` and credits the author of the
//! commit that came right after the one that last had the line, i.e. the
//! commit that removed it.
//!
//! Each contributor holds a set of fragment identities, so a fragment counts
//! once per author however many of its lines that author owns. Rankings are
//! stable sorts by descending score, truncated to the requested size.

pub mod report;

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::GitSettings;
use crate::dups::Duplicate;
use crate::fragment::{PathMapper, Range, ScoredFragment};
use crate::git::blame::BlameRecord;
use crate::git::log::LogRecord;
use crate::git::{Git, GitError, GitSession};
use crate::inspections::Issue;

#[derive(Debug, Clone, Serialize)]
pub struct Contributor {
    pub name: String,
    pub mail: String,
    pub contributions: Vec<ScoredFragment>,
    #[serde(skip)]
    credited: HashSet<usize>,
}

impl Contributor {
    fn new(name: &str, mail: &str) -> Self {
        Self {
            name: name.to_string(),
            mail: mail.to_string(),
            contributions: Vec::new(),
            credited: HashSet::new(),
        }
    }

    /// Add fragment `id` unless it was already credited to this contributor.
    fn credit(&mut self, id: usize, fragment: &ScoredFragment) {
        if self.credited.insert(id) {
            self.contributions.push(fragment.clone());
        }
    }

    pub fn score(&self) -> u32 {
        self.contributions.iter().map(|f| f.score).sum()
    }
}

/// Contributors keyed by author name, kept in first-credited order.
#[derive(Default)]
struct Tally {
    contributors: Vec<Contributor>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn credit(&mut self, author: &str, mail: &str, id: usize, fragment: &ScoredFragment) {
        let slot = match self.index.get(author) {
            Some(&slot) => slot,
            None => {
                self.index.insert(author.to_string(), self.contributors.len());
                self.contributors.push(Contributor::new(author, mail));
                self.contributors.len() - 1
            }
        };
        self.contributors[slot].credit(id, fragment);
    }

    fn ranked(self, top: usize) -> Vec<Contributor> {
        rank(self.contributors, top)
    }
}

/// Stable sort by descending score, then keep the first `top`.
pub fn rank(mut contributors: Vec<Contributor>, top: usize) -> Vec<Contributor> {
    contributors.sort_by(|a, b| b.score().cmp(&a.score()));
    contributors.truncate(top);
    contributors
}

/// Fragment indices grouped by file in first-appearance order, each group
/// ordered by starting line.
fn group_by_file(fragments: &[ScoredFragment]) -> Vec<(&str, Vec<usize>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (id, fragment) in fragments.iter().enumerate() {
        match slots.get(fragment.path.as_str()) {
            Some(&slot) => groups[slot].1.push(id),
            None => {
                slots.insert(fragment.path.as_str(), groups.len());
                groups.push((fragment.path.as_str(), vec![id]));
            }
        }
    }
    for (_, ids) in &mut groups {
        ids.sort_by_key(|&id| fragments[id].lines.start());
    }
    groups
}

/// First blame record for each line number of the blamed revision, and the
/// highest line number blamed.
fn by_new_line(records: &[BlameRecord]) -> (HashMap<u32, &BlameRecord>, u32) {
    let mut lines = HashMap::with_capacity(records.len());
    let mut last: u32 = 0;
    for record in records {
        lines.entry(record.new_line).or_insert(record);
        last = last.max(record.new_line);
    }
    (lines, last)
}

/// Each commit of an oldest-first log mapped to the commit after it; the
/// last commit maps to itself.
pub fn successors(log: &[LogRecord]) -> HashMap<&str, &LogRecord> {
    let mut next: HashMap<&str, &LogRecord> = log
        .windows(2)
        .map(|pair| (pair[0].commit.as_str(), &pair[1]))
        .collect();
    if let Some(last) = log.last() {
        next.insert(last.commit.as_str(), last);
    }
    next
}

/// Who introduced `fragments`, as of `head`.
pub async fn new_contributors(
    session: &mut GitSession<'_>,
    head: &str,
    fragments: &[ScoredFragment],
    top: usize,
) -> Result<Vec<Contributor>, GitError> {
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    session.checkout(head).await?;

    let mut tally = Tally::default();
    for (path, ids) in group_by_file(fragments) {
        info!("analyzing contributions on file {path}");
        let blame = session.blame(path).await?.into_value();
        let (lines, last) = by_new_line(&blame);

        for id in ids {
            let fragment = &fragments[id];
            for line in fragment.lines.iter_to(last) {
                if let Some(record) = lines.get(&line) {
                    tally.credit(&record.author, &record.author_mail, id, fragment);
                }
            }
        }
    }

    Ok(tally.ranked(top))
}

/// Who removed `fragments` between `base` and `head`.
pub async fn removal_contributors(
    session: &mut GitSession<'_>,
    base: &str,
    head: &str,
    fragments: &[ScoredFragment],
    top: usize,
) -> Result<Vec<Contributor>, GitError> {
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    session.checkout_trunk().await?;

    let log = session.reverse_log(None, base, head).await?.into_value();
    let next = successors(&log);
    if next.is_empty() {
        info!("no commits between {base} and {head}, nobody to credit");
        return Ok(Vec::new());
    }

    let mut tally = Tally::default();
    for (path, ids) in group_by_file(fragments) {
        info!("analyzing removals on file {path}");
        let blame = session.blame_reverse(path, base, head).await?.into_value();
        let (lines, last) = by_new_line(&blame);

        for id in ids {
            let fragment = &fragments[id];
            for line in fragment.lines.iter_to(last) {
                let Some(record) = lines.get(&line) else {
                    continue;
                };
                let Some(successor) = next.get(record.commit.as_str()) else {
                    debug!("{path}:{line} last seen in {} outside the range", record.commit);
                    continue;
                };
                tally.credit(&successor.author, &successor.author_mail, id, fragment);
            }
        }
    }

    Ok(tally.ranked(top))
}

/// One fragment per issue covering its line, weighted by severity.
pub fn issue_fragments(issues: &[Issue], mapper: &PathMapper) -> Vec<ScoredFragment> {
    issues
        .iter()
        .map(|issue| ScoredFragment {
            path: mapper.map(&issue.file),
            lines: Range::line(issue.line),
            score: issue.severity.score(),
        })
        .collect()
}

/// One fragment per duplicated block; the duplicate's cost is split evenly
/// (integer division) between its fragments.
pub fn duplicate_fragments(duplicates: &[Duplicate], mapper: &PathMapper) -> Vec<ScoredFragment> {
    duplicates
        .iter()
        .flat_map(|duplicate| {
            let score = duplicate.fragment_score();
            duplicate.fragments.iter().map(move |fragment| ScoredFragment {
                path: mapper.map(&fragment.file_name),
                lines: fragment.lines,
                score,
            })
        })
        .collect()
}

/// Where and how to attribute a report change.
#[derive(Debug, Clone, Default)]
pub struct AttributionPlan {
    pub git: GitSettings,
    /// Commit the former snapshot was taken at; enables removal credits.
    pub base: Option<String>,
    /// Commit the current snapshot was taken at; enables attribution.
    pub head: Option<String>,
    pub top: usize,
    pub path_prefix: String,
}

impl AttributionPlan {
    pub fn mapper(&self) -> PathMapper {
        PathMapper::new(&self.path_prefix)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub introduced: Vec<Contributor>,
    /// `None` when no base commit was given.
    pub removed: Option<Vec<Contributor>>,
}

/// Run both attribution modes as the plan allows. Without a head commit
/// nothing is attributed.
pub async fn attribute(
    plan: &AttributionPlan,
    introduced: &[ScoredFragment],
    removed: &[ScoredFragment],
) -> Result<Option<Attribution>, GitError> {
    let Some(head) = plan.head.as_deref() else {
        return Ok(None);
    };
    let git = Git::open(&plan.git);
    let credits = attribute_with(&git, head, plan.base.as_deref(), plan.top, introduced, removed).await?;
    Ok(Some(credits))
}

/// Both attribution passes in one working-tree session.
pub async fn attribute_with(
    git: &Git,
    head: &str,
    base: Option<&str>,
    top: usize,
    introduced: &[ScoredFragment],
    removed: &[ScoredFragment],
) -> Result<Attribution, GitError> {
    let mut session = git.session().await;

    let new = new_contributors(&mut session, head, introduced, top).await?;
    info!("introduced by {}", report::summarize(&new));

    let removal = match base {
        Some(base) => {
            let credits = removal_contributors(&mut session, base, head, removed, top).await?;
            info!("removed by {}", report::summarize(&credits));
            Some(credits)
        }
        None => None,
    };

    Ok(Attribution {
        introduced: new,
        removed: removal,
    })
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
