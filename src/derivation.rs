//! Branch derivation check: how long ago a branch last merged the trunk.
//!
//! The merge base of `<remote>/<branch>` and `<remote>/<trunk>` is the last
//! trunk commit the branch contains. A branch is up to date when that
//! commit is no older than `max_days` days.

use std::error::Error;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::GitSettings;
use crate::git::{Git, GitError, GitSession};
use crate::report_helpers::{column_width, pad, print_json_stdout, separator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    UpToDate,
    Derived,
    /// The ancestor or its date could not be resolved.
    Unknown,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::UpToDate => "up to date",
            Status::Derived => "DERIVED",
            Status::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub branch: String,
    pub ancestor: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub age_days: Option<i64>,
    pub status: Status,
}

/// Whole days between `date` and `now`, and whether `date` is within
/// `max_days` of `now`.
pub fn evaluate(date: DateTime<FixedOffset>, now: DateTime<Utc>, max_days: i64) -> (i64, Status) {
    let age = now.signed_duration_since(date);
    let status = if date >= now - Duration::days(max_days) {
        Status::UpToDate
    } else {
        Status::Derived
    };
    (age.num_days(), status)
}

/// Resolve the derivation of `branch` from the trunk.
pub async fn check_branch(
    session: &mut GitSession<'_>,
    branch: &str,
    now: DateTime<Utc>,
    max_days: i64,
) -> Result<Derivation, GitError> {
    let mut outcome = Derivation {
        branch: branch.to_string(),
        ancestor: None,
        date: None,
        age_days: None,
        status: Status::Unknown,
    };

    let Some(ancestor) = session.common_ancestor_with_trunk(branch).await?.into_value() else {
        warn!("could not retrieve the common ancestor of {branch}");
        return Ok(outcome);
    };
    info!("common ancestor of {branch} is {ancestor}");

    let date = session.commit_date(&ancestor).await?.into_value();
    outcome.ancestor = Some(ancestor);
    let Some(date) = date else {
        warn!("could not retrieve the date of the common ancestor of {branch}");
        return Ok(outcome);
    };

    let (age, status) = evaluate(date, now, max_days);
    match status {
        Status::Derived => info!("{branch} derived from {} for {age} days", session.trunk()),
        _ => info!("{branch} is up to date"),
    }
    outcome.date = Some(date);
    outcome.age_days = Some(age);
    outcome.status = status;
    Ok(outcome)
}

/// Check every branch in one session, after an optional `fetch --prune`.
pub async fn check_branches(
    git: &Git,
    branches: &[String],
    fetch: bool,
    now: DateTime<Utc>,
    max_days: i64,
) -> Result<Vec<Derivation>, GitError> {
    let mut session = git.session().await;
    if fetch {
        info!("fetching remote branches");
        session.fetch_prune().await?;
    }

    let mut results = Vec::with_capacity(branches.len());
    for branch in branches {
        results.push(check_branch(&mut session, branch, now, max_days).await?);
    }
    Ok(results)
}

pub fn print_report(results: &[Derivation], trunk: &str, max_days: i64) {
    if results.is_empty() {
        println!("No branches to check.");
        return;
    }

    let branch_w = column_width(results.iter().map(|d| d.branch.as_str()), 6);
    let separator = separator((branch_w + 48).max(60));

    println!("Derivation from {trunk} (limit {max_days} days)");
    println!("{separator}");
    println!(" {}  {:<10} {:<10} {:>5}  Status", pad("Branch", branch_w), "Ancestor", "Date", "Days");
    println!("{separator}");
    for d in results {
        let ancestor = d.ancestor.as_deref().map_or("-", |c| c.get(..10).unwrap_or(c));
        let date = d
            .date
            .map_or_else(|| "-".to_string(), |date| date.format("%Y-%m-%d").to_string());
        let days = d.age_days.map_or_else(|| "-".to_string(), |a| a.to_string());
        println!(
            " {}  {:<10} {:<10} {:>5}  {}",
            pad(&d.branch, branch_w),
            ancestor,
            date,
            days,
            d.status.label()
        );
    }
    println!("{separator}");
}

pub async fn run(
    settings: &GitSettings,
    branches: &[String],
    max_days: i64,
    fetch: bool,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let git = Git::open(settings);
    let results = check_branches(&git, branches, fetch, Utc::now(), max_days).await?;

    if json {
        print_json_stdout(&results)
    } else {
        print_report(&results, git.trunk(), max_days);
        Ok(())
    }
}

#[cfg(test)]
#[path = "derivation_test.rs"]
mod tests;
