//! Inspection report diffing.
//!
//! Loads two inspection snapshots, reports which issues were introduced and
//! which were fixed, optionally checks per-project thresholds and credits
//! the contributors responsible for both sides of the change.

mod report;
pub mod threshold;

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::attribution::{self, AttributionPlan};
use crate::fingerprint;
use crate::fragment::Range;
use crate::snapshot::{Comparator, Keyed, ReportError, ReportKind};
use report::{print_json, print_report};
use threshold::ThresholdCheck;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Only `ERROR` is an error; every other level counts as a warning.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("ERROR") {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    /// Attribution weight of one issue of this severity.
    pub fn score(self) -> u32 {
        match self {
            Severity::Error => 10,
            Severity::Warning => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub key: String,
    pub type_id: String,
    pub file: String,
    pub line: u32,
    pub offset: Range,
    pub project: String,
    pub message: String,
    pub severity: Severity,
}

impl Keyed for Issue {
    fn key(&self) -> &str {
        &self.key
    }
}

/// The inspection report format: `IssueType` declarations followed by
/// `Project` elements holding `Issue` elements.
pub struct Inspections;

impl ReportKind for Inspections {
    type Item = Issue;

    fn parse(text: &str, origin: &Path) -> Result<Vec<Issue>, ReportError> {
        let doc = roxmltree::Document::parse(text).map_err(|source| ReportError::Xml {
            path: origin.to_path_buf(),
            source,
        })?;

        let severities: HashMap<&str, Severity> = doc
            .descendants()
            .filter(|n| n.has_tag_name("IssueType"))
            .filter_map(|n| {
                let id = n.attribute("Id")?;
                Some((id, Severity::parse(n.attribute("Severity").unwrap_or_default())))
            })
            .collect();

        let mut issues = Vec::new();
        for project in doc.descendants().filter(|n| n.has_tag_name("Project")) {
            let project_name = project.attribute("Name").unwrap_or_default();
            for node in project.descendants().filter(|n| n.has_tag_name("Issue")) {
                issues.push(parse_issue(node, project_name, &severities, origin)?);
            }
        }

        assign_keys(&mut issues);
        Ok(issues)
    }
}

fn parse_issue(
    node: roxmltree::Node<'_, '_>,
    project: &str,
    severities: &HashMap<&str, Severity>,
    origin: &Path,
) -> Result<Issue, ReportError> {
    let type_id = node.attribute("TypeId").unwrap_or_default();
    let file = node.attribute("File").unwrap_or_default();

    let line = match node.attribute("Line") {
        Some(value) => value.trim().parse().map_err(|_| {
            ReportError::malformed(origin, format!("invalid Line {value:?} in {file}"))
        })?,
        None => 0,
    };

    let offset = match node.attribute("Offset") {
        Some(value) => Range::parse_offset(value).ok_or_else(|| {
            ReportError::malformed(origin, format!("invalid Offset {value:?} in {file}"))
        })?,
        None => Range::default(),
    };

    Ok(Issue {
        key: String::new(),
        type_id: type_id.to_string(),
        file: file.to_string(),
        line,
        offset,
        project: project.to_string(),
        message: node.attribute("Message").unwrap_or_default().to_string(),
        severity: severities.get(type_id).copied().unwrap_or(Severity::Warning),
    })
}

/// Key every issue as `<file>-<hash(message)>`, appending `#` until the key
/// is unique within the snapshot. The n-th issue with a given file and
/// message therefore gets the same key in every snapshot.
pub fn assign_keys(issues: &mut [Issue]) {
    let mut taken: HashSet<String> = HashSet::with_capacity(issues.len());
    for issue in issues.iter_mut() {
        let mut key = format!("{}-{}", issue.file, fingerprint::hash(&issue.message));
        while taken.contains(&key) {
            key.push('#');
        }
        taken.insert(key.clone());
        issue.key = key;
    }
}

/// Compare two inspection snapshots and print the outcome, together with
/// the threshold check and contributor attribution when requested.
pub async fn run(
    former: &Path,
    current: &Path,
    thresholds: Option<&Path>,
    plan: &AttributionPlan,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let comparator = Comparator::<Inspections>::new(former, current);
    let comparison = comparator.comparison()?;
    info!(
        "{} issues, {} introduced, {} removed",
        comparison.current.len(),
        comparison.added.len(),
        comparison.removed.len()
    );

    let check: ThresholdCheck = threshold::enforce(&comparison.current, thresholds)?;

    let introduced = attribution::issue_fragments(&comparison.added, &plan.mapper());
    let fixed = attribution::issue_fragments(&comparison.removed, &plan.mapper());
    let credits = attribution::attribute(plan, &introduced, &fixed).await?;

    if json {
        print_json(comparison, &check, credits.as_ref())
    } else {
        print_report(comparison, &check, credits.as_ref());
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
