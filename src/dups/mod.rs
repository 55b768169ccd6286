//! Duplicate-code report diffing.
//!
//! A duplicate is a set of fragments with identical code. Its identity is
//! the ordered list of `(file name, hash(text))` pairs, so a duplicate is
//! "the same" across snapshots as long as the same files hold the same text,
//! wherever it moved inside them.

mod report;

use std::error::Error;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::attribution::{self, AttributionPlan};
use crate::fingerprint;
use crate::fragment::Range;
use crate::snapshot::{Comparator, Keyed, ReportError, ReportKind};
use report::{print_json, print_report};

/// Character references the analysis tool emits that are not legal XML,
/// with their replacement.
const FORBIDDEN: &[(&str, &str)] = &[("&#x1A;", "oe")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub file_name: String,
    pub lines: Range,
    pub offset: Range,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Duplicate {
    pub key: String,
    pub cost: u32,
    pub fragments: Vec<Fragment>,
}

impl Duplicate {
    pub fn new(cost: u32, fragments: Vec<Fragment>) -> Self {
        Self {
            key: duplicate_key(&fragments),
            cost,
            fragments,
        }
    }

    /// Attribution weight of each fragment: the cost split evenly between
    /// them, rounded down.
    pub fn fragment_score(&self) -> u32 {
        match self.fragments.len() {
            0 => 0,
            n => self.cost / n as u32,
        }
    }
}

impl Keyed for Duplicate {
    fn key(&self) -> &str {
        &self.key
    }
}

/// `<file>-<hash(text)>` for each fragment, joined by `-`.
pub fn duplicate_key(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| format!("{}-{}", f.file_name, fingerprint::hash(&f.text)))
        .collect::<Vec<_>>()
        .join("-")
}

pub fn sanitize(text: &str) -> String {
    FORBIDDEN
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// The duplicate-finder report format: `Duplicate` elements with a `Cost`
/// attribute and nested `Fragment` elements.
pub struct Duplicates;

impl ReportKind for Duplicates {
    type Item = Duplicate;

    fn parse(text: &str, origin: &Path) -> Result<Vec<Duplicate>, ReportError> {
        let text = sanitize(text);
        let doc = roxmltree::Document::parse(&text).map_err(|source| ReportError::Xml {
            path: origin.to_path_buf(),
            source,
        })?;

        doc.descendants()
            .filter(|n| n.has_tag_name("Duplicate"))
            .map(|node| parse_duplicate(node, origin))
            .collect()
    }
}

fn parse_duplicate(node: roxmltree::Node<'_, '_>, origin: &Path) -> Result<Duplicate, ReportError> {
    let cost = node
        .attribute("Cost")
        .ok_or_else(|| ReportError::malformed(origin, "Duplicate without Cost"))?;
    let cost = cost
        .trim()
        .parse()
        .map_err(|_| ReportError::malformed(origin, format!("invalid Cost {cost:?}")))?;

    let fragments = node
        .descendants()
        .filter(|n| n.has_tag_name("Fragment"))
        .map(|f| parse_fragment(f, origin))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Duplicate::new(cost, fragments))
}

fn parse_fragment(node: roxmltree::Node<'_, '_>, origin: &Path) -> Result<Fragment, ReportError> {
    let child_text = |tag: &str| {
        node.children()
            .find(|n| n.has_tag_name(tag))
            .and_then(|n| n.text())
            .unwrap_or_default()
            .to_string()
    };
    let file_name = child_text("FileName");

    let lines = range_child(node, "LineRange", origin)?
        .ok_or_else(|| ReportError::malformed(origin, format!("fragment of {file_name} without LineRange")))?;
    let offset = range_child(node, "OffsetRange", origin)?.unwrap_or_default();

    Ok(Fragment {
        text: child_text("Text"),
        file_name,
        lines,
        offset,
    })
}

/// The `Start`/`End` attributes of child element `tag`, if present.
fn range_child(
    node: roxmltree::Node<'_, '_>,
    tag: &str,
    origin: &Path,
) -> Result<Option<Range>, ReportError> {
    let Some(child) = node.children().find(|n| n.has_tag_name(tag)) else {
        return Ok(None);
    };
    let bound = |name: &str| -> Result<u32, ReportError> {
        let value = child.attribute(name).unwrap_or_default();
        value
            .trim()
            .parse()
            .map_err(|_| ReportError::malformed(origin, format!("invalid {tag} {name} {value:?}")))
    };
    let (start, end) = (bound("Start")?, bound("End")?);
    Range::new(start, end)
        .map(Some)
        .ok_or_else(|| ReportError::malformed(origin, format!("{tag} {start}-{end} is inverted")))
}

/// Compare two duplicate snapshots and print the outcome, with contributor
/// attribution when requested.
pub async fn run(
    former: &Path,
    current: &Path,
    plan: &AttributionPlan,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let comparator = Comparator::<Duplicates>::new(former, current);
    let comparison = comparator.comparison()?;
    info!(
        "{} duplicates, {} introduced, {} removed",
        comparison.current.len(),
        comparison.added.len(),
        comparison.removed.len()
    );

    let mapper = plan.mapper();
    let introduced = attribution::duplicate_fragments(&comparison.added, &mapper);
    let removed = attribution::duplicate_fragments(&comparison.removed, &mapper);
    let credits = attribution::attribute(plan, &introduced, &removed).await?;

    if json {
        print_json(comparison, credits.as_ref())
    } else {
        print_report(comparison, credits.as_ref());
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
