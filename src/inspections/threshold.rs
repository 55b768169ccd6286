//! Per-project issue thresholds read from a `Project;InspectionsThreshold`
//! CSV file.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Issue, Severity};
use crate::snapshot::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectThreshold {
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "InspectionsThreshold")]
    pub threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectState {
    pub project: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThresholdCheck {
    /// Issues of severity ERROR in the snapshot.
    pub error_count: usize,
    /// Issue count per project, in first-seen order.
    pub projects: Vec<ProjectState>,
    /// Projects above their configured threshold, in file order.
    pub failing: Vec<ProjectState>,
}

pub fn parse_thresholds(
    reader: impl Read,
    origin: &Path,
) -> Result<Vec<ProjectThreshold>, ReportError> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv.deserialize()
        .map(|record| {
            record.map_err(|source| ReportError::Csv {
                path: origin.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// Count issues per project in encounter order.
pub fn project_counts(issues: &[Issue]) -> Vec<ProjectState> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut states: Vec<ProjectState> = Vec::new();
    for issue in issues {
        match index.get(issue.project.as_str()) {
            Some(&i) => states[i].count += 1,
            None => {
                index.insert(issue.project.as_str(), states.len());
                states.push(ProjectState {
                    project: issue.project.clone(),
                    count: 1,
                });
            }
        }
    }
    states
}

/// Count errors and find the projects whose issue count exceeds their
/// threshold. Without a threshold file no project fails.
pub fn enforce(issues: &[Issue], thresholds: Option<&Path>) -> Result<ThresholdCheck, ReportError> {
    let error_count = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let projects = project_counts(issues);

    let Some(path) = thresholds.filter(|p| p.exists()) else {
        info!("no threshold file, skipping the check by project");
        return Ok(ThresholdCheck {
            error_count,
            projects,
            failing: Vec::new(),
        });
    };

    let file = std::fs::File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let limits = parse_thresholds(file, path)?;

    let failing = check(&projects, &limits);

    for limit in &limits {
        info!("threshold {}: {}", limit.project, limit.threshold);
    }
    for state in &projects {
        info!("issues in {}: {}", state.project, state.count);
    }
    for state in &failing {
        warn!("{} is above its threshold with {} issues", state.project, state.count);
    }

    Ok(ThresholdCheck {
        error_count,
        projects,
        failing,
    })
}

/// Projects with a threshold whose count is strictly greater than it.
/// Projects without issues never fail.
pub fn check(projects: &[ProjectState], limits: &[ProjectThreshold]) -> Vec<ProjectState> {
    limits
        .iter()
        .filter_map(|limit| {
            projects
                .iter()
                .find(|p| p.project == limit.project)
                .filter(|p| p.count > limit.threshold)
                .cloned()
        })
        .collect()
}

#[cfg(test)]
#[path = "threshold_test.rs"]
mod tests;
