use serde::Serialize;

use super::threshold::ThresholdCheck;
use super::{Issue, Severity};
use crate::attribution::Attribution;
use crate::attribution::report::{JsonAttribution, json_attribution, print_attribution};
use crate::report_helpers::{column_width, pad, plural, print_json_stdout, separator};
use crate::snapshot::Comparison;

fn count_errors(issues: &[Issue]) -> usize {
    issues.iter().filter(|i| i.severity == Severity::Error).count()
}

fn print_issues(title: &str, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }

    let file_w = column_width(issues.iter().map(|i| i.file.as_str()), 4);
    let separator = separator((file_w + 60).max(68));

    println!();
    println!(" {title}");
    println!("{separator}");
    println!(" {}  {:>6}  {:<8} Message", pad("File", file_w), "Line", "Severity");
    println!("{separator}");
    for issue in issues {
        let severity = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        };
        println!(
            " {}  {:>6}  {:<8} {}",
            pad(&issue.file, file_w),
            issue.line,
            severity,
            issue.message
        );
    }
    println!("{separator}");
}

pub fn print_report(
    comparison: &Comparison<Issue>,
    check: &ThresholdCheck,
    credits: Option<&Attribution>,
) {
    let separator = separator(68);
    let added_errors = count_errors(&comparison.added);

    println!("{separator}");
    println!(" Inspection Report");
    println!();
    println!(" Total issues:         {:>42}", comparison.current.len());
    println!(" Errors:               {:>42}", check.error_count);
    println!(" Introduced:           {:>42}", comparison.added.len());
    if added_errors > 0 {
        println!("   of which errors:    {:>42}", added_errors);
    }
    println!(" Removed:              {:>42}", comparison.removed.len());
    println!("{separator}");

    if comparison.added.is_empty() && comparison.removed.is_empty() {
        println!(" No change was found during the inspection.");
    }

    print_issues("Introduced issues", &comparison.added);
    print_issues("Removed issues", &comparison.removed);

    if !check.failing.is_empty() {
        println!();
        println!(
            " {} above threshold:",
            plural(check.failing.len(), "project")
        );
        for state in &check.failing {
            println!("   {} ({})", state.project, plural(state.count, "issue"));
        }
    }

    if let Some(credits) = credits {
        print_attribution(credits);
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    total: usize,
    errors: usize,
    added: &'a [Issue],
    removed: &'a [Issue],
    thresholds: &'a ThresholdCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution: Option<JsonAttribution<'a>>,
}

pub fn print_json(
    comparison: &Comparison<Issue>,
    check: &ThresholdCheck,
    credits: Option<&Attribution>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json_stdout(&JsonReport {
        total: comparison.current.len(),
        errors: check.error_count,
        added: &comparison.added,
        removed: &comparison.removed,
        thresholds: check,
        attribution: credits.map(json_attribution),
    })
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
