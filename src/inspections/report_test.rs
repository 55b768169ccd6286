use super::*;
use crate::fragment::Range;
use crate::inspections::threshold::ProjectState;

fn issue(file: &str, message: &str, severity: Severity) -> Issue {
    Issue {
        key: format!("{file}-{message}"),
        type_id: "T".into(),
        file: file.into(),
        line: 12,
        offset: Range::new(100, 120).unwrap(),
        project: "Core".into(),
        message: message.into(),
        severity,
    }
}

fn sample() -> Comparison<Issue> {
    let added = vec![issue(r"Core\Foo.cs", "Possible null", Severity::Error)];
    let removed = vec![issue("Web/Bar.cs", "Unused using", Severity::Warning)];
    Comparison {
        current: added.clone(),
        added,
        removed,
    }
}

fn check() -> ThresholdCheck {
    ThresholdCheck {
        error_count: 1,
        projects: vec![ProjectState { project: "Core".into(), count: 1 }],
        failing: vec![ProjectState { project: "Core".into(), count: 1 }],
    }
}

#[test]
fn count_errors_counts_only_errors() {
    assert_eq!(count_errors(&sample().added), 1);
    assert_eq!(count_errors(&sample().removed), 0);
}

#[test]
fn print_report_does_not_panic() {
    print_report(&sample(), &check(), None);
}

#[test]
fn print_report_without_changes() {
    let empty = Comparison {
        added: vec![],
        removed: vec![],
        current: vec![],
    };
    print_report(&empty, &ThresholdCheck::default(), None);
}

#[test]
fn print_json_does_not_panic() {
    print_json(&sample(), &check(), None).unwrap();
}

#[test]
fn json_report_shape() {
    let comparison = sample();
    let check = check();
    let report = JsonReport {
        total: comparison.current.len(),
        errors: check.error_count,
        added: &comparison.added,
        removed: &comparison.removed,
        thresholds: &check,
        attribution: None,
    };
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["added"][0]["severity"], "ERROR");
    assert_eq!(value["added"][0]["offset"]["start"], 100);
    assert_eq!(value["thresholds"]["failing"][0]["project"], "Core");
    assert!(value.get("attribution").is_none());
}
