use serde::Serialize;

use super::Duplicate;
use crate::attribution::Attribution;
use crate::attribution::report::{JsonAttribution, json_attribution, print_attribution};
use crate::report_helpers::{plural, print_json_stdout, separator};
use crate::snapshot::Comparison;

/// Sum of costs, the weight of a set of duplicates.
fn total_cost(duplicates: &[Duplicate]) -> u64 {
    duplicates.iter().map(|d| u64::from(d.cost)).sum()
}

fn print_duplicates(title: &str, duplicates: &[Duplicate]) {
    if duplicates.is_empty() {
        return;
    }
    let separator = separator(68);

    println!();
    println!(" {title}");
    for (i, duplicate) in duplicates.iter().enumerate() {
        println!("{separator}");
        println!(
            " [{}] cost {}, {}",
            i + 1,
            duplicate.cost,
            plural(duplicate.fragments.len(), "fragment")
        );
        for fragment in &duplicate.fragments {
            println!("   {}:{}", fragment.file_name, fragment.lines);
        }
    }
    println!("{separator}");
}

pub fn print_report(comparison: &Comparison<Duplicate>, credits: Option<&Attribution>) {
    let separator = separator(68);

    println!("{separator}");
    println!(" Duplicate Report");
    println!();
    println!(" Total duplicates:     {:>42}", comparison.current.len());
    println!(" Total cost:           {:>42}", total_cost(&comparison.current));
    println!(" Introduced:           {:>42}", comparison.added.len());
    println!(" Removed:              {:>42}", comparison.removed.len());
    println!("{separator}");

    if comparison.added.is_empty() && comparison.removed.is_empty() {
        println!(" No change in duplicated code.");
    }

    print_duplicates("Introduced duplicates", &comparison.added);
    print_duplicates("Removed duplicates", &comparison.removed);

    if let Some(credits) = credits {
        print_attribution(credits);
    }
}

#[derive(Serialize)]
struct JsonFragment<'a> {
    file: &'a str,
    start_line: u32,
    end_line: u32,
}

#[derive(Serialize)]
struct JsonDuplicate<'a> {
    key: &'a str,
    cost: u32,
    fragments: Vec<JsonFragment<'a>>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    total: usize,
    total_cost: u64,
    added: Vec<JsonDuplicate<'a>>,
    removed: Vec<JsonDuplicate<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution: Option<JsonAttribution<'a>>,
}

fn json_duplicates(duplicates: &[Duplicate]) -> Vec<JsonDuplicate<'_>> {
    duplicates
        .iter()
        .map(|d| JsonDuplicate {
            key: &d.key,
            cost: d.cost,
            fragments: d
                .fragments
                .iter()
                .map(|f| JsonFragment {
                    file: &f.file_name,
                    start_line: f.lines.start(),
                    end_line: f.lines.end(),
                })
                .collect(),
        })
        .collect()
}

pub fn print_json(
    comparison: &Comparison<Duplicate>,
    credits: Option<&Attribution>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json_stdout(&JsonReport {
        total: comparison.current.len(),
        total_cost: total_cost(&comparison.current),
        added: json_duplicates(&comparison.added),
        removed: json_duplicates(&comparison.removed),
        attribution: credits.map(json_attribution),
    })
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
