use serde::Serialize;

use super::{Attribution, Contributor};
use crate::report_helpers::{column_width, pad, plural, separator};

pub fn print_contributors(title: &str, contributors: &[Contributor]) {
    println!();
    if contributors.is_empty() {
        println!(" {title}: nobody to credit.");
        return;
    }

    let name_w = column_width(contributors.iter().map(|c| c.name.as_str()), 6);
    let mail_w = column_width(contributors.iter().map(|c| c.mail.as_str()), 4);
    // rank(4) + name + 2 + mail + 2 + fragments(9) + 1 + score(7)
    let separator = separator((name_w + mail_w + 26).max(50));

    println!(" {title}");
    println!("{separator}");
    println!(
        " {:>3} {}  {}  {:>9} {:>7}",
        "#",
        pad("Author", name_w),
        pad("Mail", mail_w),
        "Fragments",
        "Score"
    );
    println!("{separator}");
    for (i, c) in contributors.iter().enumerate() {
        println!(
            " {:>3} {}  {}  {:>9} {:>7}",
            i + 1,
            pad(&c.name, name_w),
            pad(&c.mail, mail_w),
            c.contributions.len(),
            c.score()
        );
    }
    println!("{separator}");
}

pub fn print_attribution(credits: &Attribution) {
    print_contributors("Introduced by", &credits.introduced);
    if let Some(removed) = &credits.removed {
        print_contributors("Removed by", removed);
    }
}

/// One-line digest, e.g. `Alice (12), Bob (3)`.
pub fn summarize(contributors: &[Contributor]) -> String {
    if contributors.is_empty() {
        return "nobody".to_string();
    }
    contributors
        .iter()
        .map(|c| format!("{} ({})", c.name, plural(c.contributions.len(), "fragment")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
pub struct JsonContributor<'a> {
    name: &'a str,
    mail: &'a str,
    score: u32,
    fragments: usize,
}

#[derive(Serialize)]
pub struct JsonAttribution<'a> {
    introduced: Vec<JsonContributor<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<Vec<JsonContributor<'a>>>,
}

fn json_contributors(contributors: &[Contributor]) -> Vec<JsonContributor<'_>> {
    contributors
        .iter()
        .map(|c| JsonContributor {
            name: &c.name,
            mail: &c.mail,
            score: c.score(),
            fragments: c.contributions.len(),
        })
        .collect()
}

pub fn json_attribution(credits: &Attribution) -> JsonAttribution<'_> {
    JsonAttribution {
        introduced: json_contributors(&credits.introduced),
        removed: credits.removed.as_deref().map(json_contributors),
    }
}
