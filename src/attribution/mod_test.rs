use super::*;
use crate::config::GitSettings;
use crate::dups::Fragment;
use crate::git::testing::{ScriptedRunner, commit_as, create_test_repo, git_available};
use crate::inspections::Severity;

const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const SHA_C: &str = "cccccccccccccccccccccccccccccccccccccccc";
const SHA_X: &str = "9999999999999999999999999999999999999999";

fn fragment(path: &str, start: u32, end: u32, score: u32) -> ScoredFragment {
    ScoredFragment {
        path: path.to_string(),
        lines: Range::new(start, end).unwrap(),
        score,
    }
}

fn owned(lines: &[String]) -> Vec<&str> {
    lines.iter().map(String::as_str).collect()
}

/// Porcelain blame where `owners[i]` is `(commit, author)` of line `i + 1`.
/// Author metadata is only printed on a commit's first appearance.
fn porcelain(owners: &[(&str, &str)]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (i, (commit, author)) in owners.iter().enumerate() {
        let line = i + 1;
        out.push(format!("{commit} {line} {line} 1"));
        if seen.insert(*commit) {
            out.push(format!("author {author}"));
            out.push(format!("author-mail <{}@test.com>", author.to_lowercase()));
            out.push("summary change".to_string());
            out.push("filename a.cs".to_string());
        }
        out.push(format!("\tline {line}"));
    }
    out
}

fn log_entry(commit: &str, author: &str) -> Vec<String> {
    vec![
        format!("commit {commit}"),
        format!("Author: {author} <{}@test.com>", author.to_lowercase()),
        "Date:   Mon, 16 Oct 2023 12:00:00 +0000".to_string(),
        String::new(),
        "    change".to_string(),
        String::new(),
    ]
}

fn names(contributors: &[Contributor]) -> Vec<&str> {
    contributors.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn new_mode_blames_each_file_once_at_head() {
    let blame_a = porcelain(&[(SHA_A, "Alice"), (SHA_A, "Alice"), (SHA_B, "Bob")]);
    let blame_b = porcelain(&[(SHA_B, "Bob"), (SHA_C, "Carol")]);
    let runner = ScriptedRunner::new()
        .respond("blame -p -- a.cs", &owned(&blame_a))
        .respond("blame -p -- b.cs", &owned(&blame_b));
    let calls = runner.calls();
    let git = Git::with_runner(runner, "develop", "origin");
    let mut session = git.session().await;

    let fragments = vec![
        fragment("a.cs", 3, 3, 1),
        fragment("b.cs", 2, 2, 10),
        fragment("a.cs", 1, 1, 10),
    ];
    let credits = new_contributors(&mut session, "head", &fragments, 5).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["checkout head", "blame -p -- a.cs", "blame -p -- b.cs"]
    );
    assert_eq!(names(&credits), vec!["Alice", "Carol", "Bob"]);
    assert_eq!(credits[0].mail, "alice@test.com");
    assert_eq!(credits[0].score(), 10);
    assert_eq!(credits[2].score(), 1);
}

#[tokio::test]
async fn fragment_counts_once_per_author() {
    let blame = porcelain(&[(SHA_A, "Alice"), (SHA_A, "Alice"), (SHA_A, "Alice")]);
    let runner = ScriptedRunner::new().respond("blame -p -- a.cs", &owned(&blame));
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let credits = new_contributors(&mut session, "h", &[fragment("a.cs", 1, 3, 7)], 5)
        .await
        .unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].contributions.len(), 1);
    assert_eq!(credits[0].score(), 7);
}

#[tokio::test]
async fn shared_fragment_credits_every_owner() {
    let blame = porcelain(&[(SHA_A, "Alice"), (SHA_B, "Bob")]);
    let runner = ScriptedRunner::new().respond("blame -p -- a.cs", &owned(&blame));
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let credits = new_contributors(&mut session, "h", &[fragment("a.cs", 1, 2, 4)], 5)
        .await
        .unwrap();
    assert_eq!(names(&credits), vec!["Alice", "Bob"]);
    assert!(credits.iter().all(|c| c.score() == 4));
}

#[tokio::test]
async fn lines_without_blame_are_skipped() {
    let blame = porcelain(&[(SHA_A, "Alice")]);
    let runner = ScriptedRunner::new()
        .respond("blame -p -- a.cs", &owned(&blame))
        .fail("blame -p -- gone.cs", &["fatal: no such path 'gone.cs' in HEAD"], 128);
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let fragments = vec![
        fragment("a.cs", 40, 41, 10),
        fragment("gone.cs", 1, 1, 10),
        fragment("a.cs", 1, 1, 1),
    ];
    let credits = new_contributors(&mut session, "h", &fragments, 5).await.unwrap();
    assert_eq!(names(&credits), vec!["Alice"]);
    assert_eq!(credits[0].score(), 1);
}

#[tokio::test]
async fn ranking_is_stable_and_truncated() {
    let blame = porcelain(&[
        (SHA_A, "Alice"),
        (SHA_B, "Bob"),
        (SHA_C, "Carol"),
        (SHA_X, "Xavier"),
    ]);
    let runner = ScriptedRunner::new().respond("blame -p -- a.cs", &owned(&blame));
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let fragments = vec![
        fragment("a.cs", 1, 1, 1),
        fragment("a.cs", 2, 2, 5),
        fragment("a.cs", 3, 3, 1),
        fragment("a.cs", 4, 4, 5),
    ];
    let credits = new_contributors(&mut session, "h", &fragments, 3).await.unwrap();

    assert_eq!(names(&credits), vec!["Bob", "Xavier", "Alice"]);
    assert!(credits.windows(2).all(|w| w[0].score() >= w[1].score()));
}

#[tokio::test]
async fn no_fragments_issue_no_commands() {
    let runner = ScriptedRunner::new();
    let calls = runner.calls();
    let git = Git::with_runner(runner, "develop", "");

    let credits = attribute_with(&git, "h", Some("b"), 5, &[], &[]).await.unwrap();
    assert!(credits.introduced.is_empty());
    assert_eq!(credits.removed.map(|r| r.len()), Some(0));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn removal_credits_the_successor_commit() {
    let mut log = log_entry(SHA_A, "Alice");
    log.extend(log_entry(SHA_B, "Bob"));
    log.extend(log_entry(SHA_C, "Carol"));
    // Line 1 last existed at A (removed by B), line 2 survives to C,
    // line 3 last existed at a commit outside the range.
    let blame = porcelain(&[(SHA_A, "Alice"), (SHA_C, "Carol"), (SHA_X, "Xavier")]);

    let runner = ScriptedRunner::new()
        .respond("log --reverse --ancestry-path base..head", &owned(&log))
        .respond("blame -p --reverse base..head -- a.cs", &owned(&blame));
    let calls = runner.calls();
    let git = Git::with_runner(runner, "develop", "origin");
    let mut session = git.session().await;

    let fragments = vec![
        fragment("a.cs", 1, 1, 10),
        fragment("a.cs", 2, 2, 1),
        fragment("a.cs", 3, 3, 10),
    ];
    let credits = removal_contributors(&mut session, "base", "head", &fragments, 5)
        .await
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "checkout develop",
            "log --reverse --ancestry-path base..head",
            "blame -p --reverse base..head -- a.cs",
        ]
    );
    assert_eq!(names(&credits), vec!["Bob", "Carol"]);
    assert_eq!(credits[0].mail, "bob@test.com");
    assert_eq!(credits[0].score(), 10);
    assert_eq!(credits[1].score(), 1);
}

#[tokio::test]
async fn removal_with_empty_range_credits_nobody() {
    let runner = ScriptedRunner::new();
    let calls = runner.calls();
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let credits = removal_contributors(&mut session, "b", "h", &[fragment("a.cs", 1, 1, 1)], 5)
        .await
        .unwrap();
    assert!(credits.is_empty());
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["checkout develop", "log --reverse --ancestry-path b..h"]
    );
}

#[test]
fn successors_map_each_commit_to_the_next() {
    let record = |commit: &str, author: &str| LogRecord {
        commit: commit.into(),
        author: author.into(),
        author_mail: String::new(),
        date: None,
    };
    let log = vec![record("a", "Alice"), record("b", "Bob"), record("c", "Carol")];
    let next = successors(&log);
    assert_eq!(next["a"].author, "Bob");
    assert_eq!(next["b"].author, "Carol");
    assert_eq!(next["c"].author, "Carol");
    assert!(successors(&[]).is_empty());
}

#[test]
fn issue_fragments_map_paths_and_scores() {
    let issue = |file: &str, line, severity| Issue {
        key: String::new(),
        type_id: "T".into(),
        file: file.into(),
        line,
        offset: Range::default(),
        project: "P".into(),
        message: "m".into(),
        severity,
    };
    let mapper = PathMapper::new("src");
    let fragments = issue_fragments(
        &[issue(r"Core\A.cs", 7, Severity::Error), issue("B.cs", 2, Severity::Warning)],
        &mapper,
    );
    assert_eq!(fragments[0], fragment("src/Core/A.cs", 7, 7, 10));
    assert_eq!(fragments[1], fragment("src/B.cs", 2, 2, 1));
}

#[test]
fn duplicate_fragments_split_cost() {
    let part = |file: &str, start, end| Fragment {
        file_name: file.into(),
        lines: Range::new(start, end).unwrap(),
        offset: Range::default(),
        text: "x".into(),
    };
    let duplicates = vec![
        Duplicate::new(31, vec![part("a.cs", 1, 5), part("b.cs", 10, 14), part("c.cs", 3, 7)]),
        Duplicate::new(12, vec![]),
    ];
    let fragments = duplicate_fragments(&duplicates, &PathMapper::default());
    assert_eq!(fragments.len(), 3);
    assert!(fragments.iter().all(|f| f.score == 10));
    assert_eq!(fragments[1], fragment("b.cs", 10, 14, 10));
}

#[test]
fn contributor_score_sums_distinct_fragments() {
    let mut c = Contributor::new("Ada", "ada@x");
    let f = fragment("a.cs", 1, 2, 3);
    c.credit(0, &f);
    c.credit(0, &f);
    c.credit(1, &fragment("a.cs", 9, 9, 10));
    assert_eq!(c.contributions.len(), 2);
    assert_eq!(c.score(), 13);
}

#[tokio::test]
async fn real_git_new_contributors() {
    if !git_available() {
        return;
    }
    let (dir, repo) = create_test_repo();
    commit_as(
        &repo,
        "Alice",
        "alice@test.com",
        &[("src/a.cs", "one\ntwo\nthree\nfour\n")],
        "alice adds",
        1_700_000_000,
    );
    let head = commit_as(
        &repo,
        "Bob",
        "bob@test.com",
        &[("src/a.cs", "one\nTWO\nthree\nFOUR\n")],
        "bob edits",
        1_700_001_000,
    );

    let settings = GitSettings {
        repository: dir.path().display().to_string(),
        remote: String::new(),
        ..GitSettings::default()
    };
    let git = Git::open(&settings);
    let mut session = git.session().await;

    let fragments = issue_fragments(
        &[
            Issue {
                key: "k1".into(),
                type_id: "T".into(),
                file: r"a.cs".into(),
                line: 2,
                offset: Range::default(),
                project: "P".into(),
                message: "m".into(),
                severity: Severity::Error,
            },
            Issue {
                key: "k2".into(),
                type_id: "T".into(),
                file: r"a.cs".into(),
                line: 3,
                offset: Range::default(),
                project: "P".into(),
                message: "n".into(),
                severity: Severity::Warning,
            },
        ],
        &PathMapper::new("src"),
    );
    let credits = new_contributors(&mut session, &head.to_string(), &fragments, 5)
        .await
        .unwrap();

    assert_eq!(names(&credits), vec!["Bob", "Alice"]);
    assert_eq!(credits[0].score(), 10);
    assert_eq!(credits[1].mail, "alice@test.com");
}

#[tokio::test]
async fn oversized_ranges_stop_at_the_last_blamed_line() {
    let blame = porcelain(&[(SHA_A, "Alice"), (SHA_B, "Bob")]);
    let log = [log_entry(SHA_A, "Alice"), log_entry(SHA_B, "Bob")].concat();
    let runner = ScriptedRunner::new()
        .respond("blame -p -- a.cs", &owned(&blame))
        .respond("log --reverse --ancestry-path b..h", &owned(&log))
        .respond("blame -p --reverse b..h -- a.cs", &owned(&blame));
    let git = Git::with_runner(runner, "develop", "");
    let mut session = git.session().await;

    let fragments = vec![
        fragment("a.cs", 2, 4_000_000_000, 6),
        fragment("a.cs", 3_000_000_000, u32::MAX, 1),
    ];

    let introduced = new_contributors(&mut session, "h", &fragments, 5).await.unwrap();
    assert_eq!(names(&introduced), vec!["Bob"]);
    assert_eq!(introduced[0].score(), 6);

    let removed = removal_contributors(&mut session, "b", "h", &fragments, 5)
        .await
        .unwrap();
    assert_eq!(names(&removed), vec!["Bob"]);
    assert_eq!(removed[0].score(), 6);
}

#[tokio::test]
async fn real_git_removal_credits_the_deleting_commit() {
    if !git_available() {
        return;
    }
    let (dir, repo) = create_test_repo();
    let base = commit_as(
        &repo,
        "Alice",
        "alice@test.com",
        &[("src/a.cs", "one\ntwo\nthree\nfour\n")],
        "alice adds",
        1_700_000_000,
    );
    commit_as(
        &repo,
        "Bob",
        "bob@test.com",
        &[("src/a.cs", "one\nthree\nfour\n")],
        "bob drops two",
        1_700_001_000,
    );
    let head = commit_as(
        &repo,
        "Carol",
        "carol@test.com",
        &[("src/a.cs", "one\nthree\n")],
        "carol drops four",
        1_700_002_000,
    );
    let trunk = repo.head().unwrap().shorthand().unwrap().to_string();

    let settings = GitSettings {
        repository: dir.path().display().to_string(),
        trunk,
        remote: String::new(),
        ..GitSettings::default()
    };
    let git = Git::open(&settings);
    let mut session = git.session().await;

    // Line numbers are those of the base revision.
    let fragments = vec![fragment("src/a.cs", 2, 2, 10), fragment("src/a.cs", 4, 4, 1)];
    let credits = removal_contributors(
        &mut session,
        &base.to_string(),
        &head.to_string(),
        &fragments,
        5,
    )
    .await
    .unwrap();

    // Bob's deletion is last seen at base, which has no successor in the range.
    assert_eq!(names(&credits), vec!["Carol"]);
    assert_eq!(credits[0].mail, "carol@test.com");
    assert_eq!(credits[0].score(), 1);
    assert_eq!(credits[0].contributions.len(), 1);
}
