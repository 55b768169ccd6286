//! Snapshot diffing shared by both report kinds.
//!
//! A report is loaded into items carrying a derived identity key; two
//! snapshots are compared by pure set difference over that key space. Moved
//! or edited items are therefore seen as one removal plus one addition.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("malformed report {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("current snapshot {} does not exist", .0.display())]
    MissingSnapshot(PathBuf),

    #[error("invalid threshold file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError {
    let path = path.to_path_buf();
    move |source| ReportError::Io { path, source }
}

impl ReportError {
    pub fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// An item with an identity key stable across snapshots.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// A report format that can be parsed into keyed items.
pub trait ReportKind {
    type Item: Keyed + Clone;

    /// Parse report `text`; `origin` is only used in error messages.
    fn parse(text: &str, origin: &Path) -> Result<Vec<Self::Item>, ReportError>;

    fn load(path: &Path) -> Result<Vec<Self::Item>, ReportError> {
        let text = std::fs::read_to_string(path).map_err(io_error(path))?;
        Self::parse(&text, path)
    }
}

/// Result of comparing a former snapshot with the current one.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    pub current: Vec<T>,
}

/// Keep the first item for each key, preserving order.
fn dedup_by_key<T: Keyed>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.key().to_string()) {
            result.push(item);
        } else {
            debug!("duplicate key {} ignored", item.key());
        }
    }
    result
}

/// Set difference of two snapshots by key. `added` and `removed` keep the
/// encounter order of the snapshot they come from.
pub fn compare<T: Keyed + Clone>(former: Vec<T>, current: Vec<T>) -> Comparison<T> {
    let former = dedup_by_key(former);
    let current = dedup_by_key(current);

    let former_keys: HashSet<&str> = former.iter().map(Keyed::key).collect();
    let current_keys: HashSet<&str> = current.iter().map(Keyed::key).collect();

    let added: Vec<T> = current
        .iter()
        .filter(|item| !former_keys.contains(item.key()))
        .cloned()
        .collect();
    let removed: Vec<T> = former
        .iter()
        .filter(|item| !current_keys.contains(item.key()))
        .cloned()
        .collect();

    Comparison {
        added,
        removed,
        current,
    }
}

/// Compares two snapshot files of one report kind. The comparison is
/// computed on first request and cached for the lifetime of the comparator.
pub struct Comparator<R: ReportKind> {
    former: PathBuf,
    current: PathBuf,
    cache: OnceLock<Comparison<R::Item>>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: ReportKind> Comparator<R> {
    pub fn new(former: &Path, current: &Path) -> Self {
        Self {
            former: former.to_path_buf(),
            current: current.to_path_buf(),
            cache: OnceLock::new(),
            _kind: PhantomData,
        }
    }

    /// A missing former snapshot is an empty baseline (first run); a missing
    /// current snapshot is an error.
    pub fn comparison(&self) -> Result<&Comparison<R::Item>, ReportError> {
        if let Some(cached) = self.cache.get() {
            return Ok(cached);
        }

        let former = if self.former.exists() {
            R::load(&self.former)?
        } else {
            info!(
                "no former snapshot at {}, using an empty baseline",
                self.former.display()
            );
            Vec::new()
        };

        if !self.current.exists() {
            return Err(ReportError::MissingSnapshot(self.current.clone()));
        }
        let current = R::load(&self.current)?;

        Ok(self.cache.get_or_init(|| compare(former, current)))
    }
}

/// Make `current` the new former snapshot. An existing former snapshot is
/// first archived into `archive_dir` as `<stem>-<yyyy_mm_dd of the day
/// before today>.<ext>`. Returns the archive path, if any.
pub fn promote(
    former: &Path,
    current: &Path,
    archive_dir: Option<&Path>,
    today: NaiveDate,
) -> Result<Option<PathBuf>, ReportError> {
    if !current.exists() {
        return Err(ReportError::MissingSnapshot(current.to_path_buf()));
    }

    let mut archived = None;
    if let Some(dir) = archive_dir
        && former.exists()
    {
        let stem = former
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("snapshot");
        let ext = former.extension().and_then(|s| s.to_str()).unwrap_or("xml");
        let day = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let target = dir.join(format!("{stem}-{}.{ext}", day.format("%Y_%m_%d")));

        std::fs::create_dir_all(dir).map_err(io_error(dir))?;
        std::fs::copy(former, &target).map_err(io_error(&target))?;
        info!("archived {} to {}", former.display(), target.display());
        archived = Some(target);
    }

    if let Some(parent) = former.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    std::fs::copy(current, former).map_err(io_error(former))?;
    info!("{} is the new baseline", former.display());

    Ok(archived)
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
