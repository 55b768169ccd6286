//! Shared primitives for both report kinds: line ranges and scored code
//! fragments, plus the mapping from report paths to repository paths.

use std::fmt;

use serde::Serialize;

/// Inclusive 1-based interval of lines (or byte offsets). `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    start: u32,
    end: u32,
}

impl Range {
    /// Returns `None` when `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn line(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Lines of the range, stopping at `last`. Empty when the range starts
    /// after it.
    pub fn iter_to(&self, last: u32) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end.min(last)
    }

    /// Parse the `"<start>-<end>"` form used by inspection offsets.
    pub fn parse_offset(text: &str) -> Option<Self> {
        let mut parts = text.split('-').filter(|p| !p.is_empty());
        let start = parts.next()?.trim().parse().ok()?;
        let end = parts.next()?.trim().parse().ok()?;
        Self::new(start, end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// "This file/line range is worth `score` points of attribution weight."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredFragment {
    pub path: String,
    pub lines: Range,
    pub score: u32,
}

/// Maps file names as written by the analysis tool to paths git understands.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    prefix: String,
}

impl PathMapper {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.replace('\\', "/");
        let prefix = prefix.trim_end_matches('/');
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn map(&self, file: &str) -> String {
        let file = file.replace('\\', "/");
        let file = file.trim_start_matches("./");
        if self.prefix.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.prefix, file.trim_start_matches('/'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_rejects_inverted_bounds() {
        assert!(Range::new(5, 4).is_none());
        assert_eq!(Range::new(4, 4), Some(Range::line(4)));
    }

    #[test]
    fn range_iter_is_inclusive_and_bounded() {
        let r = Range::new(3, 5).unwrap();
        assert_eq!(r.iter_to(u32::MAX).collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(r.iter_to(4).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(r.iter_to(2).count(), 0);
        assert_eq!(Range::new(1, 4_000_000_000).unwrap().iter_to(3).count(), 3);
    }

    #[test]
    fn parse_offset_valid() {
        let r = Range::parse_offset("120-134").unwrap();
        assert_eq!((r.start(), r.end()), (120, 134));
    }

    #[test]
    fn parse_offset_invalid() {
        assert!(Range::parse_offset("").is_none());
        assert!(Range::parse_offset("12").is_none());
        assert!(Range::parse_offset("a-b").is_none());
        assert!(Range::parse_offset("20-10").is_none());
    }

    #[test]
    fn range_display() {
        assert_eq!(Range::line(7).to_string(), "7");
        assert_eq!(Range::new(7, 9).unwrap().to_string(), "7-9");
    }

    #[test]
    fn path_mapper_normalizes_separators() {
        let mapper = PathMapper::default();
        assert_eq!(mapper.map(r"Core\Services\Foo.cs"), "Core/Services/Foo.cs");
    }

    #[test]
    fn path_mapper_prepends_prefix() {
        let mapper = PathMapper::new(r"src\");
        assert_eq!(mapper.map(r"Core\Foo.cs"), "src/Core/Foo.cs");
        assert_eq!(mapper.map("./Bar.cs"), "src/Bar.cs");
    }
}
