use std::fmt;

use chrono::{DateTime, FixedOffset};

/// An opaque commit identifier, ordered only by ancestry in the history.
///
/// Adapters store the full hex id once a treeish is resolved, so two
/// `Revision`s compare equal exactly when they name the same commit.
///
/// # Examples
///
/// ```
/// use halflife_core::Revision;
///
/// let rev = Revision::from("4f2a9c1");
/// assert_eq!(rev.as_str(), "4f2a9c1");
/// assert_eq!(rev.to_string(), "4f2a9c1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wrap a commit id or treeish.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Revision {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Revision {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A file or directory scope, relative to the repository root.
///
/// A path matches when it equals the selector or lies beneath it. An empty
/// selector or `.` matches every path.
///
/// # Examples
///
/// ```
/// use halflife_core::PathSelector;
///
/// let sel = PathSelector::new("src/");
/// assert!(sel.matches("src/lib.rs"));
/// assert!(sel.matches("src"));
/// assert!(!sel.matches("srcs/lib.rs"));
/// assert!(PathSelector::new(".").matches("README.md"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSelector(String);

impl PathSelector {
    /// Normalize and wrap a selector: leading `./` and trailing `/` are dropped.
    pub fn new(selector: impl AsRef<str>) -> Self {
        let mut s = selector.as_ref().trim();
        while let Some(rest) = s.strip_prefix("./") {
            s = rest;
        }
        let s = s.trim_end_matches('/');
        if s == "." {
            return Self(String::new());
        }
        Self(s.to_string())
    }

    /// Whether this selector covers the whole tree.
    pub fn is_everything(&self) -> bool {
        self.0.is_empty()
    }

    /// The normalized selector; empty for the whole tree.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `path` lies inside this selector.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_everything() {
            return true;
        }
        match path.strip_prefix(self.0.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_everything() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// How the candidate window of a single search is scanned.
///
/// # Examples
///
/// ```
/// use halflife_core::SearchMode;
///
/// assert_eq!(SearchMode::default(), SearchMode::Linear);
/// assert_eq!(SearchMode::Logarithmic.to_string(), "logarithmic");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Evaluate candidates oldest to newest, stop at the first hit.
    #[default]
    Linear,
    /// Binary-search the window, assuming the predicate is monotonic.
    Logarithmic,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Linear => write!(f, "linear"),
            SearchMode::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

/// Which baselines a run searches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One search, from the starting revision.
    Single,
    /// One independent search from every revision in the range.
    Linear,
    /// Chained searches: each half-point found becomes the next baseline.
    Logarithmic,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Single => write!(f, "single commit"),
            RunMode::Linear => write!(f, "linear"),
            RunMode::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

/// Where a baseline's lines crossed the half-changed threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfPoint {
    /// First revision at which more than half the baseline lines changed.
    pub revision: Revision,
    /// Number of revisions after the baseline up to and including `revision`.
    pub commits_elapsed: usize,
    /// Commit date of the baseline.
    pub baseline_date: DateTime<FixedOffset>,
    /// Commit date of the half-point.
    pub half_point_date: DateTime<FixedOffset>,
}

/// Outcome of one half-life search.
///
/// `half_point` is `None` when no candidate up to the end revision reached
/// the threshold. That is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfLifeResult {
    /// The revision whose lines were tracked.
    pub baseline: Revision,
    /// The half-point, if one was reached.
    pub half_point: Option<HalfPoint>,
}

impl HalfLifeResult {
    /// A result with no half-point.
    pub fn not_found(baseline: Revision) -> Self {
        Self {
            baseline,
            half_point: None,
        }
    }

    /// The half-point revision, if any.
    pub fn half_point_revision(&self) -> Option<&Revision> {
        self.half_point.as_ref().map(|hp| &hp.revision)
    }
}

/// Format a commit date like `git show --format=%ci`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use halflife_core::format_commit_date;
///
/// let date = DateTime::parse_from_rfc3339("2014-03-01T12:30:00+01:00").unwrap();
/// assert_eq!(format_commit_date(&date), "2014-03-01 12:30:00 +0100");
/// ```
pub fn format_commit_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d %H:%M:%S %z").to_string()
}
