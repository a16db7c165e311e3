//! Code half-life from git history.
//!
//! Starting from a baseline revision, finds the first later revision at
//! which more than half of the baseline's lines (within a path selector)
//! have been removed or changed, and estimates the same quantity from an
//! exponential-decay model.
//!
//! All history access goes through [`query::RepositoryQuery`]; the git2
//! adapter is [`git::GitHistory`] and [`memory::MemoryHistory`] is a
//! synthetic stand-in.

pub mod estimate;
pub mod git;
pub mod memory;
pub mod orchestrate;
pub mod query;
pub mod search;
pub mod sink;
pub mod snapshot;
pub mod tally;
