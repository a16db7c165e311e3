//! Core types, configuration, logging, and error handling for halflife.
//!
//! This crate provides the shared foundation used by the history crate and
//! the binary:
//! - [`HalfLifeError`]: unified error type using `thiserror` and `miette`
//! - [`HalfLifeConfig`]: configuration loaded from `.halflife.toml`
//! - [`Logger`]: verbosity-gated logging injected into every component
//! - Shared types: [`Revision`], [`PathSelector`], [`SearchMode`],
//!   [`RunMode`], [`HalfLifeResult`], [`HalfPoint`]

mod config;
mod error;
pub mod log;
mod types;

pub use config::{HalfLifeConfig, ReportConfig, RepositoryConfig, SearchConfig};
pub use error::HalfLifeError;
pub use log::{LogSink, Logger, MemorySink, TracingSink, Verbosity};
pub use types::{
    format_commit_date, HalfLifeResult, HalfPoint, PathSelector, Revision, RunMode, SearchMode,
};

/// A convenience `Result` type for halflife operations.
pub type Result<T> = std::result::Result<T, HalfLifeError>;
