use std::path::PathBuf;

/// Errors that can occur while measuring code half-life.
///
/// Library crates return this type directly; the binary crate reports it
/// through `miette` at the boundary. History query failures are always
/// fatal for the current run and are never folded into "no half-point".
///
/// # Examples
///
/// ```
/// use halflife_core::HalfLifeError;
///
/// let err = HalfLifeError::Config("verbosity must be 0, 1 or 2".into());
/// assert!(err.to_string().contains("verbosity"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum HalfLifeError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(halflife::config))]
    Config(String),

    /// A history query failed (bad path, corrupt object, unreadable tree).
    #[error("git error: {0}")]
    #[diagnostic(code(halflife::git))]
    Git(String),

    /// A revision could not be resolved to a commit.
    #[error("revision not found: {revision}")]
    #[diagnostic(
        code(halflife::revision),
        help("pass a commit hash, branch, tag or other treeish that exists in the repository")
    )]
    RevisionNotFound {
        /// The treeish as supplied by the caller.
        revision: String,
    },

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
