use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HalfLifeError;
use crate::log::Verbosity;
use crate::types::SearchMode;

/// Top-level configuration loaded from `.halflife.toml`.
///
/// Supports layered resolution: CLI flags > config file > defaults. The
/// binary applies CLI overrides on top of the parsed value.
///
/// # Examples
///
/// ```
/// use halflife_core::HalfLifeConfig;
///
/// let config = HalfLifeConfig::default();
/// assert!(!config.search.fast);
/// assert_eq!(config.report.verbosity, 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HalfLifeConfig {
    /// Candidate scan settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging and result-file settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Which repository to read history from.
    #[serde(default)]
    pub repository: RepositoryConfig,
}

impl HalfLifeConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::FileNotFound`] if the file does not exist,
    /// [`HalfLifeError::Io`] if it cannot be read, [`HalfLifeError::Toml`] if
    /// the content is not valid TOML, or [`HalfLifeError::Config`] if a value
    /// is out of range.
    pub fn from_file(path: &Path) -> Result<Self, HalfLifeError> {
        if !path.exists() {
            return Err(HalfLifeError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::Toml`] if parsing fails, or
    /// [`HalfLifeError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use halflife_core::HalfLifeConfig;
    ///
    /// let toml = r#"
    /// [search]
    /// fast = true
    /// "#;
    /// let config = HalfLifeConfig::from_toml(toml).unwrap();
    /// assert!(config.search.fast);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, HalfLifeError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::Config`] when `report.verbosity` exceeds 2.
    pub fn validate(&self) -> Result<(), HalfLifeError> {
        self.report.verbosity()?;
        Ok(())
    }
}

/// Candidate scan configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Binary-search the candidate window instead of scanning it (default: false).
    #[serde(default)]
    pub fast: bool,
}

impl SearchConfig {
    /// The candidate scan this configuration selects.
    pub fn mode(&self) -> SearchMode {
        if self.fast {
            SearchMode::Logarithmic
        } else {
            SearchMode::Linear
        }
    }
}

/// Logging and result-file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Log verbosity, 0 to 2 (default: 0).
    #[serde(default)]
    pub verbosity: u8,
    /// CSV file receiving one row per half-point found.
    pub output: Option<PathBuf>,
}

impl ReportConfig {
    /// The validated verbosity level.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::Config`] for levels above 2.
    pub fn verbosity(&self) -> Result<Verbosity, HalfLifeError> {
        Verbosity::new(self.verbosity)
    }
}

/// Repository location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Path inside the repository to analyze (default: `.`).
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
}

fn default_repository_path() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = HalfLifeConfig::default();
        assert!(!config.search.fast);
        assert_eq!(config.search.mode(), SearchMode::Linear);
        assert_eq!(config.report.verbosity, 0);
        assert!(config.report.output.is_none());
        assert_eq!(config.repository.path, PathBuf::from("."));
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[search]
fast = true

[report]
verbosity = 2
output = "halflife.csv"

[repository]
path = "../service"
"#;
        let config = HalfLifeConfig::from_toml(toml).unwrap();
        assert_eq!(config.search.mode(), SearchMode::Logarithmic);
        assert_eq!(config.report.verbosity().unwrap(), Verbosity::TRACE);
        assert_eq!(config.report.output, Some(PathBuf::from("halflife.csv")));
        assert_eq!(config.repository.path, PathBuf::from("../service"));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = HalfLifeConfig::from_toml("").unwrap();
        assert!(!config.search.fast);
        assert_eq!(config.repository.path, PathBuf::from("."));
    }

    #[test]
    fn out_of_range_verbosity_is_rejected() {
        let err = HalfLifeConfig::from_toml("[report]\nverbosity = 5\n").unwrap_err();
        assert!(matches!(err, HalfLifeError::Config(_)));
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = HalfLifeConfig::from_toml("{{invalid}}");
        assert!(matches!(result, Err(HalfLifeError::Toml(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = HalfLifeConfig::from_file(Path::new("/nonexistent/.halflife.toml")).unwrap_err();
        assert!(matches!(err, HalfLifeError::FileNotFound(_)));
    }
}
