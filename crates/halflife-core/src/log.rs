//! Verbosity-gated logging capability.
//!
//! Components never print. They receive a [`Logger`] (a numeric level plus a
//! shared [`LogSink`]) and emit messages through it, which keeps them testable
//! without capturing process output. The binary wires a [`TracingSink`];
//! tests use a [`MemorySink`] or [`Logger::silent`].

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::HalfLifeError;

/// How much detail a run reports.
///
/// - `0`: per-baseline outcomes only
/// - `1`: run parameters, baseline totals, per-candidate ratios
/// - `2`: per-query tracing (window sizes, binary-search probes)
///
/// # Examples
///
/// ```
/// use halflife_core::Verbosity;
///
/// let v = Verbosity::new(1).unwrap();
/// assert!(v >= Verbosity::DETAIL);
/// assert!(Verbosity::new(3).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Verbosity(u8);

impl Verbosity {
    /// Outcomes: half-points found or not found.
    pub const OUTCOME: Self = Self(0);
    /// Parameters and per-candidate progress.
    pub const DETAIL: Self = Self(1);
    /// Individual history queries and search probes.
    pub const TRACE: Self = Self(2);

    /// Build a verbosity level, rejecting anything above 2.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::Config`] for levels outside `0..=2`.
    pub fn new(level: u8) -> Result<Self, HalfLifeError> {
        if level > Self::TRACE.0 {
            return Err(HalfLifeError::Config(format!(
                "verbosity must be 0, 1 or 2, got {level}"
            )));
        }
        Ok(Self(level))
    }

    /// The numeric level.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Destination for log messages that passed the verbosity gate.
pub trait LogSink: Send + Sync {
    /// Record one message emitted at `level`.
    fn write(&self, level: Verbosity, message: &str);

    /// Record a warning. Warnings bypass the verbosity gate.
    fn warn(&self, message: &str) {
        self.write(Verbosity::OUTCOME, message);
    }
}

/// Forwards messages to `tracing`: level 0 as INFO, 1 as DEBUG, 2 as TRACE.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: Verbosity, message: &str) {
        match level.get() {
            0 => tracing::info!("{message}"),
            1 => tracing::debug!("{message}"),
            _ => tracing::trace!("{message}"),
        }
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Keeps every message in memory, in emission order.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use halflife_core::{Logger, MemorySink, Verbosity};
///
/// let sink = Arc::new(MemorySink::default());
/// let logger = Logger::new(Verbosity::OUTCOME, sink.clone());
/// logger.outcome(format_args!("kept"));
/// logger.detail(format_args!("dropped"));
/// assert_eq!(sink.messages(), vec!["kept".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Verbosity, String)>>,
}

impl MemorySink {
    /// All recorded messages with their levels.
    pub fn entries(&self) -> Vec<(Verbosity, String)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// All recorded message texts.
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, m)| m).collect()
    }
}

impl LogSink for MemorySink {
    fn write(&self, level: Verbosity, message: &str) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push((level, message.to_string()));
    }
}

/// A verbosity level bound to a sink. Cheap to clone.
#[derive(Clone)]
pub struct Logger {
    level: Verbosity,
    sink: Option<Arc<dyn LogSink>>,
}

impl Logger {
    /// Log to `sink`, keeping messages at or below `level`.
    pub fn new(level: Verbosity, sink: Arc<dyn LogSink>) -> Self {
        Self {
            level,
            sink: Some(sink),
        }
    }

    /// A logger that discards everything, warnings included.
    pub fn silent() -> Self {
        Self {
            level: Verbosity::OUTCOME,
            sink: None,
        }
    }

    /// Whether a message at `level` would reach the sink.
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.sink.is_some() && self.level >= level
    }

    /// Emit `args` at `level`. Formatting is skipped when gated out.
    pub fn log(&self, level: Verbosity, args: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            if self.level >= level {
                sink.write(level, &args.to_string());
            }
        }
    }

    /// Emit at [`Verbosity::OUTCOME`].
    pub fn outcome(&self, args: fmt::Arguments<'_>) {
        self.log(Verbosity::OUTCOME, args);
    }

    /// Emit at [`Verbosity::DETAIL`].
    pub fn detail(&self, args: fmt::Arguments<'_>) {
        self.log(Verbosity::DETAIL, args);
    }

    /// Emit at [`Verbosity::TRACE`].
    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Verbosity::TRACE, args);
    }

    /// Emit a warning regardless of level.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            sink.warn(&args.to_string());
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_rejects_out_of_range() {
        assert_eq!(Verbosity::new(0).unwrap(), Verbosity::OUTCOME);
        assert_eq!(Verbosity::new(2).unwrap(), Verbosity::TRACE);
        let err = Verbosity::new(7).unwrap_err();
        assert!(err.to_string().contains("got 7"));
    }

    #[test]
    fn logger_gates_by_level() {
        let sink = Arc::new(MemorySink::default());
        let logger = Logger::new(Verbosity::DETAIL, sink.clone());

        logger.outcome(format_args!("outcome"));
        logger.detail(format_args!("detail {}", 1));
        logger.trace(format_args!("trace"));

        let entries = sink.entries();
        assert_eq!(
            entries,
            vec![
                (Verbosity::OUTCOME, "outcome".to_string()),
                (Verbosity::DETAIL, "detail 1".to_string()),
            ]
        );
    }

    #[test]
    fn warnings_bypass_level() {
        let sink = Arc::new(MemorySink::default());
        let logger = Logger::new(Verbosity::OUTCOME, sink.clone());
        logger.trace(format_args!("hidden"));
        logger.warn(format_args!("sink unwritable"));
        assert_eq!(sink.messages(), vec!["sink unwritable".to_string()]);
    }

    #[test]
    fn silent_logger_is_never_enabled() {
        let logger = Logger::silent();
        assert!(!logger.enabled(Verbosity::OUTCOME));
        logger.warn(format_args!("nowhere"));
    }
}
