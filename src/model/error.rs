//! Error types for the waterfall engine and its binary.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via
//! `?` and `From` conversions.
//!
//! # Error Hierarchy
//!
//! - [`ConfigurationError`] - invalid layout or engine settings, rejected when the
//!   configuration is built, never per item
//! - [`EngineError`] - operations the engine refuses (disposed engine, duplicate id)
//! - [`SourceError`] - reading a host event script from a file or stdin
//! - [`ParseError`] - a malformed line in a host event script
//! - [`PullError`] - pulling items from a stream (source or engine failure)
//! - [`AppError`] - top-level wrapper used by the binary
//!
//! # What is NOT an error
//!
//! A measurement or removal for an item the engine no longer knows about is an
//! expected race (the item was removed before it painted). Those calls return an
//! outcome value describing the no-op and log at `debug`. A failed "load more"
//! request belongs to the data source; the engine only re-arms its trigger.
//!
//! Internal invariant violations (a negative measured height, a column whose
//! tops are out of order) are programming defects and panic.

use crate::config::loader::ConfigError;
use crate::logging::LoggingError;
use crate::model::identifiers::ItemId;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid layout or engine configuration.
///
/// Returned synchronously by [`LayoutConfig::new`](crate::layout::layout_config::LayoutConfig::new)
/// and [`EngineSettings::validate`](crate::config::EngineSettings::validate).
/// Values are never silently clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The grid needs at least one column and at most
    /// [`MAX_COLUMNS`](crate::layout::layout_config::MAX_COLUMNS).
    #[error("column count must be between 1 and {max} (got {0})", max = crate::layout::layout_config::MAX_COLUMNS)]
    InvalidColumnCount(i64),

    /// Gap between stacked items may not be negative.
    #[error("gap must be >= 0 (got {0})")]
    NegativeGap(i64),

    /// A declared column width must be a positive pixel count.
    #[error("column width must be > 0 when set (got {0})")]
    InvalidColumnWidth(i64),
}

/// Operations the engine refuses to perform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine was disposed; its caches must not be read or written again.
    ///
    /// **Recovery**: drop the engine. Late host callbacks after unmount can
    /// safely ignore this error.
    #[error("engine has been disposed")]
    Disposed,

    /// An item with this id is already placed.
    ///
    /// **Recovery**: the data source produced a duplicate; skip the item or
    /// remove the existing one first.
    #[error("item {0} is already present")]
    DuplicateItem(ItemId),

    /// A resize carried an invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Errors encountered when reading a host event script.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The script file does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use waterfall::model::error::SourceError;
    ///
    /// let err = SourceError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.jsonl")
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.jsonl"));
    /// ```
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// No script file was given and stdin is an interactive terminal.
    ///
    /// **Recovery**: show usage (`waterfall script.jsonl` or
    /// `cat script.jsonl | waterfall`) and exit non-zero.
    #[error("No input source: provide a script path or pipe data to stdin")]
    NoInput,

    /// Any other I/O failure while reading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A malformed line in a host event script.
///
/// Non-fatal: the replay logs the error, counts it, and continues with the
/// next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line is not valid JSON, or does not match any known event shape.
    #[error("Invalid event on line {line}: {message}")]
    InvalidEvent {
        /// 1-based line number.
        line: usize,
        /// Parser error message.
        message: String,
    },
}

impl ParseError {
    /// Line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            ParseError::InvalidEvent { line, .. } => *line,
        }
    }
}

/// Failure while pulling items from an [`ItemStream`](crate::source::ItemStream).
#[derive(Debug, Error)]
pub enum PullError {
    /// The stream itself failed. Items pulled before the failure stay placed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The engine refused an item (duplicate id, or disposed).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Top-level error for the `waterfall` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to read the event script.
    #[error("Failed to read input: {0}")]
    Source(#[from] SourceError),

    /// Failed to load the configuration file.
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    /// Configured values are invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Failed to set up logging.
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    /// The engine refused a script event.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Failed to serialize the report.
    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}
