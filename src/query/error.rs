//! Query error types
//!
//! Defines the error conditions that can occur while compiling metric-path
//! patterns and executing per-target controller queries.

use thiserror::Error;

use crate::controller::ControllerError;

/// Errors raised while compiling a metric-path pattern
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A regex-like segment is not a valid regular expression
    #[error("Invalid pattern segment {index} '{segment}': {reason}")]
    InvalidSegment {
        index: usize,
        segment: String,
        reason: String,
    },

    /// A regex-like segment exceeds the configured complexity bound
    #[error("Pattern segment {index} is too long ({len} > {max} characters)")]
    SegmentTooLong { index: usize, len: usize, max: usize },

    /// The pattern has no content
    #[error("Metric path pattern is empty")]
    Empty,
}

/// Errors that can occur while executing a query target
#[derive(Error, Debug)]
pub enum QueryError {
    /// Metric path pattern could not be compiled
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Controller call failed
    #[error("Transport error: {0}")]
    Transport(#[from] ControllerError),

    /// Invalid time range specified
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Target is missing required fields
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
