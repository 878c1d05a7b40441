//! Centralized error handling for the cronloop scheduler
//!
//! Schedule syntax problems are the only errors the core models: they are
//! surfaced synchronously when a spec is constructed. Job execution
//! failures are deliberately outside the scheduler's contract and belong to
//! the dispatched task itself.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using CronSyntaxError
pub type CronResult<T> = Result<T, CronSyntaxError>;
