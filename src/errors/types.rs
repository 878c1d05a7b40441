//! Error type definitions for the cronloop scheduler

use thiserror::Error;

/// Errors raised while parsing a cron field or assembling a full spec
///
/// Every malformed atom is a hard error at construction time. A typo is
/// never downgraded to a silent non-match, since that would surface to the
/// user as a job that simply never runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CronSyntaxError {
    /// Wrong number of whitespace-separated fields in a full expression
    #[error("cron expression must have 6 fields, found {found}")]
    FieldCount { found: usize },

    /// Empty field or empty comma-separated part
    #[error("empty atom in field '{field}'")]
    Empty { field: String },

    /// Atom does not match any of the supported shapes
    #[error("unrecognized atom '{atom}' in field '{field}'")]
    UnrecognizedAtom { field: String, atom: String },

    /// A bound that should have been a number was not
    #[error("non-numeric bound '{bound}' in atom '{atom}'")]
    InvalidBound { atom: String, bound: String },

    /// Range with lower bound >= upper bound
    #[error("invalid range {start}-{end}: lower bound must be less than upper bound")]
    InvalidRange { start: u32, end: u32 },

    /// Stepped atom with a step of zero
    #[error("step must be greater than zero in atom '{atom}'")]
    ZeroStep { atom: String },
}
