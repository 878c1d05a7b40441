//! cronloop - a cron-style job scheduler
//!
//! Computes next occurrences for six-field cron specifications (second
//! resolution) and drives registered jobs from a single event-driven
//! worker loop: sleep until the nearest run time, fire everything due,
//! react to add/update/remove requests without busy-waiting.

pub mod config;
pub mod errors;
pub mod scheduling;
