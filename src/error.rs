//! Error taxonomy for argument and configuration faults.
//!
//! Absent entries are not errors (`remove`/`contains` of an unknown value
//! return `false`), and queries on an empty set return an empty result
//! view. Snapshot I/O uses [`std::io::Error`] directly; see
//! [`crate::snapshot`].

use thiserror::Error;

/// An invalid argument surfaced to the caller. Never produced by queries
/// on a healthy set.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A configuration setter was handed a value outside its legal range.
    #[error("invalid {param}: {reason}")]
    InvalidConfig {
        /// The offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// `k` for a k-nearest-neighbour query must be at least 1.
    #[error("k must be at least 1")]
    InvalidK,
}
