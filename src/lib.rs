//! # nearset
//!
//! Embeddable in-memory approximate nearest-neighbour set over an arbitrary
//! value type, parameterized by a user-supplied distance function.
//!
//! The core is a bounded-degree navigable small-world (NSW) proximity graph
//! with diversified edge selection (α-RNG pruning), a gated best-first
//! search with a refinement pass, and a removal procedure that heals the
//! graph around the detached node. Insertions, removals, and queries
//! interleave freely; the set stays queryable at any point during a build.
//!
//! The crate is fully synchronous and does no I/O of its own, so it embeds
//! directly into applications or language bindings. The set is
//! single-threaded by design: callers sharing it across threads must
//! serialize externally.
//!
//! ```
//! use nearset::NearSet;
//!
//! let mut set = NearSet::new(|a: &i64, b: &i64| (a - b).abs() as f64);
//! set.add(10);
//! set.add(25);
//! set.add(31);
//!
//! let found = set.find_k_neighbors(&27, 2).unwrap();
//! assert_eq!(found.closest(), Some(&25));
//! ```

/// Crate-wide tuning constants and parameter defaults.
pub mod config;
/// The pluggable distance-function seam.
pub mod distance;
/// Argument and configuration error taxonomy.
pub mod error;
/// The NSW proximity graph: container, search, insertion, pruning, removal.
pub mod nsw;
/// Version-stamped snapshot persistence.
pub mod snapshot;

pub use distance::Distance;
pub use error::Error;
pub use nsw::{NearSet, Neighbor, NswConfig, ProximityResult};
