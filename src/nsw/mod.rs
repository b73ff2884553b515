//! Navigable small-world (NSW) approximate nearest-neighbour set.
//!
//! This module implements a bounded-degree proximity graph over arbitrary
//! values. Nodes live in a dense arena (an order-preserving map from value
//! to node), so every node has a stable slot index that supports O(1)
//! entry-point sampling and O(1) swap-with-last removal. Edges carry the
//! cached distance between their endpoints and are kept symmetric.
//!
//! Search is a best-first walk seeded from evenly spaced entry points, with
//! a bounded result heap, tight candidate gating, and a small refinement
//! pass. Insertion wires a new node to the construction candidates the
//! search returns and diversifies affected edge sets with α-RNG pruning.
//! Removal detaches a node in O(1) and heals the hole it leaves by
//! reconnecting its surviving neighbors.

/// Container, configuration, and edge primitives.
pub mod graph;
/// Ordered result views returned by queries.
pub mod result;

mod insert;
mod prune;
mod remove;
mod search;
mod visited;

pub use graph::{NearSet, NswConfig};
pub use result::{Neighbor, ProximityResult};
