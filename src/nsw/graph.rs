//! NSW graph container and configuration.
//!
//! [`NswConfig`] carries the tuning parameters (neighbourhood size, search
//! width, step and entry-point budgets, pruning α). [`NearSet`] owns the
//! node arena: an order-preserving map from value to node, so each node has
//! a dense slot index. Slots support O(1) entry-point sampling and O(1)
//! swap-with-last removal; the map itself is the value → slot lookup.

use crate::config;
use crate::distance::Distance;
use crate::error::Error;
use crate::nsw::search::{Candidate, ResultEntry};
use crate::nsw::visited::VisitedSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{RefCell, RefMut};
use std::collections::BinaryHeap;
use std::hash::Hash;

/// Tuning parameters for a [`NearSet`].
///
/// Controls the trade-off between build cost, query cost, and recall. All
/// parameters should be set before the first insert to take global effect;
/// changing them later only affects subsequent operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NswConfig {
    /// Maximum number of bidirectional links per node (`M`).
    pub neighbourhood_size: usize,
    /// Minimum working result-set width (`ef`) during search.
    pub search_set_size: usize,
    /// Cap on best-first expansion steps: `-1` unbounded, `0` entry points
    /// only (no walk, no refinement), positive for an explicit limit.
    pub search_max_steps: i32,
    /// Multiplier on `search_set_size` for the per-query visited budget.
    pub adaptive_step_factor: f32,
    /// Entry-point count; `-1` selects `max(3, floor(sqrt(n)))`.
    pub num_entry_points: i32,
    /// Extra budget multiplier for the insert-time construction search.
    pub construction_factor: f32,
    /// α for RNG-rule edge diversification; larger keeps more long-range
    /// edges at no extra distance-computation cost.
    pub pruning_alpha: f64,
}

impl Default for NswConfig {
    fn default() -> Self {
        Self {
            neighbourhood_size: config::DEFAULT_NEIGHBOURHOOD_SIZE,
            search_set_size: config::DEFAULT_SEARCH_SET_SIZE,
            search_max_steps: config::DEFAULT_SEARCH_MAX_STEPS,
            adaptive_step_factor: config::DEFAULT_ADAPTIVE_STEP_FACTOR,
            num_entry_points: config::DEFAULT_NUM_ENTRY_POINTS,
            construction_factor: config::DEFAULT_CONSTRUCTION_FACTOR,
            pruning_alpha: config::DEFAULT_PRUNING_ALPHA,
        }
    }
}

impl NswConfig {
    /// Checks every parameter against its legal range.
    pub fn validate(&self) -> Result<(), Error> {
        if self.neighbourhood_size == 0 {
            return Err(Error::InvalidConfig {
                param: "neighbourhood_size",
                reason: "must be at least 1",
            });
        }
        if self.search_set_size == 0 {
            return Err(Error::InvalidConfig {
                param: "search_set_size",
                reason: "must be at least 1",
            });
        }
        if self.search_max_steps < -1 {
            return Err(Error::InvalidConfig {
                param: "search_max_steps",
                reason: "must be -1 (unbounded), 0, or positive",
            });
        }
        if !(self.adaptive_step_factor.is_finite() && self.adaptive_step_factor > 0.0) {
            return Err(Error::InvalidConfig {
                param: "adaptive_step_factor",
                reason: "must be finite and greater than 0",
            });
        }
        if self.num_entry_points != -1 && self.num_entry_points < 1 {
            return Err(Error::InvalidConfig {
                param: "num_entry_points",
                reason: "must be -1 (automatic) or at least 1",
            });
        }
        if !(self.construction_factor.is_finite() && self.construction_factor >= 1.0) {
            return Err(Error::InvalidConfig {
                param: "construction_factor",
                reason: "must be finite and at least 1.0",
            });
        }
        if !(self.pruning_alpha.is_finite() && self.pruning_alpha > 0.0) {
            return Err(Error::InvalidConfig {
                param: "pruning_alpha",
                reason: "must be finite and greater than 0",
            });
        }
        Ok(())
    }
}

/// A directed half of a bidirectional link: the peer's slot and the cached
/// distance between the two endpoint values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct Edge {
    pub(crate) slot: u32,
    pub(crate) distance: f64,
}

/// One stored value's adjacency. The value itself is the arena key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Node {
    pub(crate) neighbors: Vec<Edge>,
}

impl Node {
    /// Cached distance to `slot`, if an edge to it exists.
    pub(crate) fn edge_to(&self, slot: u32) -> Option<f64> {
        self.neighbors
            .iter()
            .find(|e| e.slot == slot)
            .map(|e| e.distance)
    }

    /// Removes the edge to `slot` if present. Neighbor order carries no
    /// meaning, so the removal may swap.
    pub(crate) fn drop_edge(&mut self, slot: u32) {
        if let Some(pos) = self.neighbors.iter().position(|e| e.slot == slot) {
            self.neighbors.swap_remove(pos);
        }
    }
}

/// Reusable per-call working memory: the visited stamps, both search heaps,
/// and the pruner's candidate lists. Cleared between calls, never dropped,
/// and lazily re-created after deserialization.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub(crate) visited: VisitedSet,
    pub(crate) frontier: BinaryHeap<Candidate>,
    pub(crate) results: BinaryHeap<ResultEntry>,
    pub(crate) prune_order: Vec<Edge>,
    pub(crate) prune_selected: Vec<Edge>,
}

/// An approximate nearest-neighbour set over values of type `V`, using a
/// caller-supplied [`Distance`] function.
///
/// Values are identified by their own equality (`Eq + Hash`); inserting an
/// equal value a second time is a no-op. The set is a single-threaded
/// mutable structure with no internal synchronization — wrap it externally
/// if it must be shared.
pub struct NearSet<V, D> {
    pub(crate) distance: D,
    pub(crate) config: NswConfig,
    pub(crate) nodes: IndexMap<V, Node>,
    pub(crate) scratch: RefCell<Scratch>,
}

impl<V, D> std::fmt::Debug for NearSet<V, D>
where
    V: std::fmt::Debug + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearSet")
            .field("config", &self.config)
            .field("nodes", &self.nodes)
            .finish()
    }
}

impl<V, D> NearSet<V, D> {
    /// Creates an empty set with default configuration.
    pub fn new(distance: D) -> Self {
        Self {
            distance,
            config: NswConfig::default(),
            nodes: IndexMap::new(),
            scratch: RefCell::new(Scratch::default()),
        }
    }

    /// Creates an empty set with the given configuration.
    pub fn with_config(distance: D, config: NswConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            distance,
            config,
            nodes: IndexMap::new(),
            scratch: RefCell::new(Scratch::default()),
        })
    }

    pub(crate) fn from_parts(distance: D, config: NswConfig, nodes: IndexMap<V, Node>) -> Self {
        Self {
            distance,
            config,
            nodes,
            scratch: RefCell::new(Scratch::default()),
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &NswConfig {
        &self.config
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when no values are stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates the stored values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.nodes.keys()
    }

    /// Sets the maximum node degree `M`.
    pub fn set_neighbourhood_size(&mut self, value: usize) -> Result<(), Error> {
        self.update_config(|c| c.neighbourhood_size = value)
    }

    /// Sets the minimum working result-set width.
    pub fn set_search_set_size(&mut self, value: usize) -> Result<(), Error> {
        self.update_config(|c| c.search_set_size = value)
    }

    /// Sets the expansion-step cap (`-1` unbounded, `0` entry points only).
    pub fn set_search_max_steps(&mut self, value: i32) -> Result<(), Error> {
        self.update_config(|c| c.search_max_steps = value)
    }

    /// Sets the visited-budget multiplier.
    pub fn set_adaptive_step_factor(&mut self, value: f32) -> Result<(), Error> {
        self.update_config(|c| c.adaptive_step_factor = value)
    }

    /// Sets the entry-point count (`-1` for automatic).
    pub fn set_num_entry_points(&mut self, value: i32) -> Result<(), Error> {
        self.update_config(|c| c.num_entry_points = value)
    }

    /// Sets the construction-budget multiplier.
    pub fn set_construction_factor(&mut self, value: f32) -> Result<(), Error> {
        self.update_config(|c| c.construction_factor = value)
    }

    /// Sets the pruning α.
    pub fn set_pruning_alpha(&mut self, value: f64) -> Result<(), Error> {
        self.update_config(|c| c.pruning_alpha = value)
    }

    fn update_config(&mut self, apply: impl FnOnce(&mut NswConfig)) -> Result<(), Error> {
        let mut config = self.config.clone();
        apply(&mut config);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Visited budget for a query-time walk.
    pub(crate) fn query_limit(&self) -> usize {
        let limit = (self.config.search_set_size as f32 * self.config.adaptive_step_factor) as usize;
        limit.max(1)
    }

    /// Visited budget for the insert-time construction search.
    pub(crate) fn construction_limit(&self) -> usize {
        let limit = (self.config.search_set_size as f32
            * self.config.adaptive_step_factor
            * self.config.construction_factor) as usize;
        limit.max(1)
    }

    /// Result-heap width for a query asking for `k` neighbors.
    pub(crate) fn ef(&self, k: usize) -> usize {
        k.max(self.config.search_set_size)
    }

    pub(crate) fn scratch_mut(&self) -> RefMut<'_, Scratch> {
        self.scratch.borrow_mut()
    }

    #[inline]
    pub(crate) fn node_at(&self, slot: u32) -> &Node {
        &self.nodes[slot as usize]
    }

    #[inline]
    pub(crate) fn value_at(&self, slot: u32) -> &V {
        match self.nodes.get_index(slot as usize) {
            Some((value, _)) => value,
            None => unreachable!("edge references vacant slot {slot}"),
        }
    }

    /// Adds the bidirectional edge `a ↔ b` with the given cached distance.
    pub(crate) fn push_edge(&mut self, a: u32, b: u32, distance: f64) {
        self.nodes[a as usize].neighbors.push(Edge { slot: b, distance });
        self.nodes[b as usize].neighbors.push(Edge { slot: a, distance });
    }
}

impl<V: Eq + Hash, D> NearSet<V, D> {
    /// Returns `true` if an equal value is stored.
    pub fn contains(&self, value: &V) -> bool {
        self.nodes.contains_key(value)
    }

    /// A stored node's raw graph edges as `(value, cached distance)` pairs,
    /// or `None` if the value is not stored.
    ///
    /// Graph edges are diversified for navigability, not ordered by true
    /// proximity — use [`find_k_neighbors`](Self::find_k_neighbors) for
    /// actual k-nearest results.
    pub fn graph_neighbors(&self, value: &V) -> Option<Vec<(&V, f64)>> {
        let slot = self.slot_of(value)?;
        Some(
            self.node_at(slot)
                .neighbors
                .iter()
                .map(|e| (self.value_at(e.slot), e.distance))
                .collect(),
        )
    }

    /// Verifies the structural invariants of the graph: bounded degree,
    /// edge symmetry with bit-identical cached distances, in-bounds slots,
    /// no self-loops, and no duplicate edges.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.nodes.len();
        let m = self.config.neighbourhood_size;
        for (slot, node) in self.nodes.values().enumerate() {
            if node.neighbors.len() > m {
                return Err(format!(
                    "node {slot} has {} neighbors, limit is {m}",
                    node.neighbors.len()
                ));
            }
            for (i, edge) in node.neighbors.iter().enumerate() {
                let peer = edge.slot as usize;
                if peer >= n {
                    return Err(format!(
                        "node {slot} references slot {peer}, only {n} slots exist"
                    ));
                }
                if peer == slot {
                    return Err(format!("node {slot} has a self-loop"));
                }
                if node.neighbors[..i].iter().any(|e| e.slot == edge.slot) {
                    return Err(format!("node {slot} lists slot {peer} twice"));
                }
                match self.nodes[peer].edge_to(slot as u32) {
                    Some(back) if back.to_bits() == edge.distance.to_bits() => {}
                    Some(back) => {
                        return Err(format!(
                            "edge {slot} <-> {peer} caches {} one way and {back} the other",
                            edge.distance
                        ));
                    }
                    None => {
                        return Err(format!("edge {slot} -> {peer} has no reverse edge"));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn slot_of(&self, value: &V) -> Option<u32> {
        self.nodes.get_index_of(value).map(|slot| slot as u32)
    }

    pub(crate) fn insert_node(&mut self, value: V) -> u32 {
        let (slot, _) = self.nodes.insert_full(value, Node::default());
        slot as u32
    }
}

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    #[inline]
    pub(crate) fn distance_to_slot(&self, query: &V, slot: u32) -> f64 {
        self.distance.compute(query, self.value_at(slot))
    }

    #[inline]
    pub(crate) fn distance_between_slots(&self, a: u32, b: u32) -> f64 {
        self.distance.compute(self.value_at(a), self.value_at(b))
    }

    /// Cached distance between two stored nodes, consulting either
    /// endpoint's neighbor map.
    pub(crate) fn cached_edge_distance(&self, a: u32, b: u32) -> Option<f64> {
        self.node_at(a)
            .edge_to(b)
            .or_else(|| self.node_at(b).edge_to(a))
    }
}
