//! α-RNG edge diversification.
//!
//! When a node exceeds its degree bound the pruner rewrites its neighbor
//! set: candidates are scanned in ascending cached-distance order, and a
//! candidate is rejected when an already-selected neighbor "covers" it —
//! `d(selected, candidate) · α < d(node, candidate)`. Inter-neighbor
//! distances come from either endpoint's cache when possible; a bounded
//! number of fresh computations is allowed per call, and once the budget
//! is gone an unresolvable check never disqualifies a candidate. If the
//! rule selects fewer than `M` neighbors the remainder is topped up with
//! the closest rejected candidates. Reverse edges of dropped neighbors
//! are removed so the graph stays symmetric.

use crate::config;
use crate::distance::Distance;
use crate::nsw::graph::{NearSet, Scratch};
use std::cmp::Ordering;
use std::hash::Hash;

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    /// Diversifies `slot`'s neighbor set if it exceeds the degree bound.
    pub(crate) fn prune_if_over(&mut self, slot: u32) {
        if self.node_at(slot).neighbors.len() > self.config.neighbourhood_size {
            self.prune(slot);
        }
    }

    fn prune(&mut self, slot: u32) {
        let m = self.config.neighbourhood_size;
        let alpha = self.config.pruning_alpha;

        let mut guard = self.scratch.borrow_mut();
        let Scratch {
            prune_order,
            prune_selected,
            ..
        } = &mut *guard;
        prune_order.clear();
        prune_selected.clear();
        prune_order.extend_from_slice(&self.nodes[slot as usize].neighbors);
        prune_order.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));

        let mut fresh_budget = config::PRUNE_FRESH_DISTANCE_BUDGET;
        for &candidate in prune_order.iter() {
            if prune_selected.len() >= m {
                break;
            }
            let mut covered = false;
            for &selected in prune_selected.iter().take(config::PRUNE_CHECK_LIMIT) {
                let between = match self.cached_edge_distance(selected.slot, candidate.slot) {
                    Some(d) => d,
                    None if fresh_budget > 0 => {
                        fresh_budget -= 1;
                        self.distance_between_slots(selected.slot, candidate.slot)
                    }
                    // Budget exhausted: an unresolved check does not disqualify.
                    None => continue,
                };
                if between * alpha < candidate.distance {
                    covered = true;
                    break;
                }
            }
            if !covered {
                prune_selected.push(candidate);
            }
        }

        // Top up with the closest rejected candidates.
        if prune_selected.len() < m {
            for &candidate in prune_order.iter() {
                if prune_selected.len() >= m {
                    break;
                }
                if !prune_selected.iter().any(|s| s.slot == candidate.slot) {
                    prune_selected.push(candidate);
                }
            }
        }

        for &candidate in prune_order.iter() {
            if !prune_selected.iter().any(|s| s.slot == candidate.slot) {
                self.nodes[candidate.slot as usize].drop_edge(slot);
            }
        }

        let node = &mut self.nodes[slot as usize];
        node.neighbors.clear();
        node.neighbors.extend_from_slice(prune_selected);
    }
}
