//! Insertion: construction search, bidirectional wiring, prune triggers.

use crate::config;
use crate::distance::Distance;
use crate::nsw::graph::NearSet;
use std::hash::Hash;

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    /// Inserts a value. Returns `true` if it was newly stored, `false` if
    /// an equal value was already present (the graph is left untouched).
    ///
    /// The new node is wired to up to `M + 3` construction candidates found
    /// by a budgeted search; the extra candidates widen the pool the pruner
    /// selects diverse edges from. Each of the first `M` wired neighbors is
    /// re-pruned immediately; the extras shed excess edges the next time
    /// they go over capacity.
    pub fn add(&mut self, value: V) -> bool {
        if self.contains(&value) {
            return false;
        }
        if self.is_empty() {
            self.insert_node(value);
            return true;
        }

        let m = self.config.neighbourhood_size;
        let k = (m + config::CONSTRUCTION_EXTRA_CANDIDATES).min(self.len());
        let limit = self.construction_limit();
        let candidates = {
            let seeds = self.sampled_seeds(&value, limit);
            let mut scratch = self.scratch_mut();
            let mut found = self.walk(&value, self.ef(k), limit, &seeds, &mut scratch);
            found.truncate(k);
            found
        };

        let new_slot = self.insert_node(value);
        for (i, &candidate) in candidates.iter().enumerate() {
            self.push_edge(new_slot, candidate.slot, candidate.distance);
            if i < m {
                self.prune_if_over(candidate.slot);
            }
        }
        self.prune_if_over(new_slot);
        true
    }
}
