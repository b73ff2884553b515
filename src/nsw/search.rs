//! Best-first k-nearest search over the proximity graph.
//!
//! The walk keeps two heaps: a min-heap frontier of candidates to expand
//! and a bounded max-heap of the best results found so far, with the worst
//! retained distance cached in a scalar. A neighbor whose distance cannot
//! enter the result set is skipped before anything is allocated for it.
//! The walk stops on frontier exhaustion, on the visited budget, on the
//! configured step cap, or as soon as the best remaining candidate cannot
//! improve the results. A short refinement pass then re-expands the top
//! results under a small shared distance budget.

use crate::config;
use crate::distance::Distance;
use crate::error::Error;
use crate::nsw::graph::{Edge, NearSet, Scratch};
use crate::nsw::result::{Neighbor, ProximityResult};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::hash::Hash;

/// A frontier entry: (negative distance, slot). `BinaryHeap` is a
/// max-heap; the negated distance makes it pop closest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    neg_distance: OrderedFloat<f64>,
    slot: u32,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.neg_distance.cmp(&other.neg_distance)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A result entry: (distance, slot). Max-heap by distance so the worst
/// retained result is always on top, ready for eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResultEntry {
    distance: OrderedFloat<f64>,
    slot: u32,
}

impl Ord for ResultEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.cmp(&other.distance)
    }
}

impl PartialOrd for ResultEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    /// Finds the nearest stored values to `value`, up to the configured
    /// search-set width, in ascending distance order.
    ///
    /// An empty set yields an empty result view, not an error.
    pub fn find_neighbors(&self, value: &V) -> ProximityResult<'_, V> {
        self.knn(value, self.config.search_set_size)
    }

    /// Finds the `k` nearest stored values to `value` in ascending
    /// distance order. Returns fewer than `k` entries only when fewer
    /// values are stored.
    ///
    /// `k == 0` is a caller error.
    pub fn find_k_neighbors(&self, value: &V, k: usize) -> Result<ProximityResult<'_, V>, Error> {
        if k == 0 {
            return Err(Error::InvalidK);
        }
        Ok(self.knn(value, k))
    }

    fn knn(&self, value: &V, k: usize) -> ProximityResult<'_, V> {
        if self.is_empty() {
            return ProximityResult::empty();
        }

        let mut found = match self.slot_of(value) {
            // A stored query at k = 1 is exact: the node itself at distance 0.
            Some(slot) if k == 1 => vec![Edge {
                slot,
                distance: 0.0,
            }],
            // A stored query at k > 1 still walks the graph (its own edge
            // set is diversified, not ordered by true proximity), seeded
            // from the node and its cached edges at zero fresh cost.
            Some(slot) => {
                let seeds = self.stored_seeds(slot);
                let mut scratch = self.scratch_mut();
                self.walk(value, self.ef(k), self.query_limit(), &seeds, &mut scratch)
            }
            None => {
                let limit = self.query_limit();
                let seeds = self.sampled_seeds(value, limit);
                let mut scratch = self.scratch_mut();
                self.walk(value, self.ef(k), limit, &seeds, &mut scratch)
            }
        };
        found.truncate(k);

        ProximityResult::new(
            found
                .into_iter()
                .map(|e| Neighbor {
                    value: self.value_at(e.slot),
                    distance: e.distance,
                })
                .collect(),
        )
    }

    /// The best-first walk. Seeds carry precomputed distances; every other
    /// distance is computed exactly once per visited node. Returns up to
    /// `ef` entries in ascending distance order.
    pub(crate) fn walk(
        &self,
        query: &V,
        ef: usize,
        search_limit: usize,
        seeds: &[Edge],
        scratch: &mut Scratch,
    ) -> Vec<Edge> {
        let max_steps = self.config.search_max_steps;
        scratch.visited.reset(self.len());
        scratch.frontier.clear();
        scratch.results.clear();
        let mut worst = f64::MAX;

        for &seed in seeds {
            if !scratch.visited.mark(seed.slot) {
                continue;
            }
            scratch.frontier.push(Candidate {
                neg_distance: OrderedFloat(-seed.distance),
                slot: seed.slot,
            });
            scratch.results.push(ResultEntry {
                distance: OrderedFloat(seed.distance),
                slot: seed.slot,
            });
            if scratch.results.len() > ef {
                scratch.results.pop();
            }
            if scratch.results.len() >= ef {
                worst = scratch.results.peek().map_or(f64::MAX, |r| r.distance.0);
            }
        }

        if max_steps != 0 {
            let mut steps: i32 = 0;
            while let Some(candidate) = scratch.frontier.pop() {
                let c_dist = -candidate.neg_distance.0;
                // No further expansion can improve the result set.
                if c_dist > worst {
                    break;
                }
                steps += 1;
                if max_steps > 0 && steps > max_steps {
                    break;
                }
                if scratch.visited.len() >= search_limit {
                    break;
                }

                let node = self.node_at(candidate.slot);
                for &edge in &node.neighbors {
                    if !scratch.visited.mark(edge.slot) {
                        continue;
                    }
                    let d = self.distance_to_slot(query, edge.slot);
                    // Cannot enter the result set; skip before allocating.
                    if d > worst {
                        continue;
                    }
                    if d < worst {
                        scratch.frontier.push(Candidate {
                            neg_distance: OrderedFloat(-d),
                            slot: edge.slot,
                        });
                    }
                    scratch.results.push(ResultEntry {
                        distance: OrderedFloat(d),
                        slot: edge.slot,
                    });
                    if scratch.results.len() > ef {
                        scratch.results.pop();
                    }
                    if scratch.results.len() >= ef {
                        worst = scratch.results.peek().map_or(f64::MAX, |r| r.distance.0);
                    }
                }
            }
        }

        // Max-heap pops worst-first; reversing yields ascending order.
        let mut out: Vec<Edge> = Vec::with_capacity(scratch.results.len());
        while let Some(entry) = scratch.results.pop() {
            out.push(Edge {
                slot: entry.slot,
                distance: entry.distance.0,
            });
        }
        out.reverse();

        if max_steps != 0 {
            self.refine(query, &mut out, scratch);
        }
        out
    }

    /// Re-expands the top results under a shared fresh-distance budget and
    /// restores ascending order.
    fn refine(&self, query: &V, out: &mut Vec<Edge>, scratch: &mut Scratch) {
        let mut budget = config::REFINE_DISTANCE_BUDGET;
        let top = out.len().min(config::REFINE_TOP_RESULTS);
        'top: for i in 0..top {
            let slot = out[i].slot;
            for &edge in &self.node_at(slot).neighbors {
                if budget == 0 {
                    break 'top;
                }
                if !scratch.visited.mark(edge.slot) {
                    continue;
                }
                budget -= 1;
                out.push(Edge {
                    slot: edge.slot,
                    distance: self.distance_to_slot(query, edge.slot),
                });
            }
        }
        out.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    }

    /// Seeds for a stored query: the node itself at distance 0 plus its
    /// cached edges. No fresh distance computations.
    fn stored_seeds(&self, slot: u32) -> Vec<Edge> {
        let node = self.node_at(slot);
        let mut seeds = Vec::with_capacity(node.neighbors.len() + 1);
        seeds.push(Edge {
            slot,
            distance: 0.0,
        });
        seeds.extend_from_slice(&node.neighbors);
        seeds
    }

    /// Seeds for an unstored query: evenly spaced slots, one distance
    /// computation each.
    pub(crate) fn sampled_seeds(&self, query: &V, search_limit: usize) -> Vec<Edge> {
        let n = self.len();
        let count = self.entry_point_count(n, search_limit);
        let step = (n / count).max(1);
        (0..count)
            .map(|i| {
                let slot = ((i * step) % n) as u32;
                Edge {
                    slot,
                    distance: self.distance_to_slot(query, slot),
                }
            })
            .collect()
    }

    /// Deterministic entry-point count: the configured value, or
    /// `max(3, floor(sqrt(n)))`, capped so seeding never consumes more
    /// than a sixth of the visited budget.
    fn entry_point_count(&self, n: usize, search_limit: usize) -> usize {
        let configured = self.config.num_entry_points;
        let automatic = config::MIN_ENTRY_POINTS.max((n as f64).sqrt() as usize);
        let count = if configured >= 1 {
            configured as usize
        } else {
            automatic
        };
        count
            .min((search_limit / config::ENTRY_POINT_BUDGET_DIVISOR).max(1))
            .clamp(1, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Distance;

    fn line_set(values: impl IntoIterator<Item = i64>) -> NearSet<i64, impl Distance<i64>> {
        let mut set = NearSet::new(|a: &i64, b: &i64| (a - b).abs() as f64);
        for v in values {
            set.add(v);
        }
        set
    }

    #[test]
    fn test_empty_set_returns_empty_view() {
        let set = line_set([]);
        let found = set.find_neighbors(&42);
        assert!(found.is_empty());
        assert_eq!(found.closest(), None);
        assert!(found.distance().is_nan());

        let found = set.find_k_neighbors(&42, 5).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_zero_k_is_an_error() {
        let set = line_set([1, 2, 3]);
        assert_eq!(set.find_k_neighbors(&2, 0).err(), Some(Error::InvalidK));
    }

    #[test]
    fn test_returns_k_results_in_order() {
        let set = line_set((0..100).map(|i| i * 10));
        for k in [1usize, 5, 10] {
            let found = set.find_k_neighbors(&204, k).unwrap();
            assert_eq!(found.len(), k, "k = {k}");
            let distances: Vec<f64> = found.iter().map(|n| n.distance).collect();
            for pair in distances.windows(2) {
                assert!(pair[0] <= pair[1], "unsorted: {distances:?}");
            }
        }
        assert_eq!(*set.find_k_neighbors(&204, 1).unwrap().closest().unwrap(), 200);
    }

    #[test]
    fn test_k_larger_than_set() {
        let set = line_set([5, 6, 7]);
        let found = set.find_k_neighbors(&6, 50).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_stored_query_is_exact() {
        let set = line_set((0..50).map(|i| i * 7));
        let found = set.find_k_neighbors(&21, 1).unwrap();
        assert_eq!(found.closest(), Some(&21));
        assert_eq!(found.distance(), 0.0);

        let found = set.find_k_neighbors(&21, 5).unwrap();
        assert_eq!(found.closest(), Some(&21));
        assert_eq!(found.distance(), 0.0);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_finds_true_nearest_on_line() {
        let set = line_set((0..500).map(|i| i * 2));
        // Odd queries sit between two stored points; the nearer one is fixed.
        for q in [1, 333, 607, 997] {
            let found = set.find_k_neighbors(&q, 1).unwrap();
            let best = *found.closest().unwrap();
            assert!(
                (best - q).abs() <= 1,
                "query {q}: expected an adjacent even value, got {best}"
            );
        }
    }

    #[test]
    fn test_entry_points_only_mode() {
        let mut set = line_set((0..200).map(|i| i * 5));
        set.set_search_max_steps(0).unwrap();
        // Without a walk the result can only contain seeded entry points.
        let found = set.find_k_neighbors(&303, 10).unwrap();
        assert_eq!(found.len(), 10);
        let distances: Vec<f64> = found.iter().map(|n| n.distance).collect();
        for pair in distances.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn test_entry_points_only_stored_query_lists_cached_edges() {
        let mut set = line_set((0..100).map(|i| i * 3));
        set.set_search_max_steps(0).unwrap();
        let found = set.find_k_neighbors(&30, 5).unwrap();
        assert_eq!(found.closest(), Some(&30));
        assert_eq!(found.distance(), 0.0);
        // Every other entry is a direct graph neighbor with its cached distance.
        let edges = set.graph_neighbors(&30).unwrap();
        for neighbor in found.iter().skip(1) {
            assert!(
                edges
                    .iter()
                    .any(|(v, d)| *v == neighbor.value && *d == neighbor.distance),
                "{} is not a cached edge of 30",
                neighbor.value
            );
        }
    }

    #[test]
    fn test_positive_step_cap_limits_expansion() {
        use std::cell::Cell;
        let calls = Cell::new(0usize);
        let mut set = NearSet::new(|a: &i64, b: &i64| {
            calls.set(calls.get() + 1);
            (a - b).abs() as f64
        });
        for v in 0..300 {
            set.add(v);
        }

        calls.set(0);
        set.set_search_max_steps(2).unwrap();
        let _ = set.find_k_neighbors(&1000, 1).unwrap();
        let capped = calls.get();

        calls.set(0);
        set.set_search_max_steps(-1).unwrap();
        let _ = set.find_k_neighbors(&1000, 1).unwrap();
        let unbounded = calls.get();

        assert!(
            capped < unbounded,
            "2-step walk used {capped} distance calls, unbounded used {unbounded}"
        );
    }
}
