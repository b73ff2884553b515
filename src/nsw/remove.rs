//! Removal and graph healing.
//!
//! Detaching a node is O(1): the arena swaps the last slot into the hole,
//! and the moved node's own edge list says exactly which neighbors must be
//! re-pointed. The healing pass then reconnects the removed node's
//! surviving neighbors to each other, re-reading each node's degree before
//! every new edge, and re-prunes every touched survivor.

use crate::distance::Distance;
use crate::nsw::graph::NearSet;
use std::hash::Hash;

impl<V: Eq + Hash, D: Distance<V>> NearSet<V, D> {
    /// Removes a value. Returns `true` if it was stored, `false` otherwise.
    pub fn remove(&mut self, value: &V) -> bool {
        let Some(rm_index) = self.nodes.get_index_of(value) else {
            return false;
        };
        let rm_slot = rm_index as u32;

        // Cut every reverse edge while slot numbering is still intact.
        let mut survivors: Vec<u32> = self
            .node_at(rm_slot)
            .neighbors
            .iter()
            .map(|e| e.slot)
            .collect();
        for &neighbor in &survivors {
            self.nodes[neighbor as usize].drop_edge(rm_slot);
        }

        // Detach: the tail node moves into the vacated slot.
        let moved_from = (self.nodes.len() - 1) as u32;
        let _ = self.nodes.swap_remove_index(rm_index);
        if moved_from != rm_slot {
            let moved_peers: Vec<u32> = self
                .node_at(rm_slot)
                .neighbors
                .iter()
                .map(|e| e.slot)
                .collect();
            for peer in moved_peers {
                for edge in &mut self.nodes[peer as usize].neighbors {
                    if edge.slot == moved_from {
                        edge.slot = rm_slot;
                    }
                }
            }
            for slot in survivors.iter_mut() {
                if *slot == moved_from {
                    *slot = rm_slot;
                }
            }
        }

        // Healing: reconnect each survivor to the others while it has room.
        // A peer pushed over capacity here is re-pruned below.
        let m = self.config.neighbourhood_size;
        for i in 0..survivors.len() {
            let u = survivors[i];
            for (j, &v) in survivors.iter().enumerate() {
                if i == j {
                    continue;
                }
                // Degree grows as healing proceeds; re-read it per edge.
                if self.node_at(u).neighbors.len() >= m {
                    break;
                }
                if self.node_at(u).edge_to(v).is_some() {
                    continue;
                }
                let distance = self.distance_between_slots(u, v);
                self.push_edge(u, v, distance);
                tracing::trace!(u, v, distance, "healed edge after removal");
            }
        }
        for &survivor in &survivors {
            self.prune_if_over(survivor);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::distance::Distance;
    use crate::nsw::graph::NearSet;

    fn line_set(values: impl IntoIterator<Item = i64>) -> NearSet<i64, impl Distance<i64>> {
        let mut set = NearSet::new(|a: &i64, b: &i64| (a - b).abs() as f64);
        for v in values {
            set.add(v);
        }
        set
    }

    #[test]
    fn test_remove_absent_returns_false() {
        let mut set = line_set([1, 2, 3]);
        assert!(!set.remove(&99));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_remove_only_node() {
        let mut set = line_set([7]);
        assert!(set.remove(&7));
        assert!(set.is_empty());
        assert!(!set.contains(&7));
        assert!(set.find_neighbors(&7).is_empty());
    }

    #[test]
    fn test_remove_detaches_and_heals() {
        let mut set = line_set([0, 10, 20]);
        set.validate().unwrap();

        // 10 bridges 0 and 20; removing it must leave them connected.
        assert!(set.remove(&10));
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&10));
        set.validate().unwrap();
        assert_eq!(set.graph_neighbors(&0).unwrap(), vec![(&20, 20.0)]);
    }

    #[test]
    fn test_remove_middle_slot_repoints_moved_edges() {
        // Removing an early slot forces the tail node into its place;
        // every edge that referenced the tail must follow it.
        let mut set = line_set((0..50).map(|i| i * 4));
        for v in [0, 8, 24, 48, 96] {
            assert!(set.remove(&v));
            set.validate().unwrap();
        }
        assert_eq!(set.len(), 45);
        for v in (0..50).map(|i| i * 4) {
            let expect = ![0, 8, 24, 48, 96].contains(&v);
            assert_eq!(set.contains(&v), expect, "value {v}");
        }
    }

    #[test]
    fn test_remove_then_add_restores_membership() {
        let mut set = line_set((0..100).map(|i| i * 3));
        assert!(set.remove(&150));
        assert!(!set.contains(&150));
        assert!(set.add(150));
        assert!(set.contains(&150));
        set.validate().unwrap();

        let found = set.find_k_neighbors(&150, 1).unwrap();
        assert_eq!(found.closest(), Some(&150));
        assert_eq!(found.distance(), 0.0);
    }

    #[test]
    fn test_queries_stay_exact_after_bulk_removal() {
        let mut set = line_set((0..200).map(|i| i * 2));
        for v in (40..160).filter(|v| v % 4 == 0) {
            set.remove(&v);
        }
        set.validate().unwrap();

        // Survivors in the carved-out range are the v % 4 == 2 values.
        for q in [41, 85, 121] {
            let found = set.find_k_neighbors(&q, 1).unwrap();
            let best = *found.closest().unwrap();
            assert!(
                (best - q).abs() <= 1,
                "query {q}: nearest survivor expected, got {best}"
            );
        }
    }
}
