//! Unit tests for the aggro table.

#[cfg(test)]
mod ordering_tests {
    use npc_core::CharacterId;

    use crate::AggroMgr;

    #[test]
    fn empty_table_has_no_highest() {
        let mgr = AggroMgr::default();
        assert!(mgr.highest_entry().is_none());
        assert!(mgr.is_empty());
    }

    #[test]
    fn highest_is_maximum_score() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        mgr.add_aggro(CharacterId(2), 20.0);
        mgr.add_aggro(CharacterId(3), 10.0);
        let top = mgr.highest_entry().unwrap();
        assert_eq!(top.target, CharacterId(2));
        assert_eq!(top.aggro, 20.0);
    }

    #[test]
    fn ties_go_to_earliest_inserted() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(9), 10.0);
        mgr.add_aggro(CharacterId(1), 10.0);
        mgr.add_aggro(CharacterId(5), 10.0);
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(9));
    }

    #[test]
    fn increment_accumulates_and_reorders() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 10.0);
        mgr.add_aggro(CharacterId(2), 8.0);
        let e = mgr.add_aggro(CharacterId(2), 5.0).unwrap();
        assert_eq!(e.aggro, 13.0);
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(2));
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn increment_keeps_insertion_rank_for_ties() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 4.0);
        mgr.add_aggro(CharacterId(2), 10.0);
        // 1 was inserted first; reaching the same score puts it back on top.
        mgr.add_aggro(CharacterId(1), 6.0);
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(1));
    }

    #[test]
    fn entries_are_descending() {
        let mut mgr = AggroMgr::default();
        for (id, v) in [(1, 3.0), (2, 9.0), (3, 1.0), (4, 7.0)] {
            mgr.add_aggro(CharacterId(id), v);
        }
        let ids: Vec<i32> = mgr.entries().map(|e| e.target.0).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
        let above: Vec<i32> = mgr.entries_above(3.0).map(|e| e.target.0).collect();
        assert_eq!(above, vec![2, 4]);
    }
}

#[cfg(test)]
mod mutation_tests {
    use npc_core::CharacterId;

    use crate::AggroMgr;

    #[test]
    fn non_positive_insert_is_ignored() {
        let mut mgr = AggroMgr::default();
        assert!(mgr.add_aggro(CharacterId(1), 0.0).is_none());
        assert!(mgr.add_aggro(CharacterId(1), -3.0).is_none());
        assert!(mgr.is_empty());
    }

    #[test]
    fn negative_amount_past_zero_removes() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        assert!(mgr.add_aggro(CharacterId(1), -5.0).is_none());
        assert!(!mgr.contains(CharacterId(1)));
        assert!(mgr.highest_entry().is_none());
    }

    #[test]
    fn negative_amount_lowers_score() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        mgr.add_aggro(CharacterId(2), 4.0);
        mgr.add_aggro(CharacterId(1), -2.0);
        assert_eq!(mgr.aggro_of(CharacterId(1)), Some(3.0));
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(2));
    }

    #[test]
    fn non_finite_amount_is_ignored() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        let e = mgr.add_aggro(CharacterId(1), f64::NAN).unwrap();
        assert_eq!(e.aggro, 5.0);
        assert!(mgr.add_aggro(CharacterId(2), f64::INFINITY).is_none());
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn remove_returns_last_entry() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        let e = mgr.remove(CharacterId(1)).unwrap();
        assert_eq!(e.aggro, 5.0);
        assert!(mgr.remove(CharacterId(1)).is_none());
    }

    #[test]
    fn snapshots_survive_removal() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        let snapshot = mgr.highest_entry().unwrap();
        mgr.clear();
        assert_eq!(snapshot.target, CharacterId(1));
        assert_eq!(snapshot.aggro, 5.0);
    }
}

#[cfg(test)]
mod decay_tests {
    use npc_core::{AggroDecay, CharacterId, Millis};

    use crate::AggroMgr;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn no_decay_keeps_scores() {
        let mut mgr = AggroMgr::default();
        mgr.add_aggro(CharacterId(1), 5.0);
        mgr.update(Millis::from_secs(100));
        assert_eq!(mgr.aggro_of(CharacterId(1)), Some(5.0));
    }

    #[test]
    fn value_decay_subtracts_per_second() {
        let mut mgr = AggroMgr::new(AggroDecay::ByValue { per_second: 1.0 });
        mgr.add_aggro(CharacterId(1), 10.0);
        mgr.update(Millis(2500));
        assert!(close(mgr.aggro_of(CharacterId(1)).unwrap(), 7.5));
    }

    #[test]
    fn value_decay_removes_entries_reaching_zero() {
        let mut mgr = AggroMgr::new(AggroDecay::ByValue { per_second: 1.0 });
        mgr.add_aggro(CharacterId(1), 2.0);
        mgr.add_aggro(CharacterId(2), 10.0);
        mgr.update(Millis::from_secs(2));
        assert!(!mgr.contains(CharacterId(1)));
        assert!(close(mgr.aggro_of(CharacterId(2)).unwrap(), 8.0));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn insert_after_decay_uses_effective_score() {
        let mut mgr = AggroMgr::new(AggroDecay::ByValue { per_second: 1.0 });
        mgr.add_aggro(CharacterId(1), 10.0);
        mgr.update(Millis::from_secs(4));
        mgr.add_aggro(CharacterId(2), 7.0);
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(2));
        assert!(close(mgr.aggro_of(CharacterId(2)).unwrap(), 7.0));
        assert!(close(mgr.aggro_of(CharacterId(1)).unwrap(), 6.0));
    }

    #[test]
    fn ratio_decay_is_exponential() {
        let mut mgr = AggroMgr::new(AggroDecay::ByRatio { per_second: 0.5, min_aggro: 0.1 });
        mgr.add_aggro(CharacterId(1), 8.0);
        mgr.update(Millis::from_secs(1));
        assert!(close(mgr.aggro_of(CharacterId(1)).unwrap(), 4.0));
        mgr.update(Millis::from_secs(2));
        assert!(close(mgr.aggro_of(CharacterId(1)).unwrap(), 1.0));
    }

    #[test]
    fn ratio_decay_removes_below_minimum() {
        let mut mgr = AggroMgr::new(AggroDecay::ByRatio { per_second: 0.5, min_aggro: 1.0 });
        mgr.add_aggro(CharacterId(1), 1.5);
        mgr.add_aggro(CharacterId(2), 100.0);
        mgr.update(Millis::from_secs(1));
        assert!(!mgr.contains(CharacterId(1)));
        assert!(mgr.contains(CharacterId(2)));
    }

    #[test]
    fn decay_preserves_order() {
        let mut mgr = AggroMgr::new(AggroDecay::ByRatio { per_second: 0.2, min_aggro: 0.0 });
        mgr.add_aggro(CharacterId(1), 3.0);
        mgr.add_aggro(CharacterId(2), 9.0);
        mgr.add_aggro(CharacterId(3), 6.0);
        mgr.update(Millis::from_secs(3));
        let ids: Vec<i32> = mgr.entries().map(|e| e.target.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn long_decay_rebases_without_losing_entries() {
        let mut mgr = AggroMgr::new(AggroDecay::ByRatio { per_second: 0.9, min_aggro: 0.0 });
        mgr.add_aggro(CharacterId(1), 1e12);
        mgr.add_aggro(CharacterId(2), 2e12);
        for _ in 0..7 {
            mgr.update(Millis::from_secs(1));
        }
        // 2e12 * 0.1^7 == 2e5
        let top = mgr.highest_entry().unwrap();
        assert_eq!(top.target, CharacterId(2));
        assert!((top.aggro - 2e5).abs() < 1e-3);
        mgr.add_aggro(CharacterId(3), 3e5);
        assert_eq!(mgr.highest_entry().unwrap().target, CharacterId(3));
    }

    #[test]
    fn zero_delta_is_noop() {
        let mut mgr = AggroMgr::new(AggroDecay::ByValue { per_second: 100.0 });
        mgr.add_aggro(CharacterId(1), 1.0);
        mgr.update(Millis::ZERO);
        mgr.update(Millis(-50));
        assert_eq!(mgr.aggro_of(CharacterId(1)), Some(1.0));
    }
}

#[cfg(test)]
mod model_tests {
    //! Compare the table against a naive `Vec` model under random operations.

    use npc_core::{AgentRng, AggroDecay, CharacterId, Millis};

    use crate::AggroMgr;

    struct Naive {
        entries: Vec<(CharacterId, f64, u64)>,
        seq:     u64,
    }

    impl Naive {
        fn add(&mut self, target: CharacterId, amount: f64) {
            if let Some(pos) = self.entries.iter().position(|e| e.0 == target) {
                self.entries[pos].1 += amount;
                if self.entries[pos].1 <= 0.0 {
                    self.entries.remove(pos);
                }
            } else if amount > 0.0 {
                self.entries.push((target, amount, self.seq));
                self.seq += 1;
            }
        }

        fn decay(&mut self, by: f64) {
            for e in &mut self.entries {
                e.1 -= by;
            }
            self.entries.retain(|e| e.1 > 0.0);
        }

        fn highest(&self) -> Option<CharacterId> {
            self.entries
                .iter()
                .max_by(|a, b| a.1.total_cmp(&b.1).then(b.2.cmp(&a.2)))
                .map(|e| e.0)
        }
    }

    #[test]
    fn matches_naive_model() {
        let mut rng = AgentRng::new(42, CharacterId(0));
        let mut mgr = AggroMgr::new(AggroDecay::ByValue { per_second: 1.0 });
        let mut naive = Naive { entries: Vec::new(), seq: 0 };

        for _ in 0..2_000 {
            match rng.gen_range(0..4u32) {
                0 | 1 => {
                    let target = CharacterId(rng.gen_range(0..12));
                    // Whole numbers keep both sides exact.
                    let amount = rng.gen_range(-5..20) as f64;
                    mgr.add_aggro(target, amount);
                    naive.add(target, amount);
                }
                2 => {
                    mgr.update(Millis::from_secs(1));
                    naive.decay(1.0);
                }
                _ => {
                    let target = CharacterId(rng.gen_range(0..12));
                    mgr.remove(target);
                    naive.entries.retain(|e| e.0 != target);
                }
            }
            assert_eq!(mgr.len(), naive.entries.len());
            assert_eq!(mgr.highest_entry().map(|e| e.target), naive.highest());
        }
    }
}
