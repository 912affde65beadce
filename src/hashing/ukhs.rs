//! Universal k-mer hitting set, used to partition the k-mer hash space
//! into UKHS-governed minimizer buckets (spec.md §4.4).

use crate::hashing::cyclic::CyclicHash64;

/// Immutable map from a unikmer's hash to the partition it defines.
///
/// Built once from a list of uniform-length unikmer strings; `partition_of`
/// is the hot-path lookup used by every window's minimizer search.
#[derive(Clone, Debug)]
pub struct UkhsMap {
    kprime: usize,
    /// Sorted `(hash, partition)` pairs; `partition` is the unikmer's rank
    /// in the sorted order, matching goetia's revmap construction.
    entries: Vec<(u64, u32)>,
}

impl UkhsMap {
    /// Build from a set of unikmers, all of the same length `kprime`.
    ///
    /// # Panics
    /// Panics if any unikmer's length differs from the first one's.
    pub fn new(unikmers: &[String]) -> Self {
        let kprime = unikmers.first().map(|s| s.len()).unwrap_or(0);
        let mut entries: Vec<(u64, u32)> = unikmers
            .iter()
            .map(|s| {
                assert_eq!(s.len(), kprime, "all unikmers must share one length");
                let mut h = CyclicHash64::new(kprime);
                for &b in s.as_bytes() {
                    h.eat(b);
                }
                h.get()
            })
            .enumerate()
            .map(|(i, hash)| (hash, i as u32))
            .collect();
        entries.sort_unstable_by_key(|&(hash, _)| hash);
        Self { kprime, entries }
    }

    pub fn kprime(&self) -> usize {
        self.kprime
    }

    pub fn n_partitions(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Partition id for a unikmer hash, or `None` if it isn't a member of
    /// the set.
    ///
    /// goetia's `query_revmap` walks a sorted array and stops the binary
    /// search with a strict `>` comparison on the upper bound, which can
    /// skip the last element when the target is the array's maximum value
    /// (spec.md §9, "Open questions"). This uses `>=` for the upper bound
    /// so the final element is reachable.
    pub fn partition_of(&self, hash: u64) -> Option<u32> {
        let mut lo = 0usize;
        let mut hi = self.entries.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (mid_hash, _) = self.entries[mid];
            if mid_hash >= hash {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        if lo < self.entries.len() && self.entries[lo].0 == hash {
            Some(self.entries[lo].1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> UkhsMap {
        UkhsMap::new(&[
            "AAAA".to_string(),
            "CCCC".to_string(),
            "GGGG".to_string(),
            "TTTT".to_string(),
        ])
    }

    #[test]
    fn known_unikmers_resolve_to_some_partition() {
        let map = build();
        assert_eq!(map.n_partitions(), 4);
        let mut h = CyclicHash64::new(4);
        for &b in b"GGGG" {
            h.eat(b);
        }
        assert!(map.partition_of(h.get()).is_some());
    }

    #[test]
    fn unknown_hash_is_none() {
        let map = build();
        assert_eq!(map.partition_of(0xDEAD_BEEF_DEAD_BEEF), None);
    }

    #[test]
    fn maximum_hash_in_set_is_still_reachable() {
        let map = build();
        let max_hash = map.entries.last().unwrap().0;
        assert!(map.partition_of(max_hash).is_some());
    }
}
