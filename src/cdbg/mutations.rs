//! The cDBG arena and the six local mutation primitives that keep it in
//! sync as the graph grows (spec.md §4.9, goetia's `include/boink/cdbg/cdbg.hh`).

use fxhash::FxHashMap;

use crate::cdbg::node::{classify, DNodeId, DecisionNode, NodeMeta, UNodeId, UnitigNode};

/// Id-keyed arena of unitig and decision nodes, with secondary indices from
/// a k-mer hash to the node that owns it. One `Cdbg` is shared by every
/// compaction worker behind a `parking_lot::Mutex` (see `compactor`).
#[derive(Default)]
pub struct Cdbg {
    unodes: FxHashMap<UNodeId, UnitigNode>,
    dnodes: FxHashMap<DNodeId, DecisionNode>,
    /// Maps a unitig's head/tail k-mer hash to the unitig that owns it.
    end_map: FxHashMap<u64, UNodeId>,
    /// Maps every tag hash (spec.md §3: "every tag hash maps to this unitig
    /// in `tag_map`") to the unitig that owns it.
    tag_map: FxHashMap<u64, UNodeId>,
    next_unode_id: u64,
}

impl Cdbg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_unodes(&self) -> usize {
        self.unodes.len()
    }

    pub fn n_dnodes(&self) -> usize {
        self.dnodes.len()
    }

    pub fn unode(&self, id: UNodeId) -> Option<&UnitigNode> {
        self.unodes.get(&id)
    }

    pub fn dnode(&self, id: DNodeId) -> Option<&DecisionNode> {
        self.dnodes.get(&id)
    }

    pub fn unode_ids(&self) -> impl Iterator<Item = UNodeId> + '_ {
        self.unodes.keys().copied()
    }

    pub fn dnode_ids(&self) -> impl Iterator<Item = DNodeId> + '_ {
        self.dnodes.keys().copied()
    }

    pub fn unode_at_end(&self, kmer_hash: u64) -> Option<UNodeId> {
        self.end_map.get(&kmer_hash).copied()
    }

    /// Fast membership test: which unitig (if any) a k-mer hash belongs to,
    /// whether at a boundary or in the interior (spec.md §3 "fast
    /// membership test via tags").
    pub fn unode_by_tag(&self, tag_hash: u64) -> Option<UNodeId> {
        self.tag_map.get(&tag_hash).copied()
    }

    pub fn dnode_at(&self, kmer_hash: u64) -> Option<DNodeId> {
        let id = DNodeId(kmer_hash);
        self.dnodes.contains_key(&id).then_some(id)
    }

    /// Register `kmer_hash` as a decision k-mer, creating its node the
    /// first time it's seen. Idempotent: a k-mer already tagged bumps its
    /// `count`/`dirty` bookkeeping and returns the existing id.
    pub fn build_dnode(
        &mut self,
        kmer_hash: u64,
        kmer: Vec<u8>,
        left_degree: usize,
        right_degree: usize,
    ) -> DNodeId {
        let id = DNodeId(kmer_hash);
        if let Some(existing) = self.dnodes.get_mut(&id) {
            existing.count += 1;
            existing.dirty = true;
            return id;
        }
        self.dnodes.insert(
            id,
            DecisionNode {
                id,
                kmer_sequence: kmer,
                left_degree,
                right_degree,
                count: 1,
                dirty: false,
            },
        );
        id
    }

    /// Insert a freshly walked unitig, indexing its two ends and every tag.
    #[allow(clippy::too_many_arguments)]
    pub fn build_unode(
        &mut self,
        sequence: Vec<u8>,
        left_end_hash: u64,
        right_end_hash: u64,
        left_has_neighbor: bool,
        right_has_neighbor: bool,
        tags: Vec<u64>,
        k: usize,
    ) -> UNodeId {
        let id = UNodeId(self.next_unode_id);
        self.next_unode_id += 1;
        let meta = classify(
            sequence.len(),
            k,
            left_end_hash,
            right_end_hash,
            left_has_neighbor,
            right_has_neighbor,
        );
        self.end_map.insert(left_end_hash, id);
        self.end_map.insert(right_end_hash, id);
        for &t in &tags {
            self.tag_map.insert(t, id);
        }
        self.unodes.insert(
            id,
            UnitigNode {
                id,
                sequence,
                left_end_hash,
                right_end_hash,
                tags,
                left_has_neighbor,
                right_has_neighbor,
                meta,
            },
        );
        id
    }

    /// Remove a unitig and every index entry pointing at it, returning it
    /// to the caller. Used by `split_unode`/`merge_unodes` (which replace
    /// the node they remove) and by the compactor when a freshly walked
    /// read swallows an existing unitig whole.
    pub fn remove_unode(&mut self, id: UNodeId) -> Option<UnitigNode> {
        let node = self.unodes.remove(&id)?;
        self.end_map.remove(&node.left_end_hash);
        self.end_map.remove(&node.right_end_hash);
        for tag in &node.tags {
            if self.tag_map.get(tag) == Some(&id) {
                self.tag_map.remove(tag);
            }
        }
        Some(node)
    }

    /// Shorten a unitig by one k-mer from its left or right end, because
    /// that end's own boundary k-mer has just been promoted to a decision
    /// node (spec.md §4.9 `clip_unode`). Returns `false` if the unitig is
    /// already only one k-mer long.
    pub fn clip_unode(
        &mut self,
        id: UNodeId,
        from_left: bool,
        new_end_hash: u64,
        new_end_has_neighbor: bool,
        k: usize,
    ) -> bool {
        let Some(node) = self.unodes.get_mut(&id) else {
            return false;
        };
        if node.sequence.len() <= k {
            return false;
        }
        let old_end_hash;
        let removed_tag;
        if from_left {
            old_end_hash = node.left_end_hash;
            node.sequence.remove(0);
            removed_tag = node.tags.remove(0);
            node.left_end_hash = new_end_hash;
            node.left_has_neighbor = new_end_has_neighbor;
        } else {
            old_end_hash = node.right_end_hash;
            node.sequence.pop();
            removed_tag = node.tags.pop().expect("checked len above");
            node.right_end_hash = new_end_hash;
            node.right_has_neighbor = new_end_has_neighbor;
        }
        node.meta = classify(
            node.sequence.len(),
            k,
            node.left_end_hash,
            node.right_end_hash,
            node.left_has_neighbor,
            node.right_has_neighbor,
        );
        self.end_map.remove(&old_end_hash);
        self.end_map.insert(new_end_hash, id);
        if self.tag_map.get(&removed_tag) == Some(&id) {
            self.tag_map.remove(&removed_tag);
        }
        true
    }

    /// Grow a unitig by appending (or prepending) bases, updating the
    /// affected end's boundary and tag set (spec.md §4.9 `extend_unode`).
    #[allow(clippy::too_many_arguments)]
    pub fn extend_unode(
        &mut self,
        id: UNodeId,
        bases: &[u8],
        extend_right: bool,
        new_end_hash: u64,
        new_end_has_neighbor: bool,
        new_tags: Vec<u64>,
        k: usize,
    ) -> bool {
        let Some(node) = self.unodes.get_mut(&id) else {
            return false;
        };
        let old_end_hash = if extend_right {
            node.right_end_hash
        } else {
            node.left_end_hash
        };
        if extend_right {
            node.sequence.extend_from_slice(bases);
            node.tags.extend_from_slice(&new_tags);
            node.right_end_hash = new_end_hash;
            node.right_has_neighbor = new_end_has_neighbor;
        } else {
            let mut new_seq = bases.to_vec();
            new_seq.extend_from_slice(&node.sequence);
            node.sequence = new_seq;
            let mut new_full_tags = new_tags.clone();
            new_full_tags.extend_from_slice(&node.tags);
            node.tags = new_full_tags;
            node.left_end_hash = new_end_hash;
            node.left_has_neighbor = new_end_has_neighbor;
        }
        node.meta = classify(
            node.sequence.len(),
            k,
            node.left_end_hash,
            node.right_end_hash,
            node.left_has_neighbor,
            node.right_has_neighbor,
        );
        self.end_map.remove(&old_end_hash);
        self.end_map.insert(new_end_hash, id);
        for t in new_tags {
            self.tag_map.insert(t, id);
        }
        true
    }

    /// Split a unitig around a k-mer that has just been promoted to a
    /// decision node at byte offset `at` in its interior (spec.md §4.9
    /// `split_unode`): delete the original, build two successors sharing
    /// the decision k-mer as their facing boundary, and (re-)build the
    /// decision node itself.
    #[allow(clippy::too_many_arguments)]
    pub fn split_unode(
        &mut self,
        id: UNodeId,
        at: usize,
        k: usize,
        decision_hash: u64,
        decision_kmer: Vec<u8>,
        left_has_neighbor: bool,
        right_has_neighbor: bool,
    ) -> Option<(UNodeId, UNodeId)> {
        let node = self.remove_unode(id)?;
        self.build_dnode(decision_hash, decision_kmer, 1, 1);

        let left_seq = node.sequence[..at + k].to_vec();
        let right_seq = node.sequence[at..].to_vec();
        let left_tags = node.tags[..=at].to_vec();
        let right_tags = node.tags[at..].to_vec();

        let left_id = self.build_unode(
            left_seq,
            node.left_end_hash,
            decision_hash,
            left_has_neighbor,
            true,
            left_tags,
            k,
        );
        let right_id = self.build_unode(
            right_seq,
            decision_hash,
            node.right_end_hash,
            true,
            right_has_neighbor,
            right_tags,
            k,
        );
        Some((left_id, right_id))
    }

    /// Glue two unitigs that now share an uninterrupted k-1 overlap (a
    /// decision node between them lost all but one of its alternatives)
    /// into one (spec.md §4.9 `merge_unodes`).
    pub fn merge_unodes(&mut self, a: UNodeId, b: UNodeId, k: usize, new_tags: Vec<u64>) -> Option<UNodeId> {
        let left = self.remove_unode(a)?;
        let right = self.remove_unode(b)?;

        let left_end_hash = left.left_end_hash;
        let left_has_neighbor = left.left_has_neighbor;
        let right_end_hash = right.right_end_hash;
        let right_has_neighbor = right.right_has_neighbor;

        let mut sequence = left.sequence;
        sequence.extend_from_slice(&right.sequence[k - 1..]);

        let mut tags = left.tags;
        tags.extend_from_slice(&right.tags);
        tags.extend(new_tags);

        let id = self.build_unode(
            sequence,
            left_end_hash,
            right_end_hash,
            left_has_neighbor,
            right_has_neighbor,
            tags,
            k,
        );
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_dnode_is_idempotent() {
        let mut cdbg = Cdbg::new();
        let a = cdbg.build_dnode(42, b"ACGT".to_vec(), 1, 2);
        let b = cdbg.build_dnode(42, b"ACGT".to_vec(), 1, 2);
        assert_eq!(a, b);
        assert_eq!(cdbg.n_dnodes(), 1);
        assert_eq!(cdbg.dnode(a).unwrap().count, 2);
    }

    #[test]
    fn build_dnode_id_is_the_kmer_hash() {
        let mut cdbg = Cdbg::new();
        let id = cdbg.build_dnode(42, b"ACGT".to_vec(), 1, 2);
        assert_eq!(id, DNodeId(42));
    }

    #[test]
    fn build_unode_indexes_both_ends_and_every_tag() {
        let mut cdbg = Cdbg::new();
        let id = cdbg.build_unode(
            b"ACGTACGT".to_vec(),
            1,
            2,
            true,
            true,
            vec![1, 7, 2],
            4,
        );
        assert_eq!(cdbg.unode_at_end(1), Some(id));
        assert_eq!(cdbg.unode_at_end(2), Some(id));
        assert_eq!(cdbg.unode_by_tag(7), Some(id));
        assert_eq!(cdbg.unode(id).unwrap().meta, NodeMeta::Full);
    }

    #[test]
    fn merge_unodes_joins_sequence_on_the_k_minus_one_overlap() {
        let mut cdbg = Cdbg::new();
        let a = cdbg.build_unode(b"ACGT".to_vec(), 10, 11, false, true, vec![11], 4);
        let b = cdbg.build_unode(b"CGTA".to_vec(), 11, 12, true, false, vec![12], 4);
        let merged = cdbg.merge_unodes(a, b, 4, vec![]).unwrap();
        assert_eq!(cdbg.unode(merged).unwrap().sequence, b"ACGTA".to_vec());
        assert!(cdbg.unode(a).is_none());
        assert!(cdbg.unode(b).is_none());
    }

    #[test]
    fn clip_unode_shortens_one_kmer_and_reindexes_the_end() {
        let mut cdbg = Cdbg::new();
        let id = cdbg.build_unode(b"ACGTT".to_vec(), 100, 200, false, true, vec![100, 200], 4);
        assert!(cdbg.clip_unode(id, true, 300, true, 4));
        assert_eq!(cdbg.unode(id).unwrap().sequence, b"CGTT".to_vec());
        assert_eq!(cdbg.unode_at_end(300), Some(id));
        assert!(cdbg.unode_at_end(100).is_none());
    }

    #[test]
    fn split_unode_produces_two_successors_sharing_the_decision_kmer() {
        let mut cdbg = Cdbg::new();
        // 3 k-mers (k=4): ACGT(0), CGTA(1), GTAC(2), tags indexed 0..=2.
        let id = cdbg.build_unode(
            b"ACGTAC".to_vec(),
            1,
            3,
            false,
            false,
            vec![1, 2, 3],
            4,
        );
        let (left_id, right_id) = cdbg.split_unode(id, 1, 4, 2, b"CGTA".to_vec(), false, false).unwrap();
        assert!(cdbg.unode(id).is_none());
        assert_eq!(cdbg.n_dnodes(), 1);
        assert_eq!(cdbg.unode(left_id).unwrap().sequence, b"ACGTA".to_vec());
        assert_eq!(cdbg.unode(right_id).unwrap().sequence, b"CGTAC".to_vec());
        assert_eq!(cdbg.unode(left_id).unwrap().right_end_hash, 2);
        assert_eq!(cdbg.unode(right_id).unwrap().left_end_hash, 2);
    }
}
