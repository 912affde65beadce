//! Single-base-at-a-time unitig walking over a `Dbg` (spec.md §4.7).
//!
//! Mirrors goetia's `UnitigWalker`/`WalkImpl` (`include/goetia/traversal/
//! unitig_walker.hh`), including the two states (`StopMasked`, `GraphError`)
//! the distilled spec table dropped but the walker still needs to report.

use std::collections::HashSet;

use crate::error::Result;
use crate::hashing::value::HashValue;
use crate::hashing::{HashExtender, ShiftPolicy};
use crate::storage::Storage;

/// Why a walk in one direction stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalState {
    /// Committed a step; the walk continues.
    Step,
    /// No present neighbor going forward: a tip.
    StopFwd,
    /// More than one present neighbor going forward: a decision k-mer.
    DecisionFwd,
    /// More than one present neighbor going backward: a decision k-mer.
    DecisionBkw,
    /// Stepped onto a k-mer already visited by this walk: a circular unitig.
    StopSeen,
    /// The next k-mer is present in the graph but masked out of this walk.
    StopMasked,
    /// A caller-supplied stop predicate fired.
    StopCallback,
    /// The seed itself is absent from the graph.
    BadSeed,
    /// An invariant the walker relies on (e.g. a present k-mer with zero
    /// extensions) was violated; indicates storage/graph corruption.
    GraphError,
}

/// The result of walking from a seed to both of its ends.
#[derive(Clone, Debug)]
pub struct Walk {
    /// The full sequence, seed included, left-extension prepended and
    /// right-extension appended.
    pub sequence: Vec<u8>,
    pub head_state: TraversalState,
    pub tail_state: TraversalState,
}

impl Walk {
    /// The first k-mer of the walked sequence.
    pub fn head(&self, k: usize) -> &[u8] {
        &self.sequence[..k]
    }

    /// The last k-mer of the walked sequence.
    pub fn tail(&self, k: usize) -> &[u8] {
        &self.sequence[self.sequence.len() - k..]
    }

    /// Join this walk with another by their shared boundary, assuming
    /// `self.tail(k) == other.head(k)`. Used when two half-walks meet.
    pub fn glue(mut self, other: Walk, k: usize) -> Vec<u8> {
        self.sequence.extend_from_slice(&other.sequence[k - 1..]);
        self.sequence
    }
}

/// Drives a `HashExtender` one base at a time over a `Dbg`'s storage,
/// classifying each step by in/out degree.
pub struct UnitigWalker<'a, S: Storage, P: ShiftPolicy + Clone> {
    storage: &'a S,
}

impl<'a, S: Storage, P: ShiftPolicy + Clone> UnitigWalker<'a, S, P> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Present neighbors (hash already inserted in `storage`) to the right.
    pub fn get_right_neighbors(&self, extender: &HashExtender<P>) -> Vec<(u8, P::Hash)> {
        extender
            .right_extensions()
            .into_iter()
            .filter(|(_, h)| self.storage.query(h.storage_key()) > 0)
            .collect()
    }

    /// Present neighbors (hash already inserted in `storage`) to the left.
    pub fn get_left_neighbors(&self, extender: &HashExtender<P>) -> Vec<(u8, P::Hash)> {
        extender
            .left_extensions()
            .into_iter()
            .filter(|(_, h)| self.storage.query(h.storage_key()) > 0)
            .collect()
    }

    /// Out-degree of the extender's current k-mer.
    pub fn out_degree(&self, extender: &HashExtender<P>) -> usize {
        self.get_right_neighbors(extender).len()
    }

    /// In-degree of the extender's current k-mer.
    pub fn in_degree(&self, extender: &HashExtender<P>) -> usize {
        self.get_left_neighbors(extender).len()
    }

    /// Re-filter a previously-computed candidate list against `storage`
    /// (spec.md §4.10 step 2, "filter neighborhoods"): a candidate gathered
    /// before a read's later k-mers were inserted may no longer — or may
    /// now — reflect what's actually present, so callers that cache
    /// extensions across multiple insertions re-check them through here
    /// rather than trusting the first pass.
    pub fn filter_nodes(&self, candidates: &[(u8, P::Hash)]) -> Vec<(u8, P::Hash)> {
        candidates
            .iter()
            .copied()
            .filter(|(_, h)| self.storage.query(h.storage_key()) > 0)
            .collect()
    }

    /// Present right-neighbors of the extender's current k-mer that are
    /// themselves decision k-mers (in- or out-degree greater than one),
    /// i.e. branches that lead directly into another junction rather than
    /// into a run of non-branching sequence.
    pub fn get_decision_neighbors(&self, extender: &HashExtender<P>) -> Vec<(u8, P::Hash)> {
        self.get_right_neighbors(extender)
            .into_iter()
            .filter(|&(base, _)| {
                let mut probe = extender.clone();
                if probe.shift_right(base).is_err() {
                    return false;
                }
                self.out_degree(&probe) > 1 || self.in_degree(&probe) > 1
            })
            .collect()
    }

    /// Try to commit one step to the right, classifying the attempt.
    ///
    /// On `Step`, `extender`'s cursor has moved; on any other state it is
    /// left untouched.
    pub fn step_right(
        &self,
        extender: &mut HashExtender<P>,
        masking: Option<&HashSet<u64>>,
        visited: &mut HashSet<u64>,
    ) -> Result<(TraversalState, Option<u8>)> {
        let neighbors = self.get_right_neighbors(extender);
        match neighbors.len() {
            0 => Ok((TraversalState::StopFwd, None)),
            1 => {
                let (base, hash) = neighbors[0];
                let key = hash.storage_key();
                if masking.is_some_and(|m| m.contains(&key)) {
                    return Ok((TraversalState::StopMasked, None));
                }
                if visited.contains(&key) {
                    return Ok((TraversalState::StopSeen, None));
                }
                extender.shift_right(base)?;
                visited.insert(key);
                Ok((TraversalState::Step, Some(base)))
            }
            _ => Ok((TraversalState::DecisionFwd, None)),
        }
    }

    /// Try to commit one step to the left, classifying the attempt.
    pub fn step_left(
        &self,
        extender: &mut HashExtender<P>,
        masking: Option<&HashSet<u64>>,
        visited: &mut HashSet<u64>,
    ) -> Result<(TraversalState, Option<u8>)> {
        let neighbors = self.get_left_neighbors(extender);
        match neighbors.len() {
            0 => Ok((TraversalState::StopFwd, None)),
            1 => {
                let (base, hash) = neighbors[0];
                let key = hash.storage_key();
                if masking.is_some_and(|m| m.contains(&key)) {
                    return Ok((TraversalState::StopMasked, None));
                }
                if visited.contains(&key) {
                    return Ok((TraversalState::StopSeen, None));
                }
                extender.shift_left(base)?;
                visited.insert(key);
                Ok((TraversalState::Step, Some(base)))
            }
            _ => Ok((TraversalState::DecisionBkw, None)),
        }
    }

    /// Walk right from `extender`'s current position, appending committed
    /// bases to a fresh buffer, until a non-`Step` state or `max_len` is hit.
    pub fn walk_right(
        &self,
        extender: &mut HashExtender<P>,
        masking: Option<&HashSet<u64>>,
        max_len: usize,
    ) -> Result<(Vec<u8>, TraversalState)> {
        let mut visited = HashSet::new();
        if let Ok(h) = extender.get() {
            visited.insert(h.storage_key());
        }
        let mut out = Vec::new();
        loop {
            if out.len() >= max_len {
                return Ok((out, TraversalState::StopCallback));
            }
            let (state, base) = self.step_right(extender, masking, &mut visited)?;
            match (state, base) {
                (TraversalState::Step, Some(b)) => out.push(b),
                (other, _) => return Ok((out, other)),
            }
        }
    }

    /// Walk left from `extender`'s current position, prepending committed
    /// bases, until a non-step state or `max_len` is hit.
    pub fn walk_left(
        &self,
        extender: &mut HashExtender<P>,
        masking: Option<&HashSet<u64>>,
        max_len: usize,
    ) -> Result<(Vec<u8>, TraversalState)> {
        let mut visited = HashSet::new();
        if let Ok(h) = extender.get() {
            visited.insert(h.storage_key());
        }
        let mut out = Vec::new();
        loop {
            if out.len() >= max_len {
                return Ok((out, TraversalState::StopCallback));
            }
            let neighbors = self.get_left_neighbors(extender);
            match neighbors.len() {
                0 => return Ok((out, TraversalState::StopFwd)),
                1 => {
                    let (base, hash) = neighbors[0];
                    let key = hash.storage_key();
                    if masking.is_some_and(|m| m.contains(&key)) {
                        return Ok((out, TraversalState::StopMasked));
                    }
                    if visited.contains(&key) {
                        return Ok((out, TraversalState::StopSeen));
                    }
                    extender.shift_left(base)?;
                    visited.insert(key);
                    out.insert(0, base);
                }
                _ => return Ok((out, TraversalState::DecisionBkw)),
            }
        }
    }

    /// Walk both directions from a present seed k-mer and report the full
    /// unitig plus the state each end stopped on.
    pub fn walk(
        &self,
        extender: &mut HashExtender<P>,
        masking: Option<&HashSet<u64>>,
        max_len: usize,
    ) -> Result<Walk> {
        let seed_hash = extender.get()?;
        if self.storage.query(seed_hash.storage_key()) == 0 {
            return Ok(Walk {
                sequence: Vec::new(),
                head_state: TraversalState::BadSeed,
                tail_state: TraversalState::BadSeed,
            });
        }
        let seed_kmer = extender.current_kmer();
        let (left, head_state) = self.walk_left(extender, masking, max_len)?;

        // walk_left has moved the cursor; reset it to the seed before
        // walking right, since the two directions are independent passes.
        extender.set_cursor(&seed_kmer)?;
        let (right, tail_state) = self.walk_right(extender, masking, max_len)?;

        let mut sequence = left;
        sequence.extend_from_slice(&seed_kmer);
        sequence.extend_from_slice(&right);
        Ok(Walk {
            sequence,
            head_state,
            tail_state,
        })
    }
}

/// Bounded breadth-first search for the shortest forward path (in bases)
/// between two k-mers present in `storage`, mirroring goetia's
/// `include/goetia/traversal/breadth_first.hh`. Only right-extensions are
/// followed, matching that implementation's directed search; returns `None`
/// if `goal` is unreached within `max_dist` steps.
pub fn bfs_distance<S: Storage, P: ShiftPolicy + Clone>(
    storage: &S,
    policy: P,
    start: &[u8],
    goal: &[u8],
    max_dist: usize,
) -> Result<Option<usize>>
where
    P::Hash: HashValue,
{
    let walker: UnitigWalker<S, P> = UnitigWalker::new(storage);
    let mut extender = HashExtender::new(crate::hashing::HashShifter::new(policy));
    let start_hash = extender.set_cursor(start)?;
    if storage.query(start_hash.storage_key()) == 0 {
        return Ok(None);
    }
    let goal_hash = {
        let mut probe = extender.clone();
        probe.set_cursor(goal)?.storage_key()
    };
    if start_hash.storage_key() == goal_hash {
        return Ok(Some(0));
    }

    let mut visited = HashSet::new();
    visited.insert(start_hash.storage_key());
    let mut frontier = std::collections::VecDeque::new();
    frontier.push_back((extender, 0usize));

    while let Some((cur, dist)) = frontier.pop_front() {
        if dist >= max_dist {
            continue;
        }
        for (base, hash) in walker.get_right_neighbors(&cur) {
            let key = hash.storage_key();
            if key == goal_hash {
                return Ok(Some(dist + 1));
            }
            if visited.insert(key) {
                let mut next = cur.clone();
                next.shift_right(base)?;
                frontier.push_back((next, dist + 1));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{FwdLemire, HashShifter};
    use crate::storage::{HashSetStorage, Storage as _};

    fn insert_all_kmers(storage: &mut HashSetStorage, seq: &[u8], k: usize) {
        let mut shifter = HashShifter::new(FwdLemire::new(k));
        let mut h = shifter.hash_base(&seq[..k]).unwrap();
        storage.insert(h.0);
        for &c in &seq[k..] {
            h = shifter.shift_right(c).unwrap();
            storage.insert(h.0);
        }
    }

    #[test]
    fn straight_unitig_walks_right_to_a_tip() {
        let k = 4;
        let seq = b"ACGTACGTT";
        let mut storage = HashSetStorage::new(k as u32);
        insert_all_kmers(&mut storage, seq, k);

        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(&seq[..k]).unwrap();
        let (tail, state) = walker.walk_right(&mut extender, None, 100).unwrap();
        assert_eq!(state, TraversalState::StopFwd);
        assert_eq!(tail, seq[k..].to_vec());
    }

    #[test]
    fn seed_absent_from_storage_reports_bad_seed() {
        let k = 4;
        let storage = HashSetStorage::new(k as u32);
        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(b"ACGT").unwrap();
        let walk = walker.walk(&mut extender, None, 100).unwrap();
        assert_eq!(walk.head_state, TraversalState::BadSeed);
    }

    #[test]
    fn branching_point_reports_decision_fwd() {
        let k = 3;
        let mut storage = HashSetStorage::new(k as u32);
        // AAC -> ACG and AAC -> ACT: two right extensions from "AAC".
        insert_all_kmers(&mut storage, b"AAACG", k);
        insert_all_kmers(&mut storage, b"AAACT", k);

        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(b"AAC").unwrap();
        let mut visited = HashSet::new();
        visited.insert(extender.get().unwrap().0);
        let (state, base) = walker.step_right(&mut extender, None, &mut visited).unwrap();
        assert_eq!(state, TraversalState::DecisionFwd);
        assert_eq!(base, None);
    }

    #[test]
    fn step_left_commits_a_single_neighbor_as_a_step() {
        let k = 4;
        let seq = b"ACGTACGTT";
        let mut storage = HashSetStorage::new(k as u32);
        insert_all_kmers(&mut storage, seq, k);

        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(&seq[seq.len() - k..]).unwrap();
        let mut visited = HashSet::new();
        visited.insert(extender.get().unwrap().0);
        let (state, base) = walker.step_left(&mut extender, None, &mut visited).unwrap();
        assert_eq!(state, TraversalState::Step);
        assert!(base.is_some());
    }

    #[test]
    fn bfs_distance_counts_bases_between_two_kmers() {
        let k = 4;
        let seq = b"ACGTACGTT";
        let mut storage = HashSetStorage::new(k as u32);
        insert_all_kmers(&mut storage, seq, k);

        let dist = bfs_distance(&storage, FwdLemire::new(k), &seq[..k], &seq[3..3 + k], 10)
            .unwrap()
            .unwrap();
        assert_eq!(dist, 3);
    }

    #[test]
    fn filter_nodes_drops_candidates_absent_from_storage() {
        let k = 4;
        let mut storage = HashSetStorage::new(k as u32);
        insert_all_kmers(&mut storage, b"ACGTACGTT", k);
        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(b"ACGT").unwrap();
        let all_four = extender.right_extensions();
        assert_eq!(all_four.len(), 4);
        let present = walker.filter_nodes(&all_four);
        assert_eq!(present.len(), 1);
    }

    #[test]
    fn get_decision_neighbors_finds_a_branch_leading_into_a_junction() {
        let k = 3;
        let mut storage = HashSetStorage::new(k as u32);
        // "AAC" -> "ACG" is itself a decision k-mer (ACG -> CGT, ACG -> CGA).
        insert_all_kmers(&mut storage, b"AAACGT", k);
        insert_all_kmers(&mut storage, b"AAACGA", k);

        let walker: UnitigWalker<_, FwdLemire> = UnitigWalker::new(&storage);
        let mut extender = HashExtender::new(HashShifter::new(FwdLemire::new(k)));
        extender.set_cursor(b"AAC").unwrap();
        let decision_neighbors = walker.get_decision_neighbors(&extender);
        assert_eq!(decision_neighbors.len(), 1);
    }

    #[test]
    fn bfs_distance_reports_none_when_unreachable() {
        let k = 4;
        let mut storage = HashSetStorage::new(k as u32);
        insert_all_kmers(&mut storage, b"ACGTACGT", k);
        let dist = bfs_distance(&storage, FwdLemire::new(k), b"ACGT", b"TTTT", 10).unwrap();
        assert_eq!(dist, None);
    }
}
