//! Streaming cDBG construction: insert a read's k-mers, promote any
//! disturbed k-mer with more than one neighbor to a decision node, and fold
//! the resulting unitig(s) into the arena (spec.md §4.10, §5).

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cdbg::{Cdbg, UNodeId};
use crate::dbg::Dbg;
use crate::error::Result;
use crate::hashing::value::HashValue;
use crate::hashing::{HashExtender, HashShifter, ShiftPolicy};
use crate::storage::Storage;
use crate::traversal::{TraversalState, UnitigWalker, Walk};

/// Runtime parameters for a `StreamingCompactor` (spec.md §6 "Runtime
/// parameters"), with a `clap::Args` counterpart in `cli::opts`.
#[derive(Clone, Debug)]
pub struct CompactorConfig {
    pub k: usize,
    /// Caps a single walk so a pathological (or adversarial) input can't
    /// make one read's compaction step unbounded.
    pub max_unitig_len: usize,
}

impl Default for CompactorConfig {
    fn default() -> Self {
        Self {
            k: 21,
            max_unitig_len: 1_000_000,
        }
    }
}

/// Per-run counters, aggregated across parallel workers the way the
/// teacher's `cli::counters` structs are (`Default` + manual `AddAssign`).
#[derive(Clone, Copy, Debug, Default)]
pub struct CompactorStats {
    pub reads_processed: u64,
    pub kmers_inserted: u64,
    pub dnodes_tagged: u64,
    pub unodes_built: u64,
    pub unodes_extended: u64,
    pub unodes_merged: u64,
}

impl std::ops::AddAssign for CompactorStats {
    fn add_assign(&mut self, other: Self) {
        self.reads_processed += other.reads_processed;
        self.kmers_inserted += other.kmers_inserted;
        self.dnodes_tagged += other.dnodes_tagged;
        self.unodes_built += other.unodes_built;
        self.unodes_extended += other.unodes_extended;
        self.unodes_merged += other.unodes_merged;
    }
}

/// A dead-end on a walk's end: no neighbor to account for, whether because
/// the graph genuinely stops there, the seed was absent, or a masking set
/// blocked the step.
fn is_dead_end(state: TraversalState) -> bool {
    matches!(
        state,
        TraversalState::StopFwd | TraversalState::BadSeed | TraversalState::StopMasked
    )
}

/// Drives a `Dbg` and a `Cdbg` together: every processed read inserts its
/// k-mers, finds any decision k-mers it newly creates, and walks the
/// resulting unitigs into the arena.
pub struct StreamingCompactor<S: Storage, P: ShiftPolicy + Clone> {
    dbg: Mutex<Dbg<S, P>>,
    cdbg: Mutex<Cdbg>,
    config: CompactorConfig,
}

impl<S, P> StreamingCompactor<S, P>
where
    S: Storage,
    P: ShiftPolicy + Clone,
    P::Hash: HashValue,
{
    pub fn new(dbg: Dbg<S, P>, config: CompactorConfig) -> Self {
        Self {
            dbg: Mutex::new(dbg),
            cdbg: Mutex::new(Cdbg::new()),
            config,
        }
    }

    pub fn cdbg(&self) -> &Mutex<Cdbg> {
        &self.cdbg
    }

    /// Borrow both halves at once, for callers (like the CLI's
    /// `--report-component-sizes` diagnostic) that need the dBG's storage
    /// and policy without consuming the compactor.
    pub fn parts(&self) -> (&Mutex<Dbg<S, P>>, &Mutex<Cdbg>) {
        (&self.dbg, &self.cdbg)
    }

    /// Unwrap the two mutexes once no further reads will be processed.
    pub fn into_parts(self) -> (Dbg<S, P>, Cdbg) {
        (self.dbg.into_inner(), self.cdbg.into_inner())
    }

    /// The per-read update (spec.md §4.10):
    /// 1. insert every k-mer of the read into the dBG,
    /// 2. walk the read's own span, now that all of it is present, to find
    ///    any k-mer with more than one neighbor in either direction,
    /// 3. promote each such disturbed k-mer not already known to be a
    ///    decision node (an "induced" decision node),
    /// 4. if none were induced, reconstruct the maximal unitig through the
    ///    read and fold it into the arena (build/extend/merge as needed);
    /// 5. otherwise, rebuild the unitigs bordering each induced decision
    ///    node (split/clip the unitig it interrupted, build the branches
    ///    that are genuinely new);
    /// 6. all of the above run with the cDBG's mutex held for the duration
    ///    of a single read's mutation, so concurrent reads never interleave
    ///    their commits.
    pub fn process_read(&self, seq: &[u8]) -> Result<CompactorStats> {
        let k = self.config.k;
        let mut stats = CompactorStats {
            reads_processed: 1,
            ..Default::default()
        };

        let n_inserted = {
            let mut dbg = self.dbg.lock();
            dbg.insert_sequence(seq)?
        };
        stats.kmers_inserted = n_inserted as u64;

        let policy = { self.dbg.lock().policy().clone() };

        // Walk the read's own k-mers, one literal position at a time (not
        // by following the graph's single-neighbor chain, which could
        // wander past the read into already-compacted territory, or loop
        // forever around a cycle the read happens to touch).
        let mut induced = Vec::new();
        {
            let dbg = self.dbg.lock();
            let walker: UnitigWalker<S, P> = UnitigWalker::new(dbg.storage());
            let mut extender = HashExtender::new(HashShifter::new(policy.clone()));
            extender.set_cursor(&seq[..k])?;
            for &next_base in &seq[k..] {
                let out_degree = walker.out_degree(&extender);
                let in_degree = walker.in_degree(&extender);
                if out_degree > 1 || in_degree > 1 {
                    let hash = extender.get()?.storage_key();
                    let cdbg = self.cdbg.lock();
                    if cdbg.dnode_at(hash).is_none() {
                        induced.push((hash, extender.current_kmer(), in_degree, out_degree));
                    }
                }
                extender.shift_right(next_base)?;
            }
            let out_degree = walker.out_degree(&extender);
            let in_degree = walker.in_degree(&extender);
            if out_degree > 1 || in_degree > 1 {
                let hash = extender.get()?.storage_key();
                let cdbg = self.cdbg.lock();
                if cdbg.dnode_at(hash).is_none() {
                    induced.push((hash, extender.current_kmer(), in_degree, out_degree));
                }
            }
        }

        for (hash, kmer, left_degree, right_degree) in &induced {
            let mut cdbg = self.cdbg.lock();
            cdbg.build_dnode(*hash, kmer.clone(), *left_degree, *right_degree);
            stats.dnodes_tagged += 1;
        }

        if induced.is_empty() {
            self.linear_update(&policy, seq, k, &mut stats)?;
        } else {
            for (hash, kmer, _, _) in &induced {
                self.rebuild_around_decision(&policy, *hash, kmer, k, &mut stats)?;
            }
        }

        Ok(stats)
    }

    /// Step 4/6 of spec.md §4.10's no-induced-decision case: reconstruct
    /// the maximal unitig through the first k-mer of `seq` not already
    /// owned by an existing unitig, then build/extend/merge it into the
    /// arena.
    fn linear_update(&self, policy: &P, seq: &[u8], k: usize, stats: &mut CompactorStats) -> Result<()> {
        let Some(offset) = self.find_unclaimed_kmer(policy, seq, k)? else {
            // Every k-mer of this read is already part of some unitig.
            return Ok(());
        };

        let walk = {
            let dbg = self.dbg.lock();
            let walker: UnitigWalker<S, P> = UnitigWalker::new(dbg.storage());
            let mut extender = HashExtender::new(HashShifter::new(policy.clone()));
            extender.set_cursor(&seq[offset..offset + k])?;
            walker.walk(&mut extender, None, self.config.max_unitig_len)?
        };
        if walk.sequence.is_empty() {
            return Ok(());
        }

        self.fold_walk(&walk, policy, k, stats)
    }

    /// Find the byte offset of the first k-mer of `seq` that no existing
    /// unitig already claims as a tag, or `None` if every k-mer of `seq` is
    /// already compacted.
    fn find_unclaimed_kmer(&self, policy: &P, seq: &[u8], k: usize) -> Result<Option<usize>> {
        let mut shifter = HashShifter::new(policy.clone());
        let mut h = shifter.hash_base(&seq[..k])?;
        if self.cdbg.lock().unode_by_tag(h.storage_key()).is_none() {
            return Ok(Some(0));
        }
        for (i, &c) in seq[k..].iter().enumerate() {
            h = shifter.shift_right(c)?;
            if self.cdbg.lock().unode_by_tag(h.storage_key()).is_none() {
                return Ok(Some(i + 1));
            }
        }
        Ok(None)
    }

    /// Fold a freshly walked unitig into the arena: build it fresh if it
    /// doesn't overlap anything existing, extend the one unitig it grew
    /// past a tip of (spec.md §8 Scenario B), merge the (typically two)
    /// unitigs it bridged, or fall back to a clean rebuild when the
    /// overlap isn't a simple contiguous extension.
    fn fold_walk(&self, walk: &Walk, policy: &P, k: usize, stats: &mut CompactorStats) -> Result<()> {
        let tags = hash_each_kmer(policy, &walk.sequence, k)?;
        let left_hash = tags[0];
        let right_hash = *tags.last().expect("a walk has at least one k-mer");
        let left_has_neighbor = !is_dead_end(walk.head_state);
        let right_has_neighbor = !is_dead_end(walk.tail_state);

        let mut cdbg = self.cdbg.lock();
        let mut swallowed: Vec<UNodeId> = Vec::new();
        for &h in &tags {
            if let Some(id) = cdbg.unode_by_tag(h) {
                if !swallowed.contains(&id) {
                    swallowed.push(id);
                }
            }
        }

        match swallowed.as_slice() {
            [] => {
                cdbg.build_unode(
                    walk.sequence.clone(),
                    left_hash,
                    right_hash,
                    left_has_neighbor,
                    right_has_neighbor,
                    tags,
                    k,
                );
                stats.unodes_built += 1;
            }
            [only] => {
                let old = cdbg.unode(*only).expect("id came from unode_by_tag").clone();
                let overlap = (walk.sequence.len() > old.sequence.len())
                    .then(|| {
                        walk.sequence
                            .windows(old.sequence.len())
                            .position(|w| w == old.sequence.as_slice())
                    })
                    .flatten();
                match overlap {
                    Some(start) => {
                        let end = start + old.sequence.len();
                        if start > 0 {
                            let added = walk.sequence[..start].to_vec();
                            let new_tags = tags[..start].to_vec();
                            cdbg.extend_unode(*only, &added, false, left_hash, left_has_neighbor, new_tags, k);
                            stats.unodes_extended += 1;
                        }
                        if end < walk.sequence.len() {
                            let added = walk.sequence[end..].to_vec();
                            let added_tags = tags[tags.len() - (walk.sequence.len() - end)..].to_vec();
                            cdbg.extend_unode(*only, &added, true, right_hash, right_has_neighbor, added_tags, k);
                            stats.unodes_extended += 1;
                        }
                    }
                    None => {
                        cdbg.remove_unode(*only);
                        cdbg.build_unode(
                            walk.sequence.clone(),
                            left_hash,
                            right_hash,
                            left_has_neighbor,
                            right_has_neighbor,
                            tags,
                            k,
                        );
                        stats.unodes_built += 1;
                    }
                }
            }
            [a, b] => {
                if cdbg.merge_unodes(*a, *b, k, Vec::new()).is_some() {
                    stats.unodes_merged += 1;
                }
            }
            many => {
                for &id in many {
                    cdbg.remove_unode(id);
                }
                cdbg.build_unode(
                    walk.sequence.clone(),
                    left_hash,
                    right_hash,
                    left_has_neighbor,
                    right_has_neighbor,
                    tags,
                    k,
                );
                stats.unodes_merged += 1;
            }
        }
        Ok(())
    }

    /// Steps 5/6 of spec.md §4.10's case-split branch, for one induced
    /// decision k-mer `d`.
    ///
    /// If `d` was already interior to (or at the boundary of) an existing
    /// unitig, that unitig is split (or clipped) around it — this is the
    /// "original unitig deleted, two new unitigs" path of Scenario D.
    /// Any of `d`'s neighbor branches not already covered by that split
    /// are then walked out to their own tip/decision/existing-unitig end
    /// and registered as new unitigs (Scenario C).
    fn rebuild_around_decision(
        &self,
        policy: &P,
        d_hash: u64,
        d_kmer: &[u8],
        k: usize,
        stats: &mut CompactorStats,
    ) -> Result<()> {
        let split = {
            let cdbg = self.cdbg.lock();
            cdbg.unode_by_tag(d_hash).and_then(|old_id| {
                let old = cdbg.unode(old_id).expect("id came from unode_by_tag").clone();
                old.tags.iter().position(|&h| h == d_hash).map(|at| (old_id, old, at))
            })
        };

        if let Some((old_id, old, at)) = split {
            if at > 0 && at + 1 < old.tags.len() {
                let mut cdbg = self.cdbg.lock();
                if cdbg
                    .split_unode(old_id, at, k, d_hash, d_kmer.to_vec(), old.left_has_neighbor, old.right_has_neighbor)
                    .is_some()
                {
                    stats.unodes_built += 2;
                }
            } else if old.tags.len() > 1 {
                // `d` coincides with one of the unitig's own ends: shave
                // that single k-mer off so the decision node owns the
                // boundary, rather than splitting off an empty piece.
                let from_left = at == 0;
                let new_end_hash = if from_left {
                    old.tags[1]
                } else {
                    old.tags[old.tags.len() - 2]
                };
                let mut cdbg = self.cdbg.lock();
                cdbg.clip_unode(old_id, from_left, new_end_hash, true, k);
            } else {
                // The old unitig was exactly one k-mer long and *is* `d`;
                // nothing of it survives outside the decision node.
                let mut cdbg = self.cdbg.lock();
                cdbg.remove_unode(old_id);
            }
        }

        let dbg = self.dbg.lock();
        let walker: UnitigWalker<S, P> = UnitigWalker::new(dbg.storage());
        let mut seed_ext = HashExtender::new(HashShifter::new(policy.clone()));
        seed_ext.set_cursor(d_kmer)?;

        for (base, _) in walker.get_right_neighbors(&seed_ext) {
            let mut ext = HashExtender::new(HashShifter::new(policy.clone()));
            ext.set_cursor(d_kmer)?;
            let neighbor_hash = ext.shift_right(base)?.storage_key();
            if self.cdbg.lock().unode_by_tag(neighbor_hash).is_some() {
                continue;
            }
            let (tail, tail_state) = walker.walk_right(&mut ext, None, self.config.max_unitig_len)?;
            let mut sequence = d_kmer.to_vec();
            sequence.push(base);
            sequence.extend_from_slice(&tail);
            self.fold_decision_branch(policy, sequence, d_hash, tail_state, true, k, stats)?;
        }

        for (base, _) in walker.get_left_neighbors(&seed_ext) {
            let mut ext = HashExtender::new(HashShifter::new(policy.clone()));
            ext.set_cursor(d_kmer)?;
            let neighbor_hash = ext.shift_left(base)?.storage_key();
            if self.cdbg.lock().unode_by_tag(neighbor_hash).is_some() {
                continue;
            }
            let (head, head_state) = walker.walk_left(&mut ext, None, self.config.max_unitig_len)?;
            let mut sequence = head;
            sequence.push(base);
            sequence.extend_from_slice(d_kmer);
            self.fold_decision_branch(policy, sequence, d_hash, head_state, false, k, stats)?;
        }
        Ok(())
    }

    /// Build one of `d`'s branch unitigs (the side away from `d` hasn't
    /// been claimed by anything yet, or `rebuild_around_decision` wouldn't
    /// have reached here).
    fn fold_decision_branch(
        &self,
        policy: &P,
        sequence: Vec<u8>,
        d_hash: u64,
        far_state: TraversalState,
        is_right_branch: bool,
        k: usize,
        stats: &mut CompactorStats,
    ) -> Result<()> {
        let tags = hash_each_kmer(policy, &sequence, k)?;
        let (left_hash, right_hash) = if is_right_branch {
            (d_hash, *tags.last().expect("a walk has at least one k-mer"))
        } else {
            (*tags.first().expect("a walk has at least one k-mer"), d_hash)
        };
        let far_has_neighbor = !is_dead_end(far_state);
        let (left_has_neighbor, right_has_neighbor) = if is_right_branch {
            (true, far_has_neighbor)
        } else {
            (far_has_neighbor, true)
        };

        // The caller already verified (via the branch's first neighbor hash)
        // that this branch isn't built yet; `left_hash`/`right_hash` here
        // deliberately include `d_hash`, which a sibling branch or the split
        // half on the other side of `d` also carries as its facing
        // boundary, so re-checking ownership on those hashes would find the
        // sibling and wrongly skip this branch.
        let mut cdbg = self.cdbg.lock();
        cdbg.build_unode(sequence, left_hash, right_hash, left_has_neighbor, right_has_neighbor, tags, k);
        stats.unodes_built += 1;
        Ok(())
    }

    /// Insert-only pass over many reads, run concurrently (spec.md §5,
    /// "multiple reads may be processed in parallel"). The cDBG-mutation
    /// side of `process_read` stays behind `self.cdbg`'s mutex, so this is
    /// only a speedup for the dominant insert workload, not full
    /// parallel compaction.
    pub fn insert_reads_parallel(&self, reads: &[Vec<u8>]) -> Result<u64>
    where
        S: Send,
        P: Send + Sync,
    {
        reads
            .par_iter()
            .map(|seq| {
                let mut dbg = self.dbg.lock();
                dbg.insert_sequence(seq).map(|n| n as u64)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }
}

/// The real canonical hash of every k-mer in `sequence`, in order — used as
/// a unitig's `tags` and to look up which existing unitig (if any) a fresh
/// walk's k-mers already belong to.
fn hash_each_kmer<P: ShiftPolicy + Clone>(policy: &P, sequence: &[u8], k: usize) -> Result<Vec<u64>>
where
    P::Hash: HashValue,
{
    let mut shifter = HashShifter::new(policy.clone());
    let mut out = Vec::with_capacity(sequence.len() - k + 1);
    let mut h = shifter.hash_base(&sequence[..k])?;
    out.push(h.storage_key());
    for &c in &sequence[k..] {
        h = shifter.shift_right(c)?;
        out.push(h.storage_key());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::FwdLemire;
    use crate::storage::HashSetStorage;

    fn make_compactor(k: usize) -> StreamingCompactor<HashSetStorage, FwdLemire> {
        StreamingCompactor::new(
            Dbg::new(HashSetStorage::new(k as u32), FwdLemire::new(k)),
            CompactorConfig {
                k,
                max_unitig_len: 1000,
            },
        )
    }

    #[test]
    fn straight_read_builds_one_unitig() {
        let compactor = make_compactor(4);
        let stats = compactor.process_read(b"ACGTACGTT").unwrap();
        assert_eq!(stats.reads_processed, 1);
        assert!(stats.kmers_inserted > 0);
        assert_eq!(compactor.cdbg().lock().n_unodes(), 1);
    }

    #[test]
    fn second_overlapping_read_does_not_duplicate_the_unitig() {
        let compactor = make_compactor(4);
        compactor.process_read(b"ACGTACGTT").unwrap();
        compactor.process_read(b"ACGTACGTT").unwrap();
        assert_eq!(compactor.cdbg().lock().n_unodes(), 1);
    }

    #[test]
    fn a_read_extending_a_tip_grows_the_same_unitig_instead_of_duplicating_it() {
        // spec.md §8 Scenario B: k=5, insert "AACCGGTTACG" then a read that
        // extends it by one base on each side, "GAACCGGTTACGA" — the result
        // should still be exactly one unitig, now covering the longer read.
        let compactor = make_compactor(5);
        compactor.process_read(b"AACCGGTTACG").unwrap();
        assert_eq!(compactor.cdbg().lock().n_unodes(), 1);

        compactor.process_read(b"GAACCGGTTACGA").unwrap();

        let cdbg = compactor.cdbg().lock();
        assert_eq!(cdbg.n_unodes(), 1);
        let id = cdbg.unode_ids().next().unwrap();
        assert_eq!(cdbg.unode(id).unwrap().sequence, b"GAACCGGTTACGA".to_vec());
    }

    #[test]
    fn a_read_branching_off_an_existing_unitig_splits_it_around_the_decision_kmer() {
        let compactor = make_compactor(3);
        // AAC -> ACG and AAC -> ACT: "AAC" becomes a decision k-mer once both
        // reads are present.
        compactor.process_read(b"AAACG").unwrap();
        compactor.process_read(b"AAACT").unwrap();

        let cdbg = compactor.cdbg().lock();
        assert!(cdbg.n_dnodes() >= 1);
    }
}
