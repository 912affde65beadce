//! The de Bruijn graph membership/count structure: a `Storage` driven by a
//! rolling `ShiftPolicy` (spec.md §2 `dBG<S,Sh>`, §4.6).

use crate::error::Result;
use crate::hashing::value::{HashValue, Minimizer};
use crate::hashing::{KmerIterator, ShiftPolicy};
use crate::storage::{PartitionedStorage, Storage};

/// Combines a k-mer count/membership sketch with the rolling hash used to
/// walk a sequence's k-mers in O(1) per step.
pub struct Dbg<S: Storage, P: ShiftPolicy + Clone> {
    storage: S,
    policy: P,
}

impl<S: Storage, P: ShiftPolicy + Clone> Dbg<S, P> {
    pub fn new(storage: S, policy: P) -> Self {
        Self { storage, policy }
    }

    pub fn k(&self) -> usize {
        self.policy.k()
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Insert every k-mer of `seq`; returns the number of k-mers inserted.
    pub fn insert_sequence(&mut self, seq: &[u8]) -> Result<usize> {
        let mut n = 0;
        for hash in KmerIterator::new(seq, self.policy.clone()) {
            self.storage.insert(hash?.storage_key());
            n += 1;
        }
        Ok(n)
    }

    /// Count for every k-mer of `seq`, in order.
    pub fn query_sequence(&self, seq: &[u8]) -> Result<Vec<u64>> {
        KmerIterator::new(seq, self.policy.clone())
            .map(|h| h.map(|hash| self.storage.query(hash.storage_key())))
            .collect()
    }

    /// Consume a caller-built hash stream (e.g. a `HashExtender` probe) and
    /// insert each hash directly, without re-deriving it from a sequence.
    pub fn build_from_iterator<I>(&mut self, iter: I) -> Result<usize>
    where
        I: Iterator<Item = Result<P::Hash>>,
    {
        let mut n = 0;
        for hash in iter {
            self.storage.insert(hash?.storage_key());
            n += 1;
        }
        Ok(n)
    }
}

/// A dBG partitioned by unikmer minimizer, per goetia's `include/boink/pdbg.hh`.
/// Each k-mer's minimizer selects which partition's table it lands in,
/// trading a single large table for many independent small ones.
pub struct PartitionedDbg<S: Storage, P: ShiftPolicy<Hash = crate::hashing::Unikmer<H>> + Clone, H: HashValue>
{
    storage: PartitionedStorage<S>,
    policy: P,
    _hash: std::marker::PhantomData<H>,
}

impl<S, P, H> PartitionedDbg<S, P, H>
where
    S: Storage,
    P: ShiftPolicy<Hash = crate::hashing::Unikmer<H>> + Clone,
    H: HashValue,
{
    pub fn new(storage: PartitionedStorage<S>, policy: P) -> Self {
        Self {
            storage,
            policy,
            _hash: std::marker::PhantomData,
        }
    }

    pub fn k(&self) -> usize {
        self.policy.k()
    }

    pub fn n_partitions(&self) -> u32 {
        self.storage.n_partitions()
    }

    pub fn insert_sequence(&mut self, seq: &[u8]) -> Result<usize> {
        let mut n = 0;
        for hash in KmerIterator::new(seq, self.policy.clone()) {
            let hash = hash?;
            let Minimizer { partition, .. } = hash.minimizer;
            self.storage.insert(partition, hash.storage_key());
            n += 1;
        }
        Ok(n)
    }

    pub fn query_sequence(&self, seq: &[u8]) -> Result<Vec<u64>> {
        KmerIterator::new(seq, self.policy.clone())
            .map(|h| {
                h.map(|hash| {
                    let Minimizer { partition, .. } = hash.minimizer;
                    self.storage.query(partition, hash.storage_key())
                })
            })
            .collect()
    }
}
