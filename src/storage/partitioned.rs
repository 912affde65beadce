//! Wraps one `Storage` per UKHS partition, routing each key by the
//! partition its minimizer selected (spec.md §4.3, §4.4).

use crate::storage::Storage;

/// A table per partition. Unlike the single-key `Storage` trait, every
/// operation here takes the partition id alongside the key, since that's
/// the only way the caller and the storage can agree on which table to use.
pub struct PartitionedStorage<S> {
    tables: Vec<S>,
}

impl<S: Storage> PartitionedStorage<S> {
    pub fn new<F: FnMut(u32) -> S>(n_partitions: u32, mut make: F) -> Self {
        Self {
            tables: (0..n_partitions).map(&mut make).collect(),
        }
    }

    pub fn n_partitions(&self) -> u32 {
        self.tables.len() as u32
    }

    fn table(&self, partition: u32) -> &S {
        &self.tables[partition as usize]
    }

    fn table_mut(&mut self, partition: u32) -> &mut S {
        &mut self.tables[partition as usize]
    }

    pub fn insert(&mut self, partition: u32, key: u64) -> bool {
        self.table_mut(partition).insert(key)
    }

    pub fn insert_and_query(&mut self, partition: u32, key: u64) -> u64 {
        self.table_mut(partition).insert_and_query(key)
    }

    pub fn query(&self, partition: u32, key: u64) -> u64 {
        self.table(partition).query(key)
    }

    pub fn n_unique_kmers(&self) -> u64 {
        self.tables.iter().map(|t| t.n_unique_kmers()).sum()
    }

    pub fn n_occupied(&self) -> u64 {
        self.tables.iter().map(|t| t.n_occupied()).sum()
    }

    pub fn reset(&mut self) {
        self.tables.iter_mut().for_each(|t| t.reset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::HashSetStorage;

    #[test]
    fn routes_keys_to_the_named_partition_only() {
        let mut p = PartitionedStorage::new(4, |_| HashSetStorage::new(21));
        p.insert(2, 10);
        assert_eq!(p.query(2, 10), 1);
        assert_eq!(p.query(0, 10), 0);
    }

    #[test]
    fn aggregates_unique_counts_across_partitions() {
        let mut p = PartitionedStorage::new(3, |_| HashSetStorage::new(21));
        p.insert(0, 1);
        p.insert(1, 2);
        p.insert(2, 3);
        assert_eq!(p.n_unique_kmers(), 3);
    }
}
