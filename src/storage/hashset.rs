//! Exact k-mer membership/count storage, for small inputs or tests where a
//! probabilistic false-positive rate is unacceptable (spec.md §4.3).

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use fxhash::FxHashMap;

use crate::error::{CoreError, Result};
use crate::storage::{read_header, write_header, Persistent, Storage, StorageTag};

#[derive(Clone, Debug, Default)]
pub struct HashSetStorage {
    k: u32,
    counts: FxHashMap<u64, u64>,
}

impl HashSetStorage {
    pub fn new(k: u32) -> Self {
        Self {
            k,
            counts: FxHashMap::default(),
        }
    }
}

impl Storage for HashSetStorage {
    fn insert(&mut self, key: u64) -> bool {
        self.insert_and_query(key) == 1
    }

    fn insert_and_query(&mut self, key: u64) -> u64 {
        let c = self.counts.entry(key).or_insert(0);
        *c += 1;
        *c
    }

    fn query(&self, key: u64) -> u64 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    fn n_unique_kmers(&self) -> u64 {
        self.counts.len() as u64
    }

    fn n_occupied(&self) -> u64 {
        self.counts.len() as u64
    }

    fn reset(&mut self) {
        self.counts.clear();
    }
}

impl Persistent for HashSetStorage {
    fn save(&self, path: &Path) -> Result<()> {
        let mut w =
            BufWriter::new(File::create(path).map_err(|e| CoreError::FileFormat(e.to_string()))?);
        write_header(&mut w, StorageTag::HashSet, self.k)?;
        w.write_all(&(self.counts.len() as u64).to_le_bytes())
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        for (key, count) in &self.counts {
            w.write_all(&key.to_le_bytes())
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
            w.write_all(&count.to_le_bytes())
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        }
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let mut r =
            BufReader::new(File::open(path).map_err(|e| CoreError::FileFormat(e.to_string()))?);
        let k = read_header(&mut r, StorageTag::HashSet)?;
        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        let n = u64::from_le_bytes(buf8);
        let mut counts = FxHashMap::default();
        counts.reserve(n as usize);
        for _ in 0..n {
            r.read_exact(&mut buf8)
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
            let key = u64::from_le_bytes(buf8);
            r.read_exact(&mut buf8)
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
            let count = u64::from_le_bytes(buf8);
            counts.insert(key, count);
        }
        Ok(Self { k, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_exact() {
        let mut s = HashSetStorage::new(21);
        for _ in 0..5 {
            s.insert_and_query(1);
        }
        assert_eq!(s.query(1), 5);
        assert_eq!(s.n_unique_kmers(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashset.dbgc");
        let mut s = HashSetStorage::new(21);
        s.insert_and_query(100);
        s.insert_and_query(200);
        s.insert_and_query(200);
        s.save(&path).unwrap();
        let loaded = HashSetStorage::load(&path).unwrap();
        assert_eq!(loaded.query(100), 1);
        assert_eq!(loaded.query(200), 2);
        assert_eq!(loaded.n_unique_kmers(), 2);
    }
}
