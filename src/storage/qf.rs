//! Counting storage over a single open-addressed table.
//!
//! This is a simplified stand-in for goetia's counting quotient filter
//! (`include/boink/storage/qfstorage.hh`, which layers quotient/remainder
//! run encoding over the table) — it keeps the same external contract
//! (saturating counts, bounded table, occupancy tracking) without the CQF's
//! rank-and-select run metadata, which nothing in this crate depends on.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::storage::{read_header, write_header, Persistent, Storage, StorageTag};

const MAX_COUNT: u16 = u16::MAX;
const EMPTY: u64 = u64::MAX;

#[derive(Clone, Debug)]
pub struct QfStorage {
    k: u32,
    slots: Vec<u64>,
    counts: Vec<u16>,
    n_unique: u64,
}

impl QfStorage {
    pub fn new(k: u32, n_slots: u64) -> Self {
        assert!(n_slots > 0);
        Self {
            k,
            slots: vec![EMPTY; n_slots as usize],
            counts: vec![0u16; n_slots as usize],
            n_unique: 0,
        }
    }

    /// Linear-probe to `key`'s slot, or the first empty slot on its probe
    /// sequence if `key` isn't present. Returns `None` if the table is full
    /// and `key` isn't in it.
    fn find_slot(&self, key: u64) -> Option<usize> {
        let n = self.slots.len();
        let start = (key % n as u64) as usize;
        for offset in 0..n {
            let idx = (start + offset) % n;
            if self.slots[idx] == key || self.slots[idx] == EMPTY {
                return Some(idx);
            }
        }
        None
    }
}

impl Storage for QfStorage {
    fn insert(&mut self, key: u64) -> bool {
        self.insert_and_query(key) == 1
    }

    fn insert_and_query(&mut self, key: u64) -> u64 {
        let Some(idx) = self.find_slot(key) else {
            return 0;
        };
        if self.slots[idx] == EMPTY {
            self.slots[idx] = key;
            self.n_unique += 1;
        }
        if self.counts[idx] < MAX_COUNT {
            self.counts[idx] += 1;
        }
        self.counts[idx] as u64
    }

    fn query(&self, key: u64) -> u64 {
        match self.find_slot(key) {
            Some(idx) if self.slots[idx] == key => self.counts[idx] as u64,
            _ => 0,
        }
    }

    fn n_unique_kmers(&self) -> u64 {
        self.n_unique
    }

    fn n_occupied(&self) -> u64 {
        self.slots.iter().filter(|&&s| s != EMPTY).count() as u64
    }

    fn reset(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = EMPTY);
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.n_unique = 0;
    }
}

impl Persistent for QfStorage {
    fn save(&self, path: &Path) -> Result<()> {
        let mut w =
            BufWriter::new(File::create(path).map_err(|e| CoreError::FileFormat(e.to_string()))?);
        write_header(&mut w, StorageTag::Qf, self.k)?;
        w.write_all(&(self.slots.len() as u64).to_le_bytes())
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        w.write_all(&self.n_unique.to_le_bytes())
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        for &slot in &self.slots {
            w.write_all(&slot.to_le_bytes())
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        }
        for &count in &self.counts {
            w.write_all(&count.to_le_bytes())
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        }
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let mut r =
            BufReader::new(File::open(path).map_err(|e| CoreError::FileFormat(e.to_string()))?);
        let k = read_header(&mut r, StorageTag::Qf)?;
        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        let n_slots = u64::from_le_bytes(buf8) as usize;
        r.read_exact(&mut buf8)
            .map_err(|e| CoreError::FileFormat(e.to_string()))?;
        let n_unique = u64::from_le_bytes(buf8);
        let mut slots = Vec::with_capacity(n_slots);
        for _ in 0..n_slots {
            r.read_exact(&mut buf8)
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
            slots.push(u64::from_le_bytes(buf8));
        }
        let mut counts = Vec::with_capacity(n_slots);
        let mut buf2 = [0u8; 2];
        for _ in 0..n_slots {
            r.read_exact(&mut buf2)
                .map_err(|e| CoreError::FileFormat(e.to_string()))?;
            counts.push(u16::from_le_bytes(buf2));
        }
        Ok(Self {
            k,
            slots,
            counts,
            n_unique,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_exact_counts_while_table_has_room() {
        let mut s = QfStorage::new(21, 64);
        s.insert_and_query(5);
        s.insert_and_query(5);
        s.insert_and_query(9);
        assert_eq!(s.query(5), 2);
        assert_eq!(s.query(9), 1);
        assert_eq!(s.n_unique_kmers(), 2);
    }

    #[test]
    fn full_table_rejects_new_keys() {
        let mut s = QfStorage::new(21, 2);
        assert_ne!(s.insert_and_query(1), 0);
        assert_ne!(s.insert_and_query(2), 0);
        // table full of two distinct keys; a third key has nowhere to land
        assert_eq!(s.insert_and_query(3), 0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qf.dbgc");
        let mut s = QfStorage::new(21, 32);
        s.insert_and_query(3);
        s.insert_and_query(3);
        s.save(&path).unwrap();
        let loaded = QfStorage::load(&path).unwrap();
        assert_eq!(loaded.query(3), 2);
    }
}
