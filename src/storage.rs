//! K-mer membership/count storage backends (spec.md §4.3).

pub mod bit;
pub mod byte;
pub mod hashset;
pub mod nibble;
pub mod partitioned;
pub mod qf;

pub use bit::BitStorage;
pub use byte::ByteStorage;
pub use hashset::HashSetStorage;
pub use nibble::NibbleStorage;
pub use partitioned::PartitionedStorage;
pub use qf::QfStorage;

use std::io::{Read, Write};

use crate::error::{CoreError, Result};

/// A k-mer membership/count sketch, exact or probabilistic depending on the
/// implementor.
pub trait Storage {
    /// Record one occurrence of `key`. Returns true iff this is the first
    /// time `key` has been observed by this storage.
    fn insert(&mut self, key: u64) -> bool;

    /// Record one occurrence and return the count after insertion
    /// (saturating for fixed-width counters).
    fn insert_and_query(&mut self, key: u64) -> u64;

    /// Current count for `key` (0 if never inserted).
    fn query(&self, key: u64) -> u64;

    /// Number of distinct keys this storage believes it has seen.
    fn n_unique_kmers(&self) -> u64;

    /// Number of occupied slots in the underlying table(s) — a measure of
    /// saturation, not identical to `n_unique_kmers` for probabilistic
    /// backends.
    fn n_occupied(&self) -> u64;

    fn reset(&mut self);
}

/// Tag byte identifying a storage variant in the persisted-state header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageTag {
    Bit = 0,
    Byte = 1,
    Nibble = 2,
    Qf = 3,
    HashSet = 4,
}

const MAGIC: &[u8; 4] = b"DBGC";
const VERSION: u8 = 1;

/// Fixed persisted-state header: magic, version, storage tag, K, then a
/// variant-specific body (spec.md §6 "Persistent state layout").
pub(crate) fn write_header<W: Write>(w: &mut W, tag: StorageTag, k: u32) -> Result<()> {
    w.write_all(MAGIC).map_err(io_err)?;
    w.write_all(&[VERSION, tag as u8]).map_err(io_err)?;
    w.write_all(&k.to_le_bytes()).map_err(io_err)?;
    Ok(())
}

pub(crate) fn read_header<R: Read>(r: &mut R, expected: StorageTag) -> Result<u32> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(io_err)?;
    if &magic != MAGIC {
        return Err(CoreError::FileFormat("bad magic".to_string()));
    }
    let mut rest = [0u8; 2];
    r.read_exact(&mut rest).map_err(io_err)?;
    if rest[0] != VERSION {
        return Err(CoreError::FileFormat(format!(
            "unsupported version {}",
            rest[0]
        )));
    }
    if rest[1] != expected as u8 {
        return Err(CoreError::FileFormat(format!(
            "storage tag mismatch: expected {}, found {}",
            expected as u8, rest[1]
        )));
    }
    let mut k_bytes = [0u8; 4];
    r.read_exact(&mut k_bytes).map_err(io_err)?;
    Ok(u32::from_le_bytes(k_bytes))
}

fn io_err(e: std::io::Error) -> CoreError {
    CoreError::FileFormat(e.to_string())
}

/// Implemented by every concrete storage so the CLI's `--save-state`/
/// `--load-state` flags work uniformly.
pub trait Persistent: Sized {
    fn save(&self, path: &std::path::Path) -> Result<()>;
    fn load(path: &std::path::Path) -> Result<Self>;
}
