//! Hash-value types produced by the various shifter policies (spec.md §4.4).

/// Anything that can be reduced to the 64-bit key a `Storage` indexes by.
pub trait HashValue: Copy + Eq + std::hash::Hash {
    fn storage_key(&self) -> u64;
}

/// A single forward-strand hash (spec.md §4.2 `FwdLemire`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fwd(pub u64);

impl HashValue for Fwd {
    #[inline]
    fn storage_key(&self) -> u64 {
        self.0
    }
}

/// A canonical hash: the forward hash, the reverse-complement hash, and the
/// min of the two as the strand-independent storage key (spec.md §4.2
/// `CanLemire`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Can {
    pub fwd: u64,
    pub rc: u64,
}

impl Can {
    #[inline]
    pub fn value(&self) -> u64 {
        self.fwd.min(self.rc)
    }

    /// True iff the forward strand is the canonical representative.
    #[inline]
    pub fn is_fwd_canonical(&self) -> bool {
        self.fwd <= self.rc
    }
}

impl HashValue for Can {
    #[inline]
    fn storage_key(&self) -> u64 {
        self.value()
    }
}

/// A unikmer minimizer: the hash of the minimizing k'-window plus the
/// partition it maps to (spec.md §4.4 `UkhsMap`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Minimizer {
    pub hash: u64,
    pub partition: u32,
}

/// A k-mer hash paired with the minimizer that selected its partition
/// (spec.md §4.4, §4.5 `UnikmerPolicy`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Unikmer<H> {
    pub hash: H,
    pub minimizer: Minimizer,
}

impl<H: HashValue> HashValue for Unikmer<H> {
    #[inline]
    fn storage_key(&self) -> u64 {
        self.hash.storage_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_value_is_min_of_strands() {
        let c = Can { fwd: 10, rc: 3 };
        assert_eq!(c.value(), 3);
        assert!(!c.is_fwd_canonical());

        let c2 = Can { fwd: 2, rc: 9 };
        assert_eq!(c2.value(), 2);
        assert!(c2.is_fwd_canonical());
    }

    #[test]
    fn unikmer_storage_key_delegates_to_inner_hash() {
        let u = Unikmer {
            hash: Fwd(42),
            minimizer: Minimizer {
                hash: 7,
                partition: 1,
            },
        };
        assert_eq!(u.storage_key(), 42);
    }
}
