//! Non-destructive probing of a shifter's neighbors (spec.md §4.6), used by
//! `traversal` to find decision nodes without committing to a direction.

use crate::error::Result;
use crate::hashing::shifter::{HashShifter, ShiftPolicy};

/// The four bases a graph edge can extend through; `N`/ambiguity codes are
/// never graph edges regardless of which `Alphabet` sanitized the input.
const BASES: [u8; 4] = *b"ACGT";

/// A `HashShifter` plus cheap speculative lookahead: `left_extensions`/
/// `right_extensions` clone the shifter's state to probe each of the four
/// possible neighbor bases, leaving the real cursor untouched.
#[derive(Clone, Debug)]
pub struct HashExtender<P: ShiftPolicy + Clone> {
    shifter: HashShifter<P>,
}

impl<P: ShiftPolicy + Clone> HashExtender<P> {
    pub fn new(shifter: HashShifter<P>) -> Self {
        Self { shifter }
    }

    pub fn k(&self) -> usize {
        self.shifter.k()
    }

    pub fn set_cursor(&mut self, seq: &[u8]) -> Result<P::Hash> {
        self.shifter.hash_base(seq)
    }

    pub fn shift_right(&mut self, c: u8) -> Result<P::Hash> {
        self.shifter.shift_right(c)
    }

    pub fn shift_left(&mut self, c: u8) -> Result<P::Hash> {
        self.shifter.shift_left(c)
    }

    pub fn get(&self) -> Result<P::Hash> {
        self.shifter.get()
    }

    /// The literal bases of the window the cursor is currently on.
    pub fn current_kmer(&self) -> Vec<u8> {
        self.shifter.span().as_bytes()
    }

    /// `(base, hash)` for each of the four bases that could extend the
    /// current window to the right, without mutating `self`.
    pub fn right_extensions(&self) -> Vec<(u8, P::Hash)> {
        BASES
            .iter()
            .filter_map(|&c| {
                let mut probe = self.shifter.clone();
                probe.shift_right(c).ok().map(|h| (c, h))
            })
            .collect()
    }

    /// `(base, hash)` for each of the four bases that could extend the
    /// current window to the left, without mutating `self`.
    pub fn left_extensions(&self) -> Vec<(u8, P::Hash)> {
        BASES
            .iter()
            .filter_map(|&c| {
                let mut probe = self.shifter.clone();
                probe.shift_left(c).ok().map(|h| (c, h))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::shifter::FwdLemire;

    #[test]
    fn right_extensions_do_not_mutate_cursor() {
        let mut ext = HashExtender::new(HashShifter::new(FwdLemire::new(4)));
        let base = ext.set_cursor(b"ACGT").unwrap();
        let probes = ext.right_extensions();
        assert_eq!(probes.len(), 4);
        assert_eq!(ext.get().unwrap(), base);
    }

    #[test]
    fn right_extension_matches_committed_shift() {
        let mut ext = HashExtender::new(HashShifter::new(FwdLemire::new(4)));
        ext.set_cursor(b"ACGT").unwrap();
        let probes = ext.right_extensions();
        let committed = ext.shift_right(b'A').unwrap();
        let probed = probes.iter().find(|&&(c, _)| c == b'A').unwrap().1;
        assert_eq!(committed, probed);
    }
}
