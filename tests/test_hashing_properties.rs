//! Universal properties of the rolling hash and shifters, stated with
//! `proptest` since no fixed example can cover "for all sequences" the way
//! the teacher's example-based `tests/test_*.rs` files do.

use proptest::prelude::*;

use dbgc::alphabet::{Alphabet, Dna};
use dbgc::hashing::{CanLemire, FwdLemire, HashShifter, KmerIterator};

fn dna_seq(len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'A', b'C', b'G', b'T']), len)
}

proptest! {
    #[test]
    fn rolling_fwd_hash_always_matches_a_fresh_hash_of_the_same_window(
        seq in dna_seq(40), k in 4usize..12
    ) {
        prop_assume!(seq.len() >= k);
        let rolled: Vec<_> = KmerIterator::new(&seq, FwdLemire::new(k))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        for (i, h) in rolled.iter().enumerate() {
            let mut fresh = HashShifter::new(FwdLemire::new(k));
            let expected = fresh.hash_base(&seq[i..i + k]).unwrap();
            prop_assert_eq!(*h, expected);
        }
    }

    #[test]
    fn canonical_hash_is_invariant_to_reverse_complementing_the_window(
        seq in dna_seq(16), k in 4usize..16
    ) {
        prop_assume!(seq.len() >= k);
        let window = &seq[..k];
        let reverse_complement: Vec<u8> =
            window.iter().rev().map(|&c| Dna::complement(c)).collect();

        let mut fwd = HashShifter::new(CanLemire::<Dna>::new(k));
        let a = fwd.hash_base(window).unwrap();
        let mut rc_shifter = HashShifter::new(CanLemire::<Dna>::new(k));
        let b = rc_shifter.hash_base(&reverse_complement).unwrap();

        prop_assert_eq!(a.value(), b.value());
    }

    #[test]
    fn sanitize_rejects_any_sequence_containing_a_non_acgt_byte(
        mut seq in dna_seq(10)
    ) {
        seq.push(b'Z');
        prop_assert!(!Dna::sanitize(&mut seq));
    }
}
