//! Rolling-window shift policies and the `HashShifter` wrapper that enforces
//! the lazy-init contract around them (spec.md §4.4, §4.5).

use std::collections::VecDeque;
use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::error::{CoreError, Result};
use crate::hashing::cyclic::CyclicHash64;
use crate::hashing::span::KmerSpan;
use crate::hashing::ukhs::UkhsMap;
use crate::hashing::value::{Can, Fwd, HashValue, Minimizer, Unikmer};

/// The hash-update rules a `HashShifter` drives. Implementors never see the
/// full window directly — only the one base leaving and the one entering —
/// except where a policy (like `UnikmerPolicy`) needs more context and
/// keeps its own mirror of it.
pub trait ShiftPolicy {
    type Hash: HashValue;

    fn k(&self) -> usize;

    /// Initialize from the first `k` bytes of `seq` (already length-checked
    /// by the caller).
    fn hash_base_impl(&mut self, seq: &[u8]) -> Self::Hash;

    /// Roll the window right: `out` leaves on the left, `in_` enters on the
    /// right.
    fn shift_right_impl(&mut self, out: u8, in_: u8) -> Self::Hash;

    /// Roll the window left: `in_` enters on the left, `out` leaves on the
    /// right.
    fn shift_left_impl(&mut self, in_: u8, out: u8) -> Self::Hash;

    fn get_impl(&self) -> Self::Hash;
}

/// Wraps a `ShiftPolicy` with the `KmerSpan` needed to know which byte is
/// leaving the window on each shift, and the lazy-init guard from spec.md
/// §7 (`UninitializedShifter`).
#[derive(Clone, Debug)]
pub struct HashShifter<P: ShiftPolicy> {
    policy: P,
    span: KmerSpan,
    initialized: bool,
}

impl<P: ShiftPolicy> HashShifter<P> {
    pub fn new(policy: P) -> Self {
        let k = policy.k();
        Self {
            policy,
            span: KmerSpan::new(k),
            initialized: false,
        }
    }

    pub fn k(&self) -> usize {
        self.policy.k()
    }

    pub fn span(&self) -> &KmerSpan {
        &self.span
    }

    pub fn hash_base(&mut self, seq: &[u8]) -> Result<P::Hash> {
        let k = self.policy.k();
        if seq.len() < k {
            return Err(CoreError::SequenceTooShort { len: seq.len(), k });
        }
        self.span.load(seq);
        let h = self.policy.hash_base_impl(seq);
        self.initialized = true;
        Ok(h)
    }

    pub fn shift_right(&mut self, in_: u8) -> Result<P::Hash> {
        if !self.initialized {
            return Err(CoreError::UninitializedShifter);
        }
        let out = self.span.shift_right(in_);
        Ok(self.policy.shift_right_impl(out, in_))
    }

    pub fn shift_left(&mut self, in_: u8) -> Result<P::Hash> {
        if !self.initialized {
            return Err(CoreError::UninitializedShifter);
        }
        let out = self.span.shift_left(in_);
        Ok(self.policy.shift_left_impl(in_, out))
    }

    pub fn get(&self) -> Result<P::Hash> {
        if !self.initialized {
            return Err(CoreError::UninitializedShifter);
        }
        Ok(self.policy.get_impl())
    }
}

/// Forward-strand rolling hash.
#[derive(Clone, Debug)]
pub struct FwdLemire {
    k: usize,
    inner: CyclicHash64,
}

impl FwdLemire {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            inner: CyclicHash64::new(k),
        }
    }
}

impl ShiftPolicy for FwdLemire {
    type Hash = Fwd;

    fn k(&self) -> usize {
        self.k
    }

    fn hash_base_impl(&mut self, seq: &[u8]) -> Fwd {
        self.inner.reset();
        for &c in &seq[..self.k] {
            self.inner.eat(c);
        }
        Fwd(self.inner.get())
    }

    fn shift_right_impl(&mut self, out: u8, in_: u8) -> Fwd {
        self.inner.update(out, in_);
        Fwd(self.inner.get())
    }

    fn shift_left_impl(&mut self, in_: u8, out: u8) -> Fwd {
        self.inner.reverse_update(in_, out);
        Fwd(self.inner.get())
    }

    fn get_impl(&self) -> Fwd {
        Fwd(self.inner.get())
    }
}

/// Canonical (strand-independent) rolling hash: tracks the forward hash and
/// the reverse-complement hash side by side.
#[derive(Clone, Debug)]
pub struct CanLemire<A: Alphabet> {
    k: usize,
    fwd: CyclicHash64,
    rc: CyclicHash64,
    _alphabet: std::marker::PhantomData<A>,
}

impl<A: Alphabet> CanLemire<A> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            fwd: CyclicHash64::new(k),
            rc: CyclicHash64::new(k),
            _alphabet: std::marker::PhantomData,
        }
    }
}

impl<A: Alphabet> ShiftPolicy for CanLemire<A> {
    type Hash = Can;

    fn k(&self) -> usize {
        self.k
    }

    fn hash_base_impl(&mut self, seq: &[u8]) -> Can {
        self.fwd.reset();
        self.rc.reset();
        for &c in &seq[..self.k] {
            self.fwd.eat(c);
        }
        for &c in seq[..self.k].iter().rev() {
            self.rc.eat(A::complement(c));
        }
        Can {
            fwd: self.fwd.get(),
            rc: self.rc.get(),
        }
    }

    fn shift_right_impl(&mut self, out: u8, in_: u8) -> Can {
        self.fwd.update(out, in_);
        // Appending `in_` on the forward strand's right is the same as
        // prepending its complement on the reverse-complement strand's
        // left; dropping `out` on the left is dropping its complement on
        // the right — i.e. a shift_left of the rc hash.
        self.rc.reverse_update(A::complement(in_), A::complement(out));
        Can {
            fwd: self.fwd.get(),
            rc: self.rc.get(),
        }
    }

    fn shift_left_impl(&mut self, in_: u8, out: u8) -> Can {
        self.fwd.reverse_update(in_, out);
        self.rc.update(A::complement(out), A::complement(in_));
        Can {
            fwd: self.fwd.get(),
            rc: self.rc.get(),
        }
    }

    fn get_impl(&self) -> Can {
        Can {
            fwd: self.fwd.get(),
            rc: self.rc.get(),
        }
    }
}

/// Wraps an inner policy with a UKHS minimizer search over its K-window
/// (spec.md §4.4, §4.5).
///
/// Steady-state shifts are O(k') amortized rather than the O(1) of the
/// other policies: rather than interleaving the inner k'-hasher's `eat`
/// calls with the outer policy's (which the outer `ShiftPolicy` interface
/// doesn't expose), this keeps its own rolling k'-hasher plus the set of
/// k'-window hashes currently inside the K-window, and recomputes the
/// minimum UKHS member on every shift.
pub struct UnikmerPolicy<Inner: ShiftPolicy> {
    inner: Inner,
    kprime: usize,
    ukhs: Arc<UkhsMap>,
    /// Full K-window, mirrored locally because `shift_left_impl` needs the
    /// character one position further left than `kprime_buf` tracks.
    window_buf: VecDeque<u8>,
    kprime_buf: VecDeque<u8>,
    kprime_hasher: CyclicHash64,
    window_hashes: VecDeque<u64>,
}

impl<Inner: ShiftPolicy> UnikmerPolicy<Inner> {
    pub fn new(inner: Inner, kprime: usize, ukhs: Arc<UkhsMap>) -> Result<Self> {
        let k = inner.k();
        if kprime != ukhs.kprime() || kprime > k {
            return Err(CoreError::UkhsMismatch {
                shifter_k: k,
                shifter_kprime: kprime,
                ukhs_kprime: ukhs.kprime(),
            });
        }
        Ok(Self {
            inner,
            kprime,
            ukhs,
            window_buf: VecDeque::with_capacity(k),
            kprime_buf: VecDeque::with_capacity(kprime),
            kprime_hasher: CyclicHash64::new(kprime),
            window_hashes: VecDeque::with_capacity(k - kprime + 1),
        })
    }

    fn min_minimizer(&self) -> Minimizer {
        let mut best: Option<(u64, u32)> = None;
        for &h in &self.window_hashes {
            if let Some(p) = self.ukhs.partition_of(h) {
                if best.map_or(true, |(bh, _)| h < bh) {
                    best = Some((h, p));
                }
            }
        }
        let (hash, partition) = best.unwrap_or_else(|| {
            // Should not happen given a true hitting set, but avoids a panic
            // if `ukhs` doesn't actually cover every K-window.
            let h = *self.window_hashes.iter().min().expect("window not loaded");
            (h, 0)
        });
        Minimizer { hash, partition }
    }
}

impl<Inner: ShiftPolicy> ShiftPolicy for UnikmerPolicy<Inner> {
    type Hash = Unikmer<Inner::Hash>;

    fn k(&self) -> usize {
        self.inner.k()
    }

    fn hash_base_impl(&mut self, seq: &[u8]) -> Self::Hash {
        let inner_hash = self.inner.hash_base_impl(seq);
        let k = self.inner.k();
        let kp = self.kprime;

        self.window_buf = seq[..k].iter().copied().collect();
        self.kprime_buf = seq[k - kp..k].iter().copied().collect();
        self.kprime_hasher.reset();
        for &c in &self.kprime_buf {
            self.kprime_hasher.eat(c);
        }

        self.window_hashes.clear();
        for start in 0..=(k - kp) {
            let mut h = CyclicHash64::new(kp);
            for &c in &seq[start..start + kp] {
                h.eat(c);
            }
            self.window_hashes.push_back(h.get());
        }

        Unikmer {
            hash: inner_hash,
            minimizer: self.min_minimizer(),
        }
    }

    fn shift_right_impl(&mut self, out: u8, in_: u8) -> Self::Hash {
        let inner_hash = self.inner.shift_right_impl(out, in_);

        self.window_buf.pop_front();
        self.window_buf.push_back(in_);

        let kp_out = self.kprime_buf.pop_front().expect("kp buf loaded");
        self.kprime_buf.push_back(in_);
        self.kprime_hasher.update(kp_out, in_);

        self.window_hashes.pop_front();
        self.window_hashes.push_back(self.kprime_hasher.get());

        Unikmer {
            hash: inner_hash,
            minimizer: self.min_minimizer(),
        }
    }

    fn shift_left_impl(&mut self, in_: u8, out: u8) -> Self::Hash {
        let inner_hash = self.inner.shift_left_impl(in_, out);
        let k = self.inner.k();
        let kp = self.kprime;

        let prepend = if kp == k {
            in_
        } else {
            self.window_buf[k - kp - 1]
        };
        self.window_buf.pop_back();
        self.window_buf.push_front(in_);

        let kp_dropped = self.kprime_buf.pop_back().expect("kp buf loaded");
        self.kprime_buf.push_front(prepend);
        self.kprime_hasher.reverse_update(prepend, kp_dropped);

        self.window_hashes.pop_back();
        self.window_hashes.push_front(self.kprime_hasher.get());

        Unikmer {
            hash: inner_hash,
            minimizer: self.min_minimizer(),
        }
    }

    fn get_impl(&self) -> Self::Hash {
        Unikmer {
            hash: self.inner.get_impl(),
            minimizer: self.min_minimizer(),
        }
    }
}

/// `UnikmerPolicy` over a forward-strand inner hash.
pub type FwdUnikmer = UnikmerPolicy<FwdLemire>;

/// `UnikmerPolicy` over a canonical inner hash.
pub type CanUnikmer<A> = UnikmerPolicy<CanLemire<A>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Dna;

    #[test]
    fn fwd_shifter_rejects_short_sequence() {
        let mut sh = HashShifter::new(FwdLemire::new(8));
        assert_eq!(
            sh.hash_base(b"ACGT"),
            Err(CoreError::SequenceTooShort { len: 4, k: 8 })
        );
    }

    #[test]
    fn fwd_shifter_rejects_shift_before_hash_base() {
        let mut sh = HashShifter::new(FwdLemire::new(4));
        assert_eq!(sh.shift_right(b'A'), Err(CoreError::UninitializedShifter));
    }

    #[test]
    fn fwd_shifter_matches_fresh_hash_after_shift_right() {
        let seq = b"ACGTACGT";
        let k = 4;
        let mut sh = HashShifter::new(FwdLemire::new(k));
        sh.hash_base(&seq[..k]).unwrap();
        let rolled = sh.shift_right(seq[k]).unwrap();

        let mut fresh = FwdLemire::new(k);
        let expected = fresh.hash_base_impl(&seq[1..1 + k]);
        assert_eq!(rolled, expected);
    }

    #[test]
    fn can_shifter_value_is_strand_independent_min() {
        let k = 4;
        let mut sh = HashShifter::new(CanLemire::<Dna>::new(k));
        let can = sh.hash_base(b"ACGT").unwrap();
        assert_eq!(can.value(), can.fwd.min(can.rc));
    }

    #[test]
    fn can_shifter_roundtrips_shift_right_then_left() {
        let seq = b"ACGTACGT";
        let k = 4;
        let mut sh = HashShifter::new(CanLemire::<Dna>::new(k));
        let base = sh.hash_base(&seq[..k]).unwrap();
        sh.shift_right(seq[k]).unwrap();
        let back = sh.shift_left(seq[0]).unwrap();
        assert_eq!(back, base);
    }

    #[test]
    fn unikmer_policy_rejects_mismatched_kprime() {
        let ukhs = Arc::new(UkhsMap::new(&["AAA".to_string(), "CCC".to_string()]));
        let err = UnikmerPolicy::new(FwdLemire::new(8), 4, ukhs).unwrap_err();
        assert!(matches!(err, CoreError::UkhsMismatch { .. }));
    }

    #[test]
    fn unikmer_policy_tracks_a_minimizer() {
        let ukhs = Arc::new(UkhsMap::new(&[
            "AAA".to_string(),
            "CCC".to_string(),
            "GGG".to_string(),
            "TTT".to_string(),
            "ACG".to_string(),
            "CGT".to_string(),
            "GTA".to_string(),
            "TAC".to_string(),
        ]));
        let policy = UnikmerPolicy::new(FwdLemire::new(6), 3, ukhs).unwrap();
        let mut sh = HashShifter::new(policy);
        let u = sh.hash_base(b"ACGTAC").unwrap();
        assert!(u.minimizer.partition < 8);
    }

    #[test]
    fn unikmer_policy_shift_right_then_left_restores_minimizer() {
        let ukhs = Arc::new(UkhsMap::new(&[
            "AA".to_string(),
            "CC".to_string(),
            "GG".to_string(),
            "TT".to_string(),
            "AC".to_string(),
            "CG".to_string(),
            "GT".to_string(),
            "TA".to_string(),
            "CA".to_string(),
            "GC".to_string(),
            "TG".to_string(),
            "AT".to_string(),
        ]));
        let policy = UnikmerPolicy::new(FwdLemire::new(5), 2, ukhs).unwrap();
        let mut sh = HashShifter::new(policy);
        let seq = b"ACGTAC";
        let base = sh.hash_base(&seq[..5]).unwrap();
        sh.shift_right(seq[5]).unwrap();
        let back = sh.shift_left(seq[0]).unwrap();
        assert_eq!(back.hash, base.hash);
    }
}
