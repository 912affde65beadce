//! Node types of the compact de Bruijn graph (spec.md §3).

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UNodeId(pub u64);

/// A decision node's id is literally the canonical hash of its k-mer
/// (spec.md §3: "id equals the canonical hash of the k-mer"), not an
/// independent counter — so two reads that induce the same decision k-mer
/// always agree on its id without needing to look anything up first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DNodeId(pub u64);

/// Structural classification of a unitig (spec.md §4.8
/// `recompute_node_meta`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeMeta {
    /// Both ends are adjacent to another node in the dBG.
    Full,
    /// Exactly one end is adjacent to another node; the other is a dead end.
    Tip,
    /// Neither end is adjacent to another node: the whole connected component.
    Island,
    /// The unitig's two ends are the same k-mer (len > k): a simple cycle.
    Circular,
    /// Reserved for a self-loop produced by a circular split; not produced
    /// by `classify` itself.
    Loop,
    /// Exactly one k-mer's worth of sequence.
    Trivial,
}

/// Classify a unitig from its length, its two boundary hashes, and whether
/// each boundary is adjacent to another node in the dBG (spec.md §4.8):
/// TRIVIAL if `len == k`, CIRCULAR if the two ends are the same k-mer,
/// ISLAND if neither end has a neighbor, FULL if both do, TIP otherwise.
pub fn classify(
    len: usize,
    k: usize,
    left_end_hash: u64,
    right_end_hash: u64,
    left_has_neighbor: bool,
    right_has_neighbor: bool,
) -> NodeMeta {
    if len == k {
        return NodeMeta::Trivial;
    }
    if left_end_hash == right_end_hash {
        return NodeMeta::Circular;
    }
    match (left_has_neighbor, right_has_neighbor) {
        (false, false) => NodeMeta::Island,
        (true, true) => NodeMeta::Full,
        _ => NodeMeta::Tip,
    }
}

/// A maximal run of non-branching sequence between (or around) decision
/// k-mers.
///
/// `tags` is every k-mer hash along `sequence`, in order (positions
/// `0..=sequence.len()-k`); `left_end_hash`/`right_end_hash` are always
/// `tags[0]`/`tags[tags.len()-1]`. The invariant from spec.md §3 holds:
/// every tag hash maps back to this unitig's id in `Cdbg::tag_map`. Keeping
/// every k-mer tagged (rather than goetia's sparse, sampled subset — see
/// `examples/original_source/include/goetia/cdbg/utagger.hh`) turns "does
/// any k-mer of a freshly walked read already belong to a unitig" into an
/// O(1)-per-k-mer lookup, which the streaming compactor needs to tell a
/// tip extension from a brand-new unitig.
#[derive(Clone, Debug)]
pub struct UnitigNode {
    pub id: UNodeId,
    pub sequence: Vec<u8>,
    pub left_end_hash: u64,
    pub right_end_hash: u64,
    pub tags: Vec<u64>,
    pub left_has_neighbor: bool,
    pub right_has_neighbor: bool,
    pub meta: NodeMeta,
}

impl UnitigNode {
    pub fn head(&self, k: usize) -> &[u8] {
        &self.sequence[..k]
    }

    pub fn tail(&self, k: usize) -> &[u8] {
        &self.sequence[self.sequence.len() - k..]
    }
}

/// A k-mer with more than one neighbor in some direction: a branch point
/// shared by two or more unitigs (spec.md §3).
#[derive(Clone, Debug)]
pub struct DecisionNode {
    pub id: DNodeId,
    pub kmer_sequence: Vec<u8>,
    pub left_degree: usize,
    pub right_degree: usize,
    /// Number of times this k-mer has been re-observed as a decision k-mer.
    pub count: u64,
    /// Set once a read has touched this node after its degrees were last
    /// recorded, so a future incremental-recount pass knows to revisit it.
    pub dirty: bool,
}
