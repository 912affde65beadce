use clap::{value_parser, Args, ValueEnum};
use std::path::PathBuf;

/// Which `Storage` backend to build the dBG with (spec.md §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Bloom-filter-style membership only, lowest memory.
    Bit,
    /// Count-min sketch, saturating 8-bit counters.
    Byte,
    /// Count-min sketch, saturating 4-bit counters, half the memory of `byte`.
    Nibble,
    /// Open-addressed exact-ish counting table (simplified quotient filter).
    Qf,
    /// Exact hash set, highest memory, no false positives.
    #[value(name = "hashset")]
    HashSet,
}

/// Whether k-mers are hashed per-strand or collapsed to their
/// canonical (strand-independent) representative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strand {
    Forward,
    Canonical,
}

#[derive(Debug, Args)]
pub struct IOArgs {
    /// FASTA/FASTQ input files (may repeat; gzip detected by extension) [path]
    #[clap(
        short = 'i',
        long = "input",
        value_parser,
        required = true,
        num_args = 1..,
        help_heading = "Core"
    )]
    pub inputs: Vec<PathBuf>,

    /// GFA1 file to write the compacted graph to [path]
    #[clap(short = 'o', long = "output", value_parser, required = true, help_heading = "Core")]
    pub output_gfa: PathBuf,

    /// Number of threads to use for the insert-only phase [integer]
    #[clap(short = 't', long, default_value = "1", help_heading = "Core")]
    pub n_threads: usize,
}

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// K-mer size [integer]
    #[clap(short = 'k', long, default_value = "21", value_parser = value_parser!(usize).range(1..32), help_heading = "Graph")]
    pub k: usize,

    /// Storage backend [bit|byte|nibble|qf|hashset]
    #[clap(long, value_enum, default_value = "byte", help_heading = "Graph")]
    pub storage: StorageKind,

    /// Hash k-mers per-strand or canonically [forward|canonical]
    #[clap(long, value_enum, default_value = "canonical", help_heading = "Graph")]
    pub strand: Strand,

    /// Number of tables for bit/count-min backends [integer]
    #[clap(long, default_value = "4", value_parser = value_parser!(u32).range(1..), help_heading = "Graph")]
    pub n_tables: u32,

    /// Table size (bits/bytes/nibbles per table, rounded up internally) [integer]
    #[clap(long, default_value = "16777216", help_heading = "Graph")]
    pub table_size: u64,

    /// Cap a single unitig walk at this many bases, guarding against a
    /// pathological input making one read's compaction step unbounded [integer]
    #[clap(long, default_value = "1000000", help_heading = "Graph")]
    pub max_unitig_len: usize,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    /// Load a previously saved storage table before processing reads [path]
    #[clap(long, value_parser, help_heading = "Persistence")]
    pub load_state: Option<PathBuf>,

    /// Save the storage table to this path after processing reads [path]
    #[clap(long, value_parser, help_heading = "Persistence")]
    pub save_state: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DiagnosticArgs {
    /// Report the length of the breadth-first component reachable from the
    /// first read's seed k-mer, bounded by this many steps [integer]
    #[clap(long, help_heading = "Diagnostics")]
    pub report_component_sizes: Option<usize>,
}
