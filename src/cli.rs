//! Command-line argument groups shared by `src/bin/dbgc_compact.rs`,
//! mirroring the teacher's `IOArgs`/`ReadFilteringArgs`/`GCArgs` split of
//! one big flag list into themed `clap::Args` structs.

pub mod opts;

pub use opts::{DiagnosticArgs, GraphArgs, IOArgs, StateArgs, StorageKind, Strand};
