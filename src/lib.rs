//! `dbgc`: a streaming compactor for the de Bruijn graph of a read set.
//!
//! Four layers, each usable on its own: `alphabet` (symbol validation),
//! `hashing` (rolling k-mer hashes and the shift policies built on them),
//! `storage` (k-mer membership/count sketches), and `dbg`/`traversal`/
//! `cdbg`/`compactor` (the graph itself and its streaming maintenance).

pub mod alphabet;
pub mod cdbg;
pub mod cli;
pub mod compactor;
pub mod dbg;
pub mod error;
pub mod gfa;
pub mod hashing;
pub mod sketch;
pub mod storage;
pub mod traversal;

pub use error::{CoreError, Result};
