//! The compact de Bruijn graph: decision/unitig nodes and the mutation
//! primitives that keep them consistent as reads stream in (spec.md §3,
//! §4.8, §4.9).

pub mod mutations;
pub mod node;

pub use mutations::Cdbg;
pub use node::{classify, DNodeId, DecisionNode, NodeMeta, UNodeId, UnitigNode};
