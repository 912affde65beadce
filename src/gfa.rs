//! GFA1 text output for a compacted graph (spec.md §6 "cDBG output
//! (collaborator, not core)"): the core contributes only the node list,
//! sequences, and meta tags — no walk/path records, no edge inference.

use std::io::{self, Write};

use crate::cdbg::{Cdbg, NodeMeta};

fn meta_tag(meta: NodeMeta) -> &'static str {
    match meta {
        NodeMeta::Full => "full",
        NodeMeta::Tip => "tip",
        NodeMeta::Island => "island",
        NodeMeta::Circular => "circular",
        NodeMeta::Loop => "loop",
        NodeMeta::Trivial => "trivial",
    }
}

/// Write every unitig in `cdbg` as a GFA1 segment (`S`) line, tagging its
/// structural class in a custom `mt:Z:` tag. Decision k-mers are written as
/// single-base segments tagged `dt:Z:decision` so downstream tools can tell
/// a junction from a unitig without re-deriving degree.
pub fn write_gfa1<W: Write>(cdbg: &Cdbg, mut w: W) -> io::Result<()> {
    writeln!(w, "H\tVN:Z:1.0")?;
    for id in cdbg.unode_ids() {
        let node = cdbg.unode(id).expect("id came from unode_ids");
        writeln!(
            w,
            "S\tu{}\t{}\tKC:i:{}\tmt:Z:{}",
            id.0,
            String::from_utf8_lossy(&node.sequence),
            node.sequence.len(),
            meta_tag(node.meta)
        )?;
    }
    for id in cdbg.dnode_ids() {
        let node = cdbg.dnode(id).expect("id came from dnode_ids");
        writeln!(
            w,
            "S\td{}\t{}\tdt:Z:decision",
            id.0,
            String::from_utf8_lossy(&node.kmer_sequence)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_segment_line_per_unode() {
        let mut cdbg = Cdbg::new();
        cdbg.build_unode(b"ACGTACGT".to_vec(), 1, 2, false, false, vec![1, 2], 4);
        let mut out = Vec::new();
        write_gfa1(&cdbg, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("H\tVN:Z:1.0\n"));
        assert!(text.contains("S\tu0\tACGTACGT\tKC:i:8\tmt:Z:island"));
    }

    #[test]
    fn writes_decision_nodes_as_single_segments() {
        let mut cdbg = Cdbg::new();
        cdbg.build_dnode(77, b"ACGT".to_vec(), 1, 2);
        let mut out = Vec::new();
        write_gfa1(&cdbg, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("S\td77\tACGT\tdt:Z:decision"));
    }
}
