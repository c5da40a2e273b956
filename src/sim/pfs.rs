//! Parallel fault simulator (PFS)
//!
//! Packs W-1 faults plus one fault-free reference bit into a single
//! machine word per node and evaluates the whole circuit with bitwise
//! operations.

use std::collections::HashSet;

use crate::circuit::{Circuit, NodeKind};
use crate::fault::{Fault, StuckAt};

/// Machine word width used for bit-packed fault simulation
pub type Word = u64;
const WORD_BITS: usize = Word::BITS as usize;
/// Number of faults simulated per chunk: one word bit is reserved for the
/// fault-free reference.
pub const CHUNK_SIZE: usize = WORD_BITS - 1;

/// Run PFS over every pattern and the given fault list, returning the set
/// of faults detected by at least one pattern.
pub fn pfs(circuit: &Circuit, patterns: &[Vec<bool>], faults: &[Fault]) -> HashSet<Fault> {
    let mut detected = HashSet::new();
    for pattern in patterns {
        for chunk in faults.chunks(CHUNK_SIZE) {
            detected.extend(pfs_chunk(circuit, pattern, chunk));
        }
    }
    detected
}

/// Simulate a single chunk of faults (at most `CHUNK_SIZE`) against one pattern
fn pfs_chunk(circuit: &Circuit, pattern: &[bool], chunk: &[Fault]) -> HashSet<Fault> {
    assert!(chunk.len() <= CHUNK_SIZE);
    assert_eq!(pattern.len(), circuit.nb_inputs());

    let mut value = vec![0 as Word; circuit.nb_nodes()];

    for (k, &pi) in circuit.inputs().iter().enumerate() {
        value[pi] = if pattern[k] { Word::MAX } else { 0 };
    }

    // bit 0 is the fault-free reference; bits 1..=chunk.len() carry the faults
    for i in circuit.order().iter().copied() {
        let n = circuit.node(i);
        if n.kind != NodeKind::Pi {
            let fanin = n.fanin.iter().map(|&u| value[u]);
            value[i] = match n.kind {
                NodeKind::Pi => unreachable!(),
                NodeKind::Branch => value[n.fanin[0]],
                NodeKind::Not => !value[n.fanin[0]],
                NodeKind::And => fanin.fold(Word::MAX, |a, b| a & b),
                NodeKind::Nand => !fanin.fold(Word::MAX, |a, b| a & b),
                NodeKind::Or => fanin.fold(0, |a, b| a | b),
                NodeKind::Nor => !fanin.fold(0, |a, b| a | b),
                NodeKind::Xor => fanin.fold(0, |a, b| a ^ b),
            };
        }
        // Fault injection: force the bit belonging to any fault sited at this node.
        for (b, f) in chunk.iter().enumerate() {
            if f.node == i {
                let bit = (b + 1) as u32;
                let stuck_one = f.stuck == StuckAt::One;
                if stuck_one {
                    value[i] |= (1 as Word) << bit;
                } else {
                    value[i] &= !((1 as Word) << bit);
                }
            }
        }
    }

    let mut detected = HashSet::new();
    for &po in circuit.outputs() {
        let v = value[po];
        let reference = v & 1;
        for (b, f) in chunk.iter().enumerate() {
            let bit = (b + 1) as u32;
            if ((v >> bit) & 1) != reference {
                detected.insert(*f);
            }
        }
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Node;

    fn node(id: u32, kind: NodeKind, fanin: Vec<usize>) -> Node {
        Node {
            id,
            kind,
            fanin,
            fanout: Vec::new(),
            level: -1,
        }
    }

    fn wire(nodes: &mut [Node]) {
        for i in 0..nodes.len() {
            let fanin = nodes[i].fanin.clone();
            for u in fanin {
                nodes[u].fanout.push(i);
            }
        }
    }

    #[test]
    fn test_and_gate_pi_stuck_at_0_detected_by_all_ones() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::And, vec![0, 1]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let faults = vec![Fault {
            node: 0,
            stuck: StuckAt::Zero,
        }];
        let patterns = vec![vec![true, true]];
        let detected = pfs(&circuit, &patterns, &faults);
        assert_eq!(detected.len(), 1);
    }

    #[test]
    fn test_fault_not_detected_when_masked() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::And, vec![0, 1]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        // input 1 stuck-at-0 is masked by input 0 = 0
        let faults = vec![Fault {
            node: 1,
            stuck: StuckAt::Zero,
        }];
        let patterns = vec![vec![false, true]];
        let detected = pfs(&circuit, &patterns, &faults);
        assert!(detected.is_empty());
    }

    #[test]
    fn test_chunking_across_multiple_words() {
        let mut nodes = vec![node(1, NodeKind::Pi, vec![])];
        for id in 2..80 {
            nodes.push(node(id, NodeKind::Branch, vec![0]));
        }
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let faults: Vec<Fault> = (1..circuit.nb_nodes())
            .map(|i| Fault {
                node: i,
                stuck: StuckAt::Zero,
            })
            .collect();
        assert!(faults.len() > CHUNK_SIZE);
        let patterns = vec![vec![true]];
        let detected = pfs(&circuit, &patterns, &faults);
        assert_eq!(detected.len(), faults.len());
    }
}
