//! Deductive fault simulator (DFS)
//!
//! Propagates, in a single level-ordered pass, the set of faults detectable
//! at each node, using set-algebraic rules on fanin fault sets.

use fxhash::FxHashMap;
use std::collections::HashSet;

use crate::circuit::{Circuit, NodeKind};
use crate::fault::{Fault, StuckAt};
use crate::sim::event::EventSimulator;
use crate::value::Value3;

fn own_fault(node: usize, value: Value3) -> Option<Fault> {
    // the node's own stuck-at fault is detectable exactly when its fault-free
    // value differs from the stuck value, i.e. when it currently drives the
    // opposite of what the fault would force
    let stuck = match value {
        Value3::One => StuckAt::Zero,
        Value3::Zero => StuckAt::One,
        Value3::X => return None,
    };
    Some(Fault { node, stuck })
}

/// Compute the set of faults detected by a single pattern, by propagating
/// fault sets from PIs to POs and unioning the sets found at every output.
pub fn dfs(circuit: &Circuit, pattern: &[bool]) -> HashSet<Fault> {
    let pi_values: Vec<Value3> = pattern.iter().map(|&b| Value3::from_bool(b)).collect();
    let mut sim = EventSimulator::new(circuit);
    sim.apply(&pi_values);

    let mut sets: Vec<HashSet<Fault>> = vec![HashSet::new(); circuit.nb_nodes()];
    for i in circuit.order().iter().copied() {
        let n = circuit.node(i);
        let value = sim.value(i);
        let mut f: HashSet<Fault> = match n.kind {
            NodeKind::Pi => HashSet::new(),
            NodeKind::Branch | NodeKind::Not => sets[n.fanin[0]].clone(),
            NodeKind::And | NodeKind::Nand | NodeKind::Or | NodeKind::Nor => {
                controlling_gate(n.kind, &n.fanin, &sets, &sim)
            }
            NodeKind::Xor => xor_gate(&n.fanin, &sets),
        };
        if let Some(own) = own_fault(i, value) {
            f.insert(own);
        }
        sets[i] = f;
    }

    let mut detected = HashSet::new();
    for &po in circuit.outputs() {
        detected.extend(sets[po].iter().copied());
    }
    detected
}

fn controlling_gate(
    kind: NodeKind,
    fanin: &[usize],
    sets: &[HashSet<Fault>],
    sim: &EventSimulator,
) -> HashSet<Fault> {
    let control = kind.controlling_value().unwrap();
    let controllers: Vec<usize> = fanin
        .iter()
        .copied()
        .filter(|&u| sim.value(u).as_bool() == Some(control))
        .collect();
    match controllers.len() {
        0 => {
            // all inputs non-controlling: every input fault that flips the good
            // value propagates
            let mut f = HashSet::new();
            for &u in fanin {
                f.extend(sets[u].iter().copied());
            }
            f
        }
        1 => {
            // the sole controller's faults propagate, unless masked by a
            // non-controller also carrying the same fault
            let u_star = controllers[0];
            let mut f = sets[u_star].clone();
            for &u in fanin {
                if u != u_star {
                    for fault in &sets[u] {
                        f.remove(fault);
                    }
                }
            }
            f
        }
        _ => {
            // fault must propagate through every controller and be unmasked by
            // any non-controller
            let mut f = sets[controllers[0]].clone();
            for &u in &controllers[1..] {
                f.retain(|fault| sets[u].contains(fault));
            }
            for &u in fanin {
                if !controllers.contains(&u) {
                    for fault in &sets[u] {
                        f.remove(fault);
                    }
                }
            }
            f
        }
    }
}

/// XOR rule: a fault on an odd number of inputs propagates (symmetric
/// difference over all fanin sets), per the parity-based generalization.
fn xor_gate(fanin: &[usize], sets: &[HashSet<Fault>]) -> HashSet<Fault> {
    let mut counts: FxHashMap<Fault, usize> = FxHashMap::default();
    for &u in fanin {
        for &fault in &sets[u] {
            *counts.entry(fault).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, c)| c % 2 == 1)
        .map(|(f, _)| f)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Node;
    use crate::sim::pfs::pfs;

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
    fn test_dfs_matches_pfs_on_and_gate() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::And, vec![0, 1]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();

        let all_faults = vec![
            Fault { node: 0, stuck: StuckAt::Zero },
            Fault { node: 0, stuck: StuckAt::One },
            Fault { node: 1, stuck: StuckAt::Zero },
            Fault { node: 1, stuck: StuckAt::One },
            Fault { node: 2, stuck: StuckAt::Zero },
            Fault { node: 2, stuck: StuckAt::One },
        ];
        for pattern in [vec![true, true], vec![true, false], vec![false, true], vec![false, false]] {
            let by_dfs = dfs(&circuit, &pattern);
            let by_pfs = pfs(&circuit, &[pattern.clone()], &all_faults);
            assert_eq!(by_dfs, by_pfs, "mismatch for pattern {:?}", pattern);
        }
    }

    #[test]
    fn test_xor_parity_cancels_common_fault() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::Pi, vec![]),
            node(4, NodeKind::Xor, vec![0, 1, 2]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let detected = dfs(&circuit, &[true, false, true]);
        // all three PI faults plus the gate's own fault are structurally
        // distinct single-occurrence faults and should all propagate
        assert!(detected.contains(&Fault { node: 0, stuck: StuckAt::Zero }));
        assert!(detected.contains(&Fault { node: 3, stuck: StuckAt::One }));
    }
}
