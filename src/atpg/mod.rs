//! Test generation: PODEM, the D-algorithm, and the driver that ties them
//! together with checkpoint fault-list synthesis and coverage measurement.

pub mod dalg;
pub mod driver;
pub mod podem;

use crate::circuit::{Circuit, NodeKind};
use crate::fault::{Fault, StuckAt};
use crate::value::Value5;

/// Substitute the fault at its site into a freshly computed value: writing
/// `v` at the fault site becomes D or D̄ if `v` matches the activation
/// value, or reverts to a concrete value if it was already discrepant in
/// the opposite direction.
pub(crate) fn inject_fault(v: Value5, stuck: StuckAt) -> Value5 {
    match (stuck, v) {
        (StuckAt::Zero, Value5::One) => Value5::D,
        (StuckAt::One, Value5::Zero) => Value5::DBar,
        (StuckAt::Zero, Value5::DBar) => Value5::Zero,
        (StuckAt::One, Value5::D) => Value5::One,
        _ => v,
    }
}

/// Five-valued evaluation of a single node from its (already known) fanin values
pub(crate) fn eval_node5(kind: NodeKind, fanin_values: impl Iterator<Item = Value5> + Clone) -> Value5 {
    match kind {
        NodeKind::Pi => panic!("eval_node5 called on a primary input"),
        NodeKind::Branch | NodeKind::Not => {
            let mut it = fanin_values;
            let v = it.next().expect("branch/not must have one fanin");
            if kind == NodeKind::Not {
                !v
            } else {
                v
            }
        }
        NodeKind::And => Value5::controlling(fanin_values, false, false),
        NodeKind::Nand => Value5::controlling(fanin_values, false, true),
        NodeKind::Or => Value5::controlling(fanin_values, true, false),
        NodeKind::Nor => Value5::controlling(fanin_values, true, true),
        NodeKind::Xor => Value5::xor(fanin_values),
    }
}

/// Full five-valued re-simulation of the circuit given primary input values
/// (in PI declaration order) and a single injected fault. Used by PODEM's
/// imply step, which always re-derives the whole circuit from scratch.
pub(crate) fn simulate5(circuit: &Circuit, pi_values: &[Value5], fault: Fault) -> Vec<Value5> {
    assert_eq!(pi_values.len(), circuit.nb_inputs());
    let mut values = vec![Value5::X; circuit.nb_nodes()];
    for (k, &pi) in circuit.inputs().iter().enumerate() {
        values[pi] = pi_values[k];
    }
    for &i in circuit.order() {
        let n = circuit.node(i);
        let raw = if n.kind == NodeKind::Pi {
            values[i]
        } else {
            let fanin = n.fanin.iter().map(|&u| values[u]);
            eval_node5(n.kind, fanin)
        };
        values[i] = if i == fault.node {
            inject_fault(raw, fault.stuck)
        } else {
            raw
        };
    }
    values
}

/// D-frontier: nodes whose value is still X but at least one fanin carries D or D̄
pub(crate) fn d_frontier(circuit: &Circuit, values: &[Value5]) -> Vec<usize> {
    let mut frontier = Vec::new();
    for i in 0..circuit.nb_nodes() {
        if values[i] != Value5::X {
            continue;
        }
        let n = circuit.node(i);
        if n.fanin.iter().any(|&u| values[u].is_discrepancy()) {
            frontier.push(i);
        }
    }
    frontier
}

/// Walk from `from` toward a primary input, following any fanin still at X,
/// counting inversions through NAND/NOR/NOT gates. Returns the PI node index
/// and the value it must be assigned so that `from` receives `target_at_from`.
pub(crate) fn backtrace(circuit: &Circuit, values: &[Value5], from: usize, target_at_from: bool) -> (usize, bool) {
    let mut cur = from;
    let mut inversions = 0u32;
    loop {
        let n = circuit.node(cur);
        if n.kind == NodeKind::Pi {
            let value = target_at_from ^ (inversions % 2 == 1);
            return (cur, value);
        }
        let next = n
            .fanin
            .iter()
            .copied()
            .find(|&u| values[u] == Value5::X)
            .unwrap_or_else(|| n.fanin[0]);
        if n.kind.inverting() {
            inversions += 1;
        }
        cur = next;
    }
}

/// Map a node index known to be a primary input to its position in PI order
pub(crate) fn pi_position(circuit: &Circuit, node: usize) -> usize {
    circuit
        .inputs()
        .iter()
        .position(|&i| i == node)
        .expect("node is not a primary input")
}
