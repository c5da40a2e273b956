//! Event-driven three-valued simulator
//!
//! Maintains node values across successive patterns and only re-evaluates
//! the nodes whose fanin actually changed.

use fxhash::FxHashSet;
use std::collections::VecDeque;

use crate::circuit::{Circuit, NodeKind};
use crate::value::Value3;

/// Event-driven three-valued simulator over a single circuit
///
/// Values persist between calls to `apply`, so only the nodes downstream of
/// a changed primary input are re-evaluated on each subsequent pattern.
pub struct EventSimulator<'a> {
    circuit: &'a Circuit,
    values: Vec<Value3>,
    first_run: bool,
}

impl<'a> EventSimulator<'a> {
    /// Create a new simulator over `circuit`, all node values unknown
    pub fn new(circuit: &'a Circuit) -> Self {
        EventSimulator {
            values: vec![Value3::X; circuit.nb_nodes()],
            circuit,
            first_run: true,
        }
    }

    /// Current value of node `i`
    pub fn value(&self, i: usize) -> Value3 {
        self.values[i]
    }

    /// Current values at the primary outputs, in declared order
    pub fn outputs(&self) -> Vec<Value3> {
        self.circuit
            .outputs()
            .iter()
            .map(|&o| self.values[o])
            .collect()
    }

    fn eval_node(&self, i: usize) -> Value3 {
        let n = self.circuit.node(i);
        let fanin = n.fanin.iter().map(|&u| self.values[u]);
        match n.kind {
            NodeKind::Pi => self.values[i],
            NodeKind::Branch => self.values[n.fanin[0]],
            NodeKind::Not => !self.values[n.fanin[0]],
            NodeKind::And => Value3::and(fanin),
            NodeKind::Nand => !Value3::and(fanin),
            NodeKind::Or => Value3::or(fanin),
            NodeKind::Nor => !Value3::or(fanin),
            NodeKind::Xor => Value3::xor(fanin),
        }
    }

    /// Apply a new primary input assignment and propagate to a fixed point.
    ///
    /// Returns the primary output values after convergence. The first call
    /// always seeds every PI regardless of whether the value "changed" from
    /// the initial all-X state.
    pub fn apply(&mut self, pi_values: &[Value3]) -> Vec<Value3> {
        assert_eq!(pi_values.len(), self.circuit.nb_inputs());

        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut queued: FxHashSet<usize> = FxHashSet::default();
        for (k, &pi) in self.circuit.inputs().iter().enumerate() {
            let new_val = pi_values[k];
            if self.first_run || self.values[pi] != new_val {
                self.values[pi] = new_val;
                for &fo in &self.circuit.node(pi).fanout {
                    if queued.insert(fo) {
                        queue.push_back(fo);
                    }
                }
            }
        }
        self.first_run = false;

        // Pop in level order: cheaper than a priority queue since fanout levels
        // are always strictly greater than their source, so a FIFO seeded in
        // level order never needs to revisit a node before its fanin settles.
        let mut pending: Vec<usize> = queue.into_iter().collect();
        while !pending.is_empty() {
            pending.sort_by_key(|&i| self.circuit.node(i).level);
            let mut next = Vec::new();
            let mut next_set = FxHashSet::default();
            for i in pending {
                let new_val = self.eval_node(i);
                if new_val != self.values[i] {
                    self.values[i] = new_val;
                    for &fo in &self.circuit.node(i).fanout {
                        if next_set.insert(fo) {
                            next.push(fo);
                        }
                    }
                }
            }
            pending = next;
        }

        self.outputs()
    }
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
    fn test_and_gate() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::And, vec![0, 1]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let mut sim = EventSimulator::new(&circuit);
        let out = sim.apply(&[Value3::One, Value3::One]);
        assert_eq!(out, vec![Value3::One]);
        let out = sim.apply(&[Value3::One, Value3::Zero]);
        assert_eq!(out, vec![Value3::Zero]);
    }

    #[test]
    fn test_fixed_point_idempotent() {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::Xor, vec![0, 1]),
            node(4, NodeKind::Not, vec![2]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let mut sim = EventSimulator::new(&circuit);
        let out1 = sim.apply(&[Value3::One, Value3::Zero]);
        let out2 = sim.apply(&[Value3::One, Value3::Zero]);
        assert_eq!(out1, out2);
    }

    #[test]
    fn test_only_downstream_reevaluated() {
        // two independent AND gates; changing one input must not disturb the other's value
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::Pi, vec![]),
            node(4, NodeKind::And, vec![0, 1]),
            node(5, NodeKind::And, vec![1, 2]),
        ];
        wire(&mut nodes);
        let circuit = Circuit::from_nodes(nodes).unwrap();
        let mut sim = EventSimulator::new(&circuit);
        sim.apply(&[Value3::One, Value3::One, Value3::One]);
        assert_eq!(sim.value(4), Value3::One);
        sim.apply(&[Value3::Zero, Value3::One, Value3::One]);
        assert_eq!(sim.value(3), Value3::Zero);
        assert_eq!(sim.value(4), Value3::One);
    }
}
