//! The D-algorithm: test generation by direct five-valued implication
//!
//! Unlike PODEM, decisions are made directly on internal signal values, not
//! only on primary inputs; each decision is justified recursively back to
//! the primary inputs before the D-frontier is advanced further.
//!
//! `decisions[i]` always holds the *fault-free* target value for node `i`
//! (never a D/D̄ symbol): the fault site's discrepancy is produced uniformly
//! by `forward_eval`'s fault injection, the same way PODEM's `simulate5`
//! does it. This keeps every accepted decision grounded in an actual PI
//! assignment rather than asserting a discrepancy no pattern could produce.

use std::time::{Duration, Instant};

use crate::atpg::{d_frontier, eval_node5, inject_fault};
use crate::circuit::{Circuit, NodeKind};
use crate::error::{EngineError, Result};
use crate::fault::Fault;
use crate::value::Value5;

/// Default time budget per fault
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(1);

/// A single D-algorithm run for one fault
pub struct Dalg<'a> {
    circuit: &'a Circuit,
    fault: Fault,
    decisions: Vec<Option<Value5>>,
    values: Vec<Value5>,
    deadline: Instant,
}

impl<'a> Dalg<'a> {
    /// Create a new D-algorithm run for `fault`, with the given wall-clock budget
    pub fn new(circuit: &'a Circuit, fault: Fault, budget: Duration) -> Self {
        let n = circuit.nb_nodes();
        Dalg {
            circuit,
            fault,
            decisions: vec![None; n],
            values: vec![Value5::X; n],
            deadline: Instant::now() + budget,
        }
    }

    /// Run to completion, returning the node values of a detecting assignment
    pub fn run(&mut self) -> Result<Vec<Value5>> {
        // Activation: justify the fault site to hold its fault-free excitation
        // value. For a branch this forces its single fanin; for a primary
        // input it is a direct decision.
        let activation = self.fault.stuck == crate::fault::StuckAt::Zero;
        let mut trail = Vec::new();
        let activated = if self.circuit.node(self.fault.node).kind == NodeKind::Pi {
            self.decisions[self.fault.node] = Some(Value5::from_bool(activation));
            trail.push(self.fault.node);
            true
        } else {
            self.justify_fanins_for_output(self.fault.node, activation, &mut trail)
        };
        if !activated {
            self.rollback(&trail);
            return Err(EngineError::Untestable);
        }

        if self.recurse()? {
            Ok(self.values.clone())
        } else {
            Err(EngineError::Untestable)
        }
    }

    /// Forward-propagate every decision to a fixed point, detecting contradictions
    fn forward_eval(&self) -> std::result::Result<Vec<Value5>, ()> {
        let mut values = vec![Value5::X; self.circuit.nb_nodes()];
        for &i in self.circuit.order() {
            let n = self.circuit.node(i);
            let raw = if n.kind == NodeKind::Pi {
                self.decisions[i].unwrap_or(Value5::X)
            } else {
                let fanin = n.fanin.iter().map(|&u| values[u]);
                eval_node5(n.kind, fanin)
            };
            let raw = if i == self.fault.node {
                inject_fault(raw, self.fault.stuck)
            } else {
                raw
            };
            values[i] = match self.decisions[i] {
                Some(d) => {
                    let want = if i == self.fault.node {
                        inject_fault(d, self.fault.stuck)
                    } else {
                        d
                    };
                    if raw != Value5::X && raw != want {
                        return Err(());
                    }
                    want
                }
                None => raw,
            };
        }
        Ok(values)
    }

    fn any_po_discrepant(&self) -> bool {
        self.circuit
            .outputs()
            .iter()
            .any(|&po| self.values[po].is_discrepancy())
    }

    /// Force `node`'s fanins so that its own (fault-free) output equals
    /// `target`, recursing toward primary inputs. Does not touch
    /// `decisions[node]` itself.
    fn justify_fanins_for_output(&mut self, node: usize, target: bool, trail: &mut Vec<usize>) -> bool {
        let kind = self.circuit.node(node).kind;
        let fanin = self.circuit.node(node).fanin.clone();
        match kind {
            NodeKind::Pi => true,
            NodeKind::Branch => self.justify(fanin[0], target, trail),
            NodeKind::Not => self.justify(fanin[0], !target, trail),
            NodeKind::And => {
                if target {
                    fanin.iter().all(|&u| self.justify(u, true, trail))
                } else {
                    self.justify_any(&fanin, false, trail)
                }
            }
            NodeKind::Nand => {
                if target {
                    self.justify_any(&fanin, false, trail)
                } else {
                    fanin.iter().all(|&u| self.justify(u, true, trail))
                }
            }
            NodeKind::Or => {
                if target {
                    self.justify_any(&fanin, true, trail)
                } else {
                    fanin.iter().all(|&u| self.justify(u, false, trail))
                }
            }
            NodeKind::Nor => {
                if target {
                    fanin.iter().all(|&u| self.justify(u, false, trail))
                } else {
                    self.justify_any(&fanin, true, trail)
                }
            }
            NodeKind::Xor => {
                let rest_ok = fanin[1..].iter().all(|&u| self.justify(u, false, trail));
                rest_ok && self.justify(fanin[0], target, trail)
            }
        }
    }

    /// Justify `node` itself to `target`, recording the decision once its
    /// fanins (if any) have been successfully justified.
    fn justify(&mut self, node: usize, target: bool, trail: &mut Vec<usize>) -> bool {
        if let Some(d) = self.decisions[node] {
            return d == Value5::from_bool(target);
        }
        let ok = self.justify_fanins_for_output(node, target, trail);
        if ok {
            self.decisions[node] = Some(Value5::from_bool(target));
            trail.push(node);
        }
        ok
    }

    /// Justify at least one fanin to `target`, trying each in turn and
    /// rolling back a failed attempt before trying the next.
    fn justify_any(&mut self, fanin: &[usize], target: bool, trail: &mut Vec<usize>) -> bool {
        for &u in fanin {
            let mut local_trail = Vec::new();
            if self.justify(u, target, &mut local_trail) {
                trail.extend(local_trail);
                return true;
            }
            self.rollback(&local_trail);
        }
        false
    }

    fn rollback(&mut self, trail: &[usize]) {
        for &node in trail {
            self.decisions[node] = None;
        }
    }

    fn recurse(&mut self) -> Result<bool> {
        if Instant::now() >= self.deadline {
            return Err(EngineError::Timeout);
        }
        self.values = match self.forward_eval() {
            Ok(v) => v,
            Err(()) => return Ok(false),
        };
        if self.any_po_discrepant() {
            return Ok(true);
        }
        let frontier = d_frontier(self.circuit, &self.values);
        if frontier.is_empty() {
            return Ok(false);
        }
        for &g in &frontier {
            let control = self.circuit.node(g).kind.controlling_value();
            let non_controlling = match control {
                Some(c) => !c,
                None => false,
            };
            let undetermined: Vec<usize> = self
                .circuit
                .node(g)
                .fanin
                .iter()
                .copied()
                .filter(|&u| !self.values[u].is_discrepancy())
                .collect();
            let mut trail = Vec::new();
            let mut all_ok = true;
            for u in undetermined {
                if !self.justify(u, non_controlling, &mut trail) {
                    all_ok = false;
                    break;
                }
            }
            if all_ok && self.recurse()? {
                return Ok(true);
            }
            self.rollback(&trail);
        }
        Ok(false)
    }
}

/// Run the D-algorithm for a single fault with the default time budget
pub fn dalg(circuit: &Circuit, fault: Fault) -> Result<Vec<Value5>> {
    Dalg::new(circuit, fault, DEFAULT_BUDGET).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Node;
    use crate::fault::StuckAt;
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

    fn c17() -> Circuit {
        let mut nodes = vec![
            node(1, NodeKind::Pi, vec![]),
            node(2, NodeKind::Pi, vec![]),
            node(3, NodeKind::Pi, vec![]),
            node(6, NodeKind::Pi, vec![]),
            node(7, NodeKind::Pi, vec![]),
            node(10, NodeKind::Nand, vec![0, 2]),
            node(11, NodeKind::Nand, vec![2, 3]),
            node(16, NodeKind::Nand, vec![1, 6]),
            node(19, NodeKind::Nand, vec![6, 4]),
            node(22, NodeKind::Nand, vec![7, 5]),
            node(23, NodeKind::Nand, vec![7, 8]),
        ];
        wire(&mut nodes);
        Circuit::from_nodes(nodes).unwrap()
    }

    #[test]
    fn test_dalg_finds_detecting_pattern() {
        let circuit = c17();
        let fault = Fault { node: 5, stuck: StuckAt::Zero };
        let values = dalg(&circuit, fault).unwrap();
        assert!(circuit.outputs().iter().any(|&po| values[po].is_discrepancy()));
    }

    #[test]
    fn test_dalg_pattern_detected_by_pfs() {
        let circuit = c17();
        let fault = Fault { node: 5, stuck: StuckAt::Zero };
        let values = dalg(&circuit, fault).unwrap();
        let pattern: Vec<bool> = circuit
            .inputs()
            .iter()
            .map(|&pi| values[pi].good().unwrap_or(false))
            .collect();
        let detected = pfs(&circuit, &[pattern], &[fault]);
        assert!(detected.contains(&fault));
    }

    #[test]
    fn test_dalg_output_fault_detected() {
        let circuit = c17();
        let fault = Fault { node: 9, stuck: StuckAt::One };
        let values = dalg(&circuit, fault).unwrap();
        let pattern: Vec<bool> = circuit
            .inputs()
            .iter()
            .map(|&pi| values[pi].good().unwrap_or(false))
            .collect();
        let detected = pfs(&circuit, &[pattern], &[fault]);
        assert!(detected.contains(&fault));
    }
}
