//! Circuit representation: a levelized arena of gates
//!
//! The graph is built once by the netlist reader and reused, read-only, by
//! every simulator and test generator. Fanin and fanout are stored as plain
//! indices into the node arena, never as pointers.

use std::fmt;

use crate::error::{EngineError, Result};

/// Kind of a node in the gate graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Primary input
    Pi,
    /// Fanout branch: a virtual single-fanin node inserted after any signal
    /// with more than one consumer, giving each consumer its own fault site
    Branch,
    /// Exclusive or
    Xor,
    /// Or
    Or,
    /// Nor
    Nor,
    /// Inverter
    Not,
    /// Nand
    Nand,
    /// And
    And,
}

impl NodeKind {
    /// Whether this kind is a checkpoint (PI or fanout branch) per the checkpoint theorem
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, NodeKind::Pi | NodeKind::Branch)
    }

    /// The controlling input value for this gate kind, if any (false for AND/NAND, true for OR/NOR)
    pub fn controlling_value(&self) -> Option<bool> {
        match self {
            NodeKind::And | NodeKind::Nand => Some(false),
            NodeKind::Or | NodeKind::Nor => Some(true),
            _ => None,
        }
    }

    /// Whether the gate inverts its natural output (NAND, NOR, NOT)
    pub fn inverting(&self) -> bool {
        matches!(self, NodeKind::Nand | NodeKind::Nor | NodeKind::Not)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Pi => "PI",
            NodeKind::Branch => "BRCH",
            NodeKind::Xor => "XOR",
            NodeKind::Or => "OR",
            NodeKind::Nor => "NOR",
            NodeKind::Not => "NOT",
            NodeKind::Nand => "NAND",
            NodeKind::And => "AND",
        };
        write!(f, "{s}")
    }
}

/// A single node in the gate graph
#[derive(Debug, Clone)]
pub struct Node {
    /// External id, as given by the netlist
    pub id: u32,
    /// Gate kind
    pub kind: NodeKind,
    /// Fanin node indices, in netlist order; empty for PI
    pub fanin: Vec<usize>,
    /// Fanout node indices; empty for a primary output
    pub fanout: Vec<usize>,
    /// Level assigned by the leveler: 0 for PI, 1+max(fanin levels) otherwise
    pub level: i32,
}

/// A levelized gate graph
///
/// Built once by the netlist reader and reused across every command. The
/// node arena never changes once `levelize` has run; per-command scratch
/// state (simulation values, fault annotations) lives in the simulator or
/// test-generator structs that borrow a `&Circuit`.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    /// Optional circuit name, carried from the netlist file stem for reports
    pub name: Option<String>,
    nodes: Vec<Node>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    /// Evaluation order: node indices sorted by level ascending, set by `levelize`
    order: Vec<usize>,
}

impl Circuit {
    /// Number of nodes in the arena
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Node at index i
    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    /// All nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Index of the i-th primary input
    pub fn input(&self, i: usize) -> usize {
        self.inputs[i]
    }

    /// All primary input indices, in declaration order
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Index of the i-th primary output
    pub fn output(&self, i: usize) -> usize {
        self.outputs[i]
    }

    /// All primary output indices, in declaration order
    pub fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    /// Evaluation order: node indices sorted by ascending level
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Whether node `i` is a primary output (no fanout)
    pub fn is_output(&self, i: usize) -> bool {
        self.nodes[i].fanout.is_empty()
    }

    /// Build a circuit from a flat node list; PIs and POs are derived from kind/fanout.
    ///
    /// `nodes` must already carry symmetric fanin/fanout adjacency (every fanin
    /// reference has a matching fanout reference, and vice versa). This is the
    /// contract the netlist reader fulfills; `levelize` then populates `level`
    /// and `order`.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Circuit> {
        let inputs = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Pi)
            .map(|(i, _)| i)
            .collect();
        let mut circuit = Circuit {
            name: None,
            nodes,
            inputs,
            outputs: Vec::new(),
            order: Vec::new(),
        };
        circuit.outputs = (0..circuit.nb_nodes()).filter(|&i| circuit.is_output(i)).collect();
        circuit.check()?;
        circuit.levelize()?;
        Ok(circuit)
    }

    /// Check structural invariants: index consistency, symmetric adjacency,
    /// no dangling fanin/fanout references
    pub fn check(&self) -> Result<()> {
        for (i, n) in self.nodes.iter().enumerate() {
            for &u in &n.fanin {
                if u >= self.nodes.len() {
                    return Err(EngineError::InternalInvariant(format!(
                        "node {i} references out-of-range fanin {u}"
                    )));
                }
                if !self.nodes[u].fanout.contains(&i) {
                    return Err(EngineError::InternalInvariant(format!(
                        "fanin {u} of node {i} does not list {i} as a fanout"
                    )));
                }
            }
            for &d in &n.fanout {
                if d >= self.nodes.len() {
                    return Err(EngineError::InternalInvariant(format!(
                        "node {i} references out-of-range fanout {d}"
                    )));
                }
                if !self.nodes[d].fanin.contains(&i) {
                    return Err(EngineError::InternalInvariant(format!(
                        "fanout {d} of node {i} does not list {i} as a fanin"
                    )));
                }
            }
            if n.kind == NodeKind::Pi && !n.fanin.is_empty() {
                return Err(EngineError::InternalInvariant(format!(
                    "PI node {i} has fanin"
                )));
            }
            if n.kind != NodeKind::Pi && n.fanin.is_empty() {
                return Err(EngineError::InternalInvariant(format!(
                    "gate node {i} has no fanin"
                )));
            }
            if (n.kind == NodeKind::Branch || n.kind == NodeKind::Not) && n.fanin.len() != 1 {
                return Err(EngineError::InternalInvariant(format!(
                    "node {i} of kind {} must have exactly one fanin",
                    n.kind
                )));
            }
        }
        Ok(())
    }

    /// Iterative fixed-point levelization: PI level 0, otherwise
    /// 1 + max(fanin levels). Also populates the level-ascending evaluation order.
    ///
    /// Fails with `InternalInvariantError` if a full scan makes no further
    /// progress (a combinational cycle).
    pub fn levelize(&mut self) -> Result<()> {
        let n = self.nodes.len();
        for node in &mut self.nodes {
            node.level = if node.kind == NodeKind::Pi { 0 } else { -1 };
        }
        let mut remaining = n;
        // PIs are already levelled; subtract them up front.
        for node in &self.nodes {
            if node.kind == NodeKind::Pi {
                remaining -= 1;
            }
        }
        while remaining > 0 {
            let mut progressed = false;
            for i in 0..n {
                if self.nodes[i].level != -1 {
                    continue;
                }
                let mut max_fanin_level = -1;
                let mut ready = true;
                for &u in &self.nodes[i].fanin {
                    if self.nodes[u].level == -1 {
                        ready = false;
                        break;
                    }
                    max_fanin_level = max_fanin_level.max(self.nodes[u].level);
                }
                if ready {
                    self.nodes[i].level = max_fanin_level + 1;
                    remaining -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                return Err(EngineError::InternalInvariant(
                    "unable to levelize circuit: combinational cycle detected".to_string(),
                ));
            }
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.nodes[i].level);
        self.order = order;
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit{} with {} inputs, {} outputs, {} nodes:",
            self.name
                .as_ref()
                .map(|n| format!(" {n}"))
                .unwrap_or_default(),
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_nodes()
        )?;
        for (i, n) in self.nodes.iter().enumerate() {
            writeln!(
                f,
                "\t{i} (id={}) = {} lvl={} fanin={:?} fanout={:?}",
                n.id, n.kind, n.level, n.fanin, n.fanout
            )?;
        }
        Ok(())
    }
}
