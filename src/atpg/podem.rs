//! PODEM: Path-Oriented Decision Making test generation
//!
//! Decides only on primary input values; each decision is followed by a
//! full five-valued re-simulation of the circuit.

use std::time::{Duration, Instant};

use crate::atpg::{backtrace, d_frontier, pi_position, simulate5};
use crate::circuit::Circuit;
use crate::error::{EngineError, Result};
use crate::fault::{Fault, StuckAt};
use crate::value::Value5;

/// Default time budget per fault
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(1);

enum Objective {
    /// Assign `node` to `value`
    Assign(usize, bool),
    /// No objective could be found; the fault cannot be propagated from here
    Fail,
}

/// Run PODEM for a single fault. On success, returns the five-valued node
/// values of the last (successful) simulation; primary inputs still at X may
/// be filled with any concrete value.
pub struct Podem<'a> {
    circuit: &'a Circuit,
    fault: Fault,
    pi_values: Vec<Value5>,
    node_values: Vec<Value5>,
    deadline: Instant,
}

impl<'a> Podem<'a> {
    /// Create a new PODEM run for `fault`, with the given wall-clock budget
    pub fn new(circuit: &'a Circuit, fault: Fault, budget: Duration) -> Self {
        let pi_values = vec![Value5::X; circuit.nb_inputs()];
        let node_values = simulate5(circuit, &pi_values, fault);
        Podem {
            circuit,
            fault,
            pi_values,
            node_values,
            deadline: Instant::now() + budget,
        }
    }

    /// Run to completion, returning the node values of a detecting assignment
    pub fn run(&mut self) -> Result<Vec<Value5>> {
        if self.recurse()? {
            Ok(self.node_values.clone())
        } else {
            Err(EngineError::Untestable)
        }
    }

    fn any_po_discrepant(&self) -> bool {
        self.circuit
            .outputs()
            .iter()
            .any(|&po| self.node_values[po].is_discrepancy())
    }

    fn objective(&self) -> Objective {
        let site_value = self.node_values[self.fault.node];
        if site_value == Value5::X {
            let target = self.fault.stuck == StuckAt::Zero; // activate = !stuck
            return Objective::Assign(self.fault.node, target);
        }
        if !site_value.is_discrepancy() {
            // fault present but not yet excited at its own site: dead end
            return Objective::Fail;
        }
        let frontier = d_frontier(self.circuit, &self.node_values);
        if frontier.is_empty() {
            return Objective::Fail;
        }
        let g = frontier[0];
        let control = self.circuit.node(g).kind.controlling_value();
        let non_controlling = match control {
            Some(c) => !c,
            None => false, // XOR / non-controlling gates: either works, pick false
        };
        let u = self
            .circuit
            .node(g)
            .fanin
            .iter()
            .copied()
            .find(|&u| self.node_values[u] == Value5::X);
        match u {
            Some(u) => Objective::Assign(u, non_controlling),
            None => Objective::Fail,
        }
    }

    fn imply(&mut self, pi_node: usize, value: bool) {
        let k = pi_position(self.circuit, pi_node);
        self.pi_values[k] = Value5::from_bool(value);
        self.node_values = simulate5(self.circuit, &self.pi_values, self.fault);
    }

    fn unassign(&mut self, pi_node: usize) {
        let k = pi_position(self.circuit, pi_node);
        self.pi_values[k] = Value5::X;
        self.node_values = simulate5(self.circuit, &self.pi_values, self.fault);
    }

    fn recurse(&mut self) -> Result<bool> {
        if Instant::now() >= self.deadline {
            return Err(EngineError::Timeout);
        }
        if self.any_po_discrepant() {
            return Ok(true);
        }
        let (obj_node, obj_value) = match self.objective() {
            Objective::Assign(n, v) => (n, v),
            Objective::Fail => return Ok(false),
        };
        let (pi_node, pi_value) = backtrace(self.circuit, &self.node_values, obj_node, obj_value);

        self.imply(pi_node, pi_value);
        if self.recurse()? {
            return Ok(true);
        }
        self.imply(pi_node, !pi_value);
        if self.recurse()? {
            return Ok(true);
        }
        self.unassign(pi_node);
        Ok(false)
    }
}

/// Run PODEM for a single fault with the default time budget
pub fn podem(circuit: &Circuit, fault: Fault) -> Result<Vec<Value5>> {
    Podem::new(circuit, fault, DEFAULT_BUDGET).run()
}
