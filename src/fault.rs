//! Stuck-at faults and checkpoint fault-list synthesis

use std::fmt;

use crate::circuit::Circuit;

/// The two stuck-at fault values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StuckAt {
    /// Stuck-at-0
    Zero,
    /// Stuck-at-1
    One,
}

impl fmt::Display for StuckAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StuckAt::Zero => write!(f, "0"),
            StuckAt::One => write!(f, "1"),
        }
    }
}

/// A single stuck-at fault, sited on a node by its internal arena index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fault {
    /// Node index the fault is sited on
    pub node: usize,
    /// Stuck-at value
    pub stuck: StuckAt,
}

/// Enumerate the checkpoint fault list: both stuck-at values on every
/// primary input and every fanout branch.
///
/// By the checkpoint theorem, this set is detection-equivalent to the full
/// structural stuck-at fault set; faults on internal gate outputs need not
/// be enumerated separately.
pub fn checkpoint_faults(circuit: &Circuit) -> Vec<Fault> {
    let mut faults = Vec::new();
    for (i, n) in circuit.nodes().iter().enumerate() {
        if n.kind.is_checkpoint() {
            faults.push(Fault {
                node: i,
                stuck: StuckAt::Zero,
            });
            faults.push(Fault {
                node: i,
                stuck: StuckAt::One,
            });
        }
    }
    faults
}
