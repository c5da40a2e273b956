//! File formats: the "self" netlist format, pattern files, fault files and
//! the coverage report.

mod faults;
mod netlist;
mod patterns;
mod report;

use std::fs::File;
use std::path::Path;

pub use faults::{read_fault_file, write_fault_file};
pub use netlist::{read_netlist, write_netlist};
pub use patterns::{read_pattern_file, write_pattern_file};
pub use report::{write_report, CoverageReport};

use crate::circuit::Circuit;
use crate::error::Result;

/// Read a circuit from a "self"-format netlist file, naming it after the
/// file stem (used only for coverage-report cosmetics).
pub fn read_netlist_file(path: &Path) -> Result<Circuit> {
    let f = File::open(path)?;
    let mut circuit = read_netlist(f)?;
    circuit.name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    Ok(circuit)
}
