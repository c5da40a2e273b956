//! IO for the coverage report file: four fixed text lines.

use std::io::Write;

use crate::error::Result;

/// A fault coverage report, as produced by `atpg-det`/`atpg`.
pub struct CoverageReport {
    /// Name of the algorithm used (`"PODEM"`, `"DALG"`, or a hybrid label)
    pub algorithm: String,
    /// Circuit name, taken from the netlist file stem
    pub circuit: String,
    /// Detected faults over total enumerated faults, as a percentage
    pub fault_coverage: f64,
    /// Wall-clock time taken, in seconds
    pub time_seconds: f64,
}

impl CoverageReport {
    /// Build a report from detected/total fault counts
    pub fn new(algorithm: impl Into<String>, circuit: impl Into<String>, detected: usize, total: usize, time_seconds: f64) -> Self {
        let fault_coverage = if total == 0 {
            100.0
        } else {
            detected as f64 * 100.0 / total as f64
        };
        CoverageReport {
            algorithm: algorithm.into(),
            circuit: circuit.into(),
            fault_coverage,
            time_seconds,
        }
    }
}

/// Write the report as four fixed lines:
/// ```text
/// Algorithm: PODEM
/// Circuit: c17
/// Fault Coverage: 95.45%
/// Time: 0.12 seconds
/// ```
pub fn write_report<W: Write>(w: &mut W, report: &CoverageReport) -> Result<()> {
    writeln!(w, "Algorithm: {}", report.algorithm)?;
    writeln!(w, "Circuit: {}", report.circuit)?;
    writeln!(w, "Fault Coverage: {:.2}%", report.fault_coverage)?;
    writeln!(w, "Time: {:.2} seconds", report.time_seconds)?;
    Ok(())
}
