//! Whole-pipeline checks against the ISCAS c17 benchmark, read from its
//! "self"-format text the way a real netlist file would be.

use std::time::Duration;

use stapgen::atpg::dalg::dalg;
use stapgen::atpg::driver::{atpg_det, atpg_hybrid, rtg, Algorithm};
use stapgen::atpg::podem::podem;
use stapgen::fault::{checkpoint_faults, Fault, StuckAt};
use stapgen::io::{read_netlist, read_pattern_file, write_pattern_file};
use stapgen::sim::dfs::dfs;
use stapgen::sim::event::EventSimulator;
use stapgen::sim::pfs::pfs;
use stapgen::value::Value3;

// PIs {1,2,3,6,7}, POs {22,23}
//   10 = NAND(1,3)  11 = NAND(3,6)  16 = NAND(2,11)
//   19 = NAND(11,7) 22 = NAND(10,16) 23 = NAND(16,19)
const C17: &str = "\
1    1    0    1    0
1    2    0    1    0
1    3    0    2    0
1    6    0    2    0
1    7    0    1    0
3    22   6    0    2    10   16
3    23   6    0    2    16   19
0    10   6    1    2    1    3
0    11   6    2    2    3    6
0    16   6    1    2    2    11
0    19   6    1    2    11   7
";

fn c17() -> stapgen::circuit::Circuit {
    read_netlist(C17.as_bytes()).unwrap()
}

#[test]
fn test_netlist_has_expected_shape() {
    let circuit = c17();
    assert_eq!(circuit.nb_inputs(), 5);
    assert_eq!(circuit.nb_outputs(), 2);
    assert_eq!(circuit.nb_nodes(), 11);
}

#[test]
fn test_event_sim_matches_hand_computed_outputs() {
    let circuit = c17();
    // 1=0 2=0 3=0 6=0 7=0 -> all NANDs of zeros are 1 -> 10=11=1,
    // 16=NAND(2=0,11=1)=1, 19=NAND(11=1,7=0)=1, 22=NAND(10=1,16=1)=0,
    // 23=NAND(16=1,19=1)=0
    let mut sim = EventSimulator::new(&circuit);
    let inputs = vec![Value3::Zero; 5];
    let outputs = sim.apply(&inputs);
    assert_eq!(outputs, vec![Value3::Zero, Value3::Zero]);
}

#[test]
fn test_checkpoint_fault_count() {
    // This netlist text has no explicit branch (role 2) records, so the
    // only checkpoints are its 5 primary inputs: 10 faults.
    let circuit = c17();
    let faults = checkpoint_faults(&circuit);
    assert_eq!(faults.len(), 10);
}

#[test]
fn test_pattern_file_round_trip() {
    let circuit = c17();
    let patterns = vec![vec![false, false, false, false, false], vec![true; 5]];
    let mut buf = Vec::new();
    write_pattern_file(&mut buf, &circuit, &patterns).unwrap();
    let reread = read_pattern_file(buf.as_slice(), &circuit).unwrap();
    assert_eq!(reread, patterns);
}

#[test]
fn test_pfs_and_dfs_agree_on_fault_coverage() {
    let circuit = c17();
    let faults = checkpoint_faults(&circuit);
    let patterns: Vec<Vec<bool>> = vec![
        vec![false, false, false, false, false],
        vec![true, true, true, true, true],
        vec![true, false, true, false, true],
        vec![false, true, false, true, false],
    ];

    let pfs_detected = pfs(&circuit, &patterns, &faults);

    let mut dfs_detected = std::collections::HashSet::new();
    for p in &patterns {
        dfs_detected.extend(dfs(&circuit, p));
    }
    let dfs_detected: std::collections::HashSet<Fault> = dfs_detected
        .into_iter()
        .filter(|f| faults.contains(f))
        .collect();

    assert_eq!(pfs_detected, dfs_detected);
    assert!(!pfs_detected.is_empty());
}

#[test]
fn test_podem_and_dalg_each_detect_their_target_fault() {
    let circuit = c17();
    for &fault in &checkpoint_faults(&circuit) {
        let podem_values = podem(&circuit, fault).unwrap();
        assert!(circuit
            .outputs()
            .iter()
            .any(|&po| podem_values[po].is_discrepancy()));

        let dalg_values = dalg(&circuit, fault).unwrap();
        assert!(circuit
            .outputs()
            .iter()
            .any(|&po| dalg_values[po].is_discrepancy()));
    }
}

#[test]
fn test_atpg_det_reaches_high_coverage_on_c17() {
    let circuit = c17();
    let result = atpg_det(&circuit, Algorithm::Podem, 1, Duration::from_secs(5));
    assert!(result.timed_out.is_empty());
    assert!(
        result.report.fault_coverage >= 95.0,
        "coverage was {}",
        result.report.fault_coverage
    );
}

#[test]
fn test_atpg_hybrid_reaches_full_coverage_on_c17() {
    let circuit = c17();
    let result = atpg_hybrid(&circuit, 1, Duration::from_secs(5));
    assert_eq!(result.report.fault_coverage, 100.0);
}

#[test]
fn test_rtg_batches_cover_requested_total_and_improve_monotonically() {
    let circuit = c17();
    let (patterns, fc_by_batch) = rtg(&circuit, 40, 10, 7);
    assert_eq!(patterns.len(), 40);
    assert_eq!(fc_by_batch.len(), 4);
    for w in fc_by_batch.windows(2) {
        assert!(w[1] >= w[0]);
    }
}

#[test]
fn test_stuck_at_one_on_output_is_detected_by_complementary_inputs() {
    let circuit = c17();
    let fault = Fault {
        node: circuit.output(0),
        stuck: StuckAt::One,
    };
    let patterns = vec![vec![false; 5], vec![true; 5]];
    let detected = pfs(&circuit, &patterns, &[fault]);
    assert!(detected.contains(&fault));
}
