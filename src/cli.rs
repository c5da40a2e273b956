//! Command line interface
//!
//! Each logical operation (read a circuit, simulate patterns, run a fault
//! simulator, generate tests) is its own subcommand rather than a
//! persistent interactive prompt.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::atpg::dalg::dalg;
use crate::atpg::driver::{atpg_det, atpg_hybrid, rtg, Algorithm};
use crate::atpg::podem::podem;
use crate::circuit::Circuit;
use crate::error::EngineError;
use crate::fault::{checkpoint_faults, Fault, StuckAt};
use crate::io::{
    read_fault_file, read_netlist_file, read_pattern_file, write_fault_file, write_pattern_file,
    write_report,
};
use crate::sim::dfs::dfs;
use crate::sim::event::EventSimulator;
use crate::sim::pfs::pfs;
use crate::value::Value3;

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Read a circuit, levelize it and print its node table (READ + LEV + PC)
    Show(ShowArgs),
    /// Simulate a circuit over a pattern file (LOGICSIM)
    Logicsim(LogicsimArgs),
    /// Enumerate the checkpoint fault list (RFL)
    Rfl(RflArgs),
    /// Parallel fault simulation: which faults does a pattern set detect? (PFS)
    Pfs(PfsArgs),
    /// Deductive fault simulation (DFS)
    Dfs(DfsArgs),
    /// Random test generation with per-batch coverage reporting (RTG)
    Rtg(RtgArgs),
    /// Generate a single test pattern for one fault with PODEM
    Podem(SingleFaultArgs),
    /// Generate a single test pattern for one fault with the D-algorithm
    Dalg(SingleFaultArgs),
    /// Deterministic ATPG: PODEM or the D-algorithm on every checkpoint fault (ATPG_DET)
    AtpgDet(AtpgDetArgs),
    /// Hybrid ATPG: random patterns first, PODEM on the remainder (ATPG)
    Atpg(AtpgArgs),
}

fn load_circuit_or_exit(path: &PathBuf) -> Circuit {
    match read_netlist_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn find_node_by_id(circuit: &Circuit, id: u32) -> usize {
    match circuit.nodes().iter().position(|n| n.id == id) {
        Some(i) => i,
        None => {
            eprintln!("error: no node with id {id} in this circuit");
            std::process::exit(1);
        }
    }
}

/// Arguments shared by `show`
#[derive(Args)]
pub struct ShowArgs {
    /// Netlist file to read
    network: PathBuf,
}

impl ShowArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        print!("{circuit}");
    }
}

/// Arguments for `logicsim`
#[derive(Args)]
pub struct LogicsimArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Input pattern file
    #[arg(short = 'i', long)]
    input: PathBuf,
    /// Output file for primary output values, one row per input pattern
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl LogicsimArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let patterns = match std::fs::File::open(&self.input).map_err(EngineError::from).and_then(|f| read_pattern_file(f, &circuit)) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error reading {}: {e}", self.input.display());
                std::process::exit(1);
            }
        };

        let mut sim = EventSimulator::new(&circuit);
        let mut rows = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            let pi_values: Vec<Value3> = pattern.iter().map(|&b| Value3::from_bool(b)).collect();
            let outputs = sim.apply(&pi_values);
            rows.push(
                outputs
                    .iter()
                    .map(|v| v.as_bool().unwrap_or(false))
                    .collect::<Vec<bool>>(),
            );
        }

        let po_header: Vec<String> = circuit
            .outputs()
            .iter()
            .map(|&o| circuit.node(o).id.to_string())
            .collect();
        let mut out = match std::fs::File::create(&self.output) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error creating {}: {e}", self.output.display());
                std::process::exit(1);
            }
        };
        use std::io::Write;
        writeln!(out, "{}", po_header.join(",")).unwrap();
        for row in rows {
            let cells: Vec<&str> = row.iter().map(|&b| if b { "1" } else { "0" }).collect();
            writeln!(out, "{}", cells.join(",")).unwrap();
        }
    }
}

/// Arguments for `rfl`
#[derive(Args)]
pub struct RflArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Output fault list file
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl RflArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let faults = checkpoint_faults(&circuit);
        write_fault_list_or_exit(&self.output, &circuit, &faults);
    }
}

fn write_fault_list_or_exit(path: &PathBuf, circuit: &Circuit, faults: &[Fault]) {
    let mut f = match std::fs::File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error creating {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    write_fault_file(&mut f, circuit, faults).unwrap();
}

fn read_patterns_or_exit(path: &PathBuf, circuit: &Circuit) -> Vec<Vec<bool>> {
    match std::fs::File::open(path)
        .map_err(EngineError::from)
        .and_then(|f| read_pattern_file(f, circuit))
    {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// Arguments for `pfs`
#[derive(Args)]
pub struct PfsArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Input pattern file
    #[arg(short = 'i', long)]
    input: PathBuf,
    /// Input fault list file
    #[arg(short = 'f', long)]
    faults: PathBuf,
    /// Output file for the detected fault list
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl PfsArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let patterns = read_patterns_or_exit(&self.input, &circuit);
        let faults = match std::fs::File::open(&self.faults)
            .map_err(EngineError::from)
            .and_then(|f| read_fault_file(f, &circuit))
        {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error reading {}: {e}", self.faults.display());
                std::process::exit(1);
            }
        };
        let detected: Vec<Fault> = pfs(&circuit, &patterns, &faults).into_iter().collect();
        write_fault_list_or_exit(&self.output, &circuit, &detected);
    }
}

/// Arguments for `dfs`
#[derive(Args)]
pub struct DfsArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Input pattern file
    #[arg(short = 'i', long)]
    input: PathBuf,
    /// Output file for the detected fault list
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl DfsArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let patterns = read_patterns_or_exit(&self.input, &circuit);
        let mut detected = std::collections::HashSet::new();
        for pattern in &patterns {
            detected.extend(dfs(&circuit, pattern));
        }
        let detected: Vec<Fault> = detected.into_iter().collect();
        write_fault_list_or_exit(&self.output, &circuit, &detected);
    }
}

/// Arguments for `rtg`
#[derive(Args)]
pub struct RtgArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Total number of random patterns to generate
    #[arg(long)]
    ntot: usize,
    /// Number of patterns generated per batch before re-measuring coverage
    #[arg(long = "per-batch")]
    per_batch: usize,
    /// Output file for generated patterns
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Output file for the per-batch fault coverage progression
    #[arg(long = "fc-out")]
    fc_out: PathBuf,
    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl RtgArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let (patterns, fc_by_batch) = rtg(&circuit, self.ntot, self.per_batch, self.seed);
        let mut out = match std::fs::File::create(&self.output) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error creating {}: {e}", self.output.display());
                std::process::exit(1);
            }
        };
        write_pattern_file(&mut out, &circuit, &patterns).unwrap();

        let mut fc_out = match std::fs::File::create(&self.fc_out) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error creating {}: {e}", self.fc_out.display());
                std::process::exit(1);
            }
        };
        use std::io::Write;
        for fc in fc_by_batch {
            writeln!(fc_out, "{fc:.2}").unwrap();
        }
    }
}

/// Arguments shared by `podem` and `dalg`: a single fault by node id and stuck value
#[derive(Args)]
pub struct SingleFaultArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Node id the fault is sited on
    node: u32,
    /// Stuck-at value, 0 or 1
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    stuck: u8,
}

impl SingleFaultArgs {
    fn fault(&self, circuit: &Circuit) -> Fault {
        let node = find_node_by_id(circuit, self.node);
        let stuck = if self.stuck == 0 {
            StuckAt::Zero
        } else {
            StuckAt::One
        };
        Fault { node, stuck }
    }
}

impl SingleFaultArgs {
    /// Run `podem` for this fault
    pub fn run_podem(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let fault = self.fault(&circuit);
        match podem(&circuit, fault) {
            Ok(values) => print_test_pattern(&circuit, &values),
            Err(e) => report_generation_failure(e),
        }
    }

    /// Run `dalg` for this fault
    pub fn run_dalg(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let fault = self.fault(&circuit);
        match dalg(&circuit, fault) {
            Ok(values) => print_test_pattern(&circuit, &values),
            Err(e) => report_generation_failure(e),
        }
    }
}

fn print_test_pattern(circuit: &Circuit, values: &[crate::value::Value5]) {
    let bits: Vec<String> = circuit
        .inputs()
        .iter()
        .map(|&pi| {
            let v = values[pi];
            match v.good() {
                Some(b) => if b { "1" } else { "0" }.to_string(),
                None => "X".to_string(),
            }
        })
        .collect();
    println!("{}", bits.join(","));
}

fn report_generation_failure(e: EngineError) -> ! {
    eprintln!("{e}");
    std::process::exit(1);
}

/// Algorithm choice for `atpg-det`
#[derive(Clone, Copy, ValueEnum)]
pub enum AlgChoice {
    /// PODEM
    Podem,
    /// The D-algorithm
    Dalg,
}

/// Arguments for `atpg-det`
#[derive(Args)]
pub struct AtpgDetArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Which test generator to use
    #[arg(long = "alg", value_enum)]
    alg: AlgChoice,
    /// Output file for generated patterns
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Output file for the coverage report
    #[arg(long)]
    report: PathBuf,
    /// Random seed used to fill X-valued primary inputs
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl AtpgDetArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let alg = match self.alg {
            AlgChoice::Podem => Algorithm::Podem,
            AlgChoice::Dalg => Algorithm::Dalg,
        };
        let result = atpg_det(&circuit, alg, self.seed, Duration::from_secs(1));
        write_patterns_or_exit(&self.output, &circuit, &result.patterns);
        write_report_or_exit(&self.report, &result.report);
        if !result.timed_out.is_empty() {
            eprintln!("{} fault(s) timed out", result.timed_out.len());
        }
        if !result.untestable.is_empty() {
            eprintln!("{} fault(s) proven untestable", result.untestable.len());
        }
    }
}

/// Arguments for `atpg`
#[derive(Args)]
pub struct AtpgArgs {
    /// Netlist file to read
    network: PathBuf,
    /// Output file for generated patterns
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Output file for the coverage report
    #[arg(long)]
    report: PathBuf,
    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

impl AtpgArgs {
    /// Run the command
    pub fn run(&self) {
        let circuit = load_circuit_or_exit(&self.network);
        let result = atpg_hybrid(&circuit, self.seed, Duration::from_secs(1));
        write_patterns_or_exit(&self.output, &circuit, &result.patterns);
        write_report_or_exit(&self.report, &result.report);
    }
}

fn write_patterns_or_exit(path: &PathBuf, circuit: &Circuit, patterns: &[Vec<bool>]) {
    let mut f = match std::fs::File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error creating {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    write_pattern_file(&mut f, circuit, patterns).unwrap();
}

fn write_report_or_exit(path: &PathBuf, report: &crate::io::CoverageReport) {
    let mut f = match std::fs::File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error creating {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    write_report(&mut f, report).unwrap();
}
