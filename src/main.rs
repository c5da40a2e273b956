//! Binary front end for stapgen

#![warn(missing_docs)]

use clap::Parser;
use stapgen::cli::{Cli, Commands};

#[doc(hidden)]
fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Show(a) => a.run(),
        Commands::Logicsim(a) => a.run(),
        Commands::Rfl(a) => a.run(),
        Commands::Pfs(a) => a.run(),
        Commands::Dfs(a) => a.run(),
        Commands::Rtg(a) => a.run(),
        Commands::Podem(a) => a.run_podem(),
        Commands::Dalg(a) => a.run_dalg(),
        Commands::AtpgDet(a) => a.run(),
        Commands::Atpg(a) => a.run(),
    }
}
