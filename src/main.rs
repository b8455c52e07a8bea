//! # ms-ksat
//!
//! Command-line front end for the Monien–Speckenmeyer branching solver. It reads
//! CNF formulas in DIMACS format (from a file, a directory of files, or text given
//! on the command line), or generates uniform random k-SAT instances, decides
//! them, verifies any model found and prints a statistics table followed by
//! `SATISFIABLE`, `UNSATISFIABLE` or `UNKNOWN` (when `--timeout` stops the search).
//!
//! ```sh
//! ms-ksat problem.cnf
//! ms-ksat file --path problem.cnf --print-solution
//! ms-ksat text --input "1 -2 0\n2 3 0"
//! ms-ksat dir --path benchmarks/ --stats false
//! ms-ksat random -n 30 -m 128 -k 3 --seed 7 --timeout 10
//! ms-ksat completions bash
//! ```
//!
//! For a single instance the exit status is 10 for SAT, 20 for UNSAT, 0 when
//! undecided and 1 on errors. Logging goes to stderr through `tracing`; set
//! `--debug` (or `RUST_LOG=ms_ksat=debug`) to see every branching decision.

use clap::Parser;
use command_line::cli::{Cli, init_logging, run};
use std::process::ExitCode;

mod command_line;

/// Global allocator using `tikv-jemallocator`, which also backs the memory figures
/// in the statistics table.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug());

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
