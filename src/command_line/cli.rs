#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, bail};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use ms_ksat::sat::assignment::Solutions;
use ms_ksat::sat::branching::{Branching, BranchingOptions};
use ms_ksat::sat::cnf::Cnf;
use ms_ksat::sat::dimacs::{parse_file, parse_text};
use ms_ksat::sat::error::SolveError;
use ms_ksat::sat::generator::random_ksat;
use ms_ksat::sat::solver::{CancellationToken, SolutionStats, Solver};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Defines the command-line interface of the solver.
#[derive(Parser, Debug)]
#[command(
    name = "ms-ksat",
    version,
    about = "Exact Monien-Speckenmeyer branching solver for k-SAT",
    args_conflicts_with_subcommands = true
)]
pub(crate) struct Cli {
    /// Path to a DIMACS .cnf file, solved when no subcommand is given.
    pub path: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub common: CommonOptions,
}

impl Cli {
    /// Whether `--debug` was given, at top level or on the chosen subcommand.
    pub(crate) const fn debug(&self) -> bool {
        match &self.command {
            Some(
                Commands::File { common, .. }
                | Commands::Text { common, .. }
                | Commands::Dir { common, .. }
                | Commands::Random { common, .. },
            ) => common.debug,
            Some(Commands::Completions { .. }) | None => self.common.debug,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a CNF file in DIMACS format.
    File {
        /// Path to the DIMACS .cnf file.
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a CNF formula provided as plain text.
    Text {
        /// Literal CNF input as a string (e.g. "1 -2 0\n2 3 0").
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.cnf` file below a directory.
    Dir {
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate a uniform random k-SAT instance and solve it.
    Random {
        /// Number of variables `n`.
        #[arg(short = 'n', long, default_value_t = 20)]
        vars: usize,

        /// Number of clauses `m`.
        #[arg(short = 'm', long, default_value_t = 85)]
        clauses: usize,

        /// Clause width `k`.
        #[arg(short = 'k', long, default_value_t = 3)]
        width: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Also write the generated instance to this DIMACS file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by every solving command.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Check the model against the formula before reporting SAT.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) verify: bool,

    /// Print the problem and search statistics table.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    pub(crate) stats: bool,

    /// Print the satisfying assignment if the formula is satisfiable.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Stop the search after this many seconds and report UNKNOWN.
    #[arg(short, long)]
    pub(crate) timeout: Option<u64>,
}

/// Final answer for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

impl Verdict {
    /// SAT competition exit status: 10 for SAT, 20 for UNSAT, 0 when undecided.
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Satisfiable => 10,
            Self::Unsatisfiable => 20,
            Self::Unknown => 0,
        }
    }

    pub(crate) fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Outcome of a single solver run.
#[derive(Debug, Clone)]
pub(crate) struct Report {
    pub(crate) verdict: Verdict,
    pub(crate) solutions: Option<Solutions>,
    pub(crate) elapsed: Duration,
    pub(crate) stats: SolutionStats,
}

/// Installs the `tracing` subscriber. `RUST_LOG` wins over `--debug`.
pub(crate) fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Dispatches the parsed command line.
///
/// # Errors
///
/// Input that cannot be read or parsed, a model that fails verification, or a
/// broken solver invariant.
pub(crate) fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        None => {
            let Some(path) = cli.path else {
                bail!("no input given; use --help for more information");
            };
            solve_path(&path, &cli.common)
        }
        Some(Commands::File { path, common }) => solve_path(&path, &common),
        Some(Commands::Text { input, common }) => {
            let time = Instant::now();
            let cnf = parse_text(&input).context("failed to parse CNF text")?;
            let report = solve_and_report(&cnf, &common, None, time.elapsed())?;
            Ok(report.verdict.exit_code())
        }
        Some(Commands::Dir { path, common }) => {
            solve_dir(&path, &common)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Random {
            vars,
            clauses,
            width,
            seed,
            output,
            common,
        }) => {
            let time = Instant::now();
            let cnf = random_ksat(vars, clauses, width, seed)?;
            if let Some(output) = output {
                std::fs::write(&output, cnf.to_string())
                    .with_context(|| format!("unable to write {}", output.display()))?;
                info!(path = %output.display(), "instance written");
            }
            let report = solve_and_report(&cnf, &common, None, time.elapsed())?;
            Ok(report.verdict.exit_code())
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn solve_path(path: &Path, common: &CommonOptions) -> anyhow::Result<ExitCode> {
    let time = Instant::now();
    let cnf = parse_file(path).with_context(|| format!("failed to parse {}", path.display()))?;
    let report = solve_and_report(&cnf, common, Some(path), time.elapsed())?;
    Ok(report.verdict.exit_code())
}

/// Solves every `.cnf` file below `path`, in directory walk order.
///
/// # Errors
///
/// If `path` is not a directory, or any instance fails to parse or solve.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("provided path is not a directory: {}", path.display());
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "cnf") {
            warn!(path = %file_path.display(), "skipping non-CNF file");
            continue;
        }
        solve_path(file_path, common)?;
    }

    Ok(())
}

/// Runs the branching solver on `cnf`, honouring `--timeout`.
///
/// # Errors
///
/// A broken formula invariant reported by the solver.
pub(crate) fn solve(
    cnf: &Cnf,
    label: Option<&Path>,
    common: &CommonOptions,
) -> anyhow::Result<Report> {
    if let Some(name) = label {
        println!("Solving: {}", name.display());
    }
    info!(
        vars = cnf.num_vars(),
        clauses = cnf.num_clauses(),
        width = cnf.width(),
        "solving"
    );

    let token = CancellationToken::new();
    // Dropping `_done` on return wakes the timer so it exits without cancelling.
    let _done = common.timeout.map(|secs| {
        let (done, wait) = mpsc::channel::<()>();
        let timer = token.clone();
        std::thread::spawn(move || {
            let waited = wait.recv_timeout(Duration::from_secs(secs));
            if waited == Err(mpsc::RecvTimeoutError::Timeout) {
                timer.cancel();
            }
        });
        done
    });

    let options = BranchingOptions {
        cancel: Some(token),
    };
    let mut solver = Branching::with_options(cnf.clone(), options);

    let time = Instant::now();
    let result = solver.solve();
    let elapsed = time.elapsed();

    let (verdict, solutions) = match result {
        Ok(Some(sol)) => (Verdict::Satisfiable, Some(sol)),
        Ok(None) => (Verdict::Unsatisfiable, None),
        Err(SolveError::Cancelled) => {
            warn!(?elapsed, "search cancelled by timeout");
            (Verdict::Unknown, None)
        }
        Err(e @ SolveError::Formula(_)) => {
            return Err(anyhow::Error::new(e).context("solver invariant broken"));
        }
    };
    info!(?verdict, ?elapsed, "solved");

    Ok(Report {
        verdict,
        solutions,
        elapsed,
        stats: solver.stats(),
    })
}

/// Checks a model against the formula.
///
/// # Errors
///
/// If some clause has no literal in `sol`.
pub(crate) fn verify_solution(cnf: &Cnf, sol: Option<&Solutions>) -> anyhow::Result<()> {
    if let Some(sol_values) = sol {
        let ok = cnf.verify(sol_values);
        println!("Verified: {ok:?}");
        if !ok {
            bail!("solution failed verification");
        }
    }
    Ok(())
}

/// Allocated and resident memory in MiB, as reported by jemalloc.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::read().ok()?;
    let resident = stats::resident::read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Solves, verifies and prints the report for one instance.
///
/// # Errors
///
/// See [`solve`] and [`verify_solution`].
pub(crate) fn solve_and_report(
    cnf: &Cnf,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> anyhow::Result<Report> {
    let report = solve(cnf, label, common)?;

    if common.verify {
        verify_solution(cnf, report.solutions.as_ref())?;
    }

    if common.stats {
        print_stats(parse_time, cnf, &report, memory_usage());
    }

    if common.print_solution {
        if let Some(solutions) = &report.solutions {
            println!("Solutions: {solutions}");
        }
    }

    println!("\n{}", verdict_line(report.verdict));
    Ok(report)
}

pub(crate) const fn verdict_line(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Satisfiable => "SATISFIABLE",
        Verdict::Unsatisfiable => "UNSATISFIABLE",
        Verdict::Unknown => "UNKNOWN",
    }
}

pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Like [`stat_line`], with a per-second rate.
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints the problem and search statistics table.
pub(crate) fn print_stats(
    parse_time: Duration,
    cnf: &Cnf,
    report: &Report,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = report.elapsed.as_secs_f64();
    let s = &report.stats;

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables (n)", cnf.num_vars());
    stat_line("Clauses (m)", cnf.num_clauses());
    stat_line("Clause width (k)", cnf.width());
    stat_line("Literals", cnf.num_literals());

    println!("========================[ Search Statistics ]========================");
    stat_line_with_rate("Nodes", s.nodes, elapsed_secs);
    stat_line_with_rate("Branches", s.branches, elapsed_secs);
    stat_line_with_rate("Dead ends", s.dead_ends, elapsed_secs);
    stat_line("Max depth", s.max_depth);
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
