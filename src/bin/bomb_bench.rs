use bomb_bench::compare::Comparator;
use bomb_bench::config::BenchConfig;
use bomb_bench::ledger::Ledger;
use bomb_bench::report::{self, Style};
use bomb_bench::schema::{FamilyComparison, RunMeta, SessionReport};
use bomb_bench::session;
use bomb_bench::{Family, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare baseline and submission for one problem family.
    Bench {
        #[arg(value_enum)]
        family: Family,

        /// Problem size class passed to the generator (S|M|L).
        #[arg(long)]
        size: Option<String>,

        /// Generator seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Baseline executable; overrides the config.
        #[arg(long, value_name = "PATH")]
        baseline: Option<PathBuf>,

        /// Submission executable; overrides the config.
        #[arg(long, value_name = "PATH")]
        submission: Option<PathBuf>,

        /// Run the generator twice first and require identical instances.
        #[arg(long, default_value_t = false)]
        verify_instance: bool,

        /// Also write a JSON report here.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Benchmark every family, perlin first.
    Suite {
        #[arg(long)]
        size: Option<String>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = false)]
        verify_instance: bool,

        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Benchmark every family and append the speedups to the ledger.
    Save {
        /// Problem size class.
        size: Option<String>,

        /// Free-text annotation for the record.
        note: Option<String>,

        #[arg(long)]
        seed: Option<u64>,

        /// Run the configured aggregate command and scrape its `Speedup:` lines
        /// instead of benchmarking in-process.
        #[arg(long, default_value_t = false)]
        via_command: bool,

        #[arg(long, default_value_t = false)]
        verify_instance: bool,
    },

    /// Show every ledger record.
    Show,

    /// Compare the first and latest ledger records.
    Compare,

    #[command(external_subcommand)]
    Other(Vec<String>),
}

#[derive(Parser, Debug)]
#[command(name = "bomb-bench")]
#[command(about = "Baseline-vs-submission speedup runner and performance ledger")]
struct Args {
    /// JSON config file; defaults match the problem repository layout.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ledger file; overrides the config.
    #[arg(long, global = true, value_name = "FILE")]
    ledger: Option<PathBuf>,

    /// Disable ANSI colors in reports.
    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Option<Command>,
}

fn write_report(path: &Path, report: &SessionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

fn print_usage() -> Result<()> {
    Args::command().print_help()?;
    println!();
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut cfg = BenchConfig::load_or_default(args.config.as_deref())?;
    if let Some(ledger) = args.ledger {
        cfg.ledger = ledger;
    }
    let style = if args.no_color {
        Style::plain()
    } else {
        Style::default()
    };

    let Some(cmd) = args.cmd else {
        return print_usage();
    };

    match cmd {
        Command::Bench {
            family,
            size,
            seed,
            baseline,
            submission,
            verify_instance,
            out,
        } => {
            let size = size.unwrap_or_else(|| cfg.size.clone());
            let seed = seed.unwrap_or(cfg.seed);
            let fam = cfg.family_mut(family);
            if let Some(path) = baseline {
                fam.baseline = path;
            }
            if let Some(path) = submission {
                fam.submission = path;
            }

            let comparator = Comparator::new().verify_instance(verify_instance);
            let result = session::run_family(&cfg, &comparator, family, &size, seed)?;
            print!("{}", report::render_comparison(&result, style));

            if let Some(out) = out {
                let report = SessionReport {
                    run: RunMeta::now(&size, seed),
                    comparisons: vec![FamilyComparison { family, result }],
                };
                write_report(&out, &report)?;
            }
        }
        Command::Suite {
            size,
            seed,
            verify_instance,
            out,
        } => {
            let size = size.unwrap_or_else(|| cfg.size.clone());
            let seed = seed.unwrap_or(cfg.seed);
            let comparator = Comparator::new().verify_instance(verify_instance);

            let outcome = session::run_session(&cfg, &comparator, &size, seed, |family, result| {
                println!("[{}]", family.as_str());
                println!("{}", report::render_comparison(result, style));
            })?;

            if let Some(out) = out {
                write_report(&out, &outcome.to_report())?;
            }
        }
        Command::Save {
            size,
            note,
            seed,
            via_command,
            verify_instance,
        } => {
            let size = size.unwrap_or_else(|| cfg.size.clone());
            let seed = seed.unwrap_or(cfg.seed);
            let note = note.unwrap_or_default();

            let mut ledger = Ledger::open_file(&cfg.ledger);

            let saved = if via_command {
                session::save_scraped(&mut ledger, &cfg.aggregate(&size, seed)?, &size, &note)?
            } else {
                let comparator = Comparator::new().verify_instance(verify_instance);
                session::save_session(
                    &mut ledger,
                    &cfg,
                    &comparator,
                    &size,
                    seed,
                    &note,
                    |family, result| {
                        println!("[{}]", family.as_str());
                        println!("{}", report::render_comparison(result, style));
                    },
                )?
            };
            print!("{}", report::render_saved(saved.record_number, &saved.record));
        }
        Command::Show => {
            let records = Ledger::open_file(&cfg.ledger).list_all()?;
            print!("{}", report::render_history(&records));
        }
        Command::Compare => {
            let progress = Ledger::open_file(&cfg.ledger).compare_extremes()?;
            print!("{}", report::render_progress(&progress, style));
        }
        Command::Other(argv) => {
            if let Some(name) = argv.first() {
                println!("Unknown command: {name}");
            }
            return print_usage();
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[error] {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
