// Entry point and high-level CLI flow.
//
// - Option [1] uploads a weekly booking workbook and keeps the results.
// - Option [2] shows the summaries of the last successful upload.
// - Option [3] exports them as CSV files and a JSON summary.
// A failed upload prints the error and leaves earlier results in place.
mod dashboard;
mod error;
mod extract;
mod output;
mod reader;
mod reports;
mod schema;
mod trend;
mod types;
mod util;

use anyhow::{bail, Context};
use clap::Parser;
use dashboard::Dashboard;
use once_cell::sync::Lazy;
use reader::SheetMatching;
use reports::AnalysisOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use trend::PredictionPolicy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Results of the last successful upload, shared between menu actions.
static APP_STATE: Lazy<Mutex<Dashboard>> = Lazy::new(|| Mutex::new(Dashboard::default()));

#[derive(Parser)]
#[command(name = "chargesense")]
#[command(about = "Weekly school-transport booking insights", long_about = None)]
struct Cli {
    /// Workbook (.xlsx, .xls or .csv) to load on start
    #[arg(long)]
    file: Option<PathBuf>,

    /// Per-student prediction: `ratio` or the older `regression`
    #[arg(long, default_value = "ratio")]
    policy: PredictionPolicy,

    /// Accept long day names (Monday, Tues, ...) and trim sheet/column names
    #[arg(long)]
    lenient_sheets: bool,

    /// Rows in the top spenders table
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Directory for exported reports
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Load, print and export once, without the menu
    #[arg(long, requires = "file")]
    batch: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn state() -> MutexGuard<'static, Dashboard> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to go back to the menu. `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        match read_line("Back to menu (Y/N): ").to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_upload(path: &Path) {
    println!("Parsing {}...", path.display());
    let mut dash = state();
    let result = dash.upload_path(path);
    match result {
        Ok(()) => {
            if let Some(insights) = dash.insights() {
                println!(
                    "{} ({} booking rows, {} bus services)\n",
                    dash.status(),
                    util::format_int(insights.students.len()),
                    insights.bus_usage.len()
                );
            }
        }
        Err(_) => eprintln!("{}\n", dash.status()),
    }
}

fn handle_show(top: usize) {
    let dash = state();
    if dash.is_loading() {
        println!("Loading data...\n");
        return;
    }
    match dash.insights() {
        Some(insights) => output::print_insights(insights, top),
        None => println!("Error: No data loaded. Please upload a file first (option 1).\n"),
    }
}

fn handle_export(dir: &Path) {
    let dash = state();
    let Some(insights) = dash.insights() else {
        println!("Error: No data loaded. Please upload a file first (option 1).\n");
        return;
    };
    match output::export_all(dir, insights) {
        Ok(paths) => {
            for p in paths {
                println!("Wrote {}", p.display());
            }
            println!();
        }
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn run_batch(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = cli.file.as_deref() else {
        bail!("--batch needs --file");
    };
    let mut dash = state();
    dash.upload_path(path)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to load {}", path.display()))?;
    let Some(insights) = dash.insights() else {
        bail!("upload produced no results");
    };
    output::print_insights(insights, cli.top);
    let written = output::export_all(&cli.out_dir, insights)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to export to {}", cli.out_dir.display()))?;
    println!("Reports written to {} ({} files).", cli.out_dir.display(), written.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let options = AnalysisOptions {
        policy: cli.policy,
        matching: if cli.lenient_sheets {
            SheetMatching::Lenient
        } else {
            SheetMatching::Exact
        },
    };
    *state() = Dashboard::new(options);

    if cli.batch {
        return run_batch(&cli);
    }
    if let Some(path) = cli.file.as_deref() {
        handle_upload(path);
    }

    loop {
        println!("ChargeSense: weekly booking insights");
        println!("[1] Upload a workbook");
        println!("[2] Show summaries");
        println!("[3] Export reports");
        println!("[4] Exit\n");
        match read_line("Enter choice: ").as_str() {
            "1" => {
                let input = read_line("Path to .xlsx, .xls or .csv: ");
                if input.is_empty() {
                    println!("{}\n", dashboard::MSG_NO_FILE);
                    continue;
                }
                handle_upload(Path::new(&input));
            }
            "2" => {
                println!();
                handle_show(cli.top);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => handle_export(&cli.out_dir),
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
    Ok(())
}
