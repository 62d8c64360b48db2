use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod analyze;
mod compare;
mod loader;
mod models;
mod record;
mod report;
mod stats;
mod verify;

/// Anchor-5 judge evaluation analysis - compare and aggregate judge-model
/// evaluations of question-answer pairs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two judge evaluation JSONL files by row identifier
    Compare {
        /// Path to judge A JSONL file
        #[arg(long)]
        judge_a: PathBuf,

        /// Path to judge B JSONL file
        #[arg(long)]
        judge_b: PathBuf,

        /// Output prefix for summary/report files (without extension)
        #[arg(long)]
        output_prefix: PathBuf,
    },
    /// Aggregate a single evaluation run over the fixed data layout
    Analyze,
    /// Check the expected analysis bundle exists and print headline metrics
    Verify,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match args.command {
        Command::Compare {
            judge_a,
            judge_b,
            output_prefix,
        } => {
            let summary = compare::compare_judges(&judge_a, &judge_b)?;
            let report = report::build_comparison_report(&summary);
            let (summary_path, report_path) =
                compare::write_outputs(&summary, &report, &output_prefix)?;
            println!("Wrote summary: {}", summary_path.display());
            println!("Wrote report: {}", report_path.display());
        }
        Command::Analyze => analyze::run()?,
        Command::Verify => verify::run()?,
    }
    Ok(())
}
