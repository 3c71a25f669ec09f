// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All workflow logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `prepare` runs the data pipeline and saves its artifacts
//   2. `inspect` shows one window from a prepared pipeline
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, InspectArgs, PrepareArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mortality-seq",
    version,
    about = "Turn daily mortality counts into windowed, standardised RNN batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing data from: {}", args.source);
    let artifacts_dir = args.artifacts_dir.clone();
    let summaries     = PrepareUseCase::new(args.into()).execute()?;

    println!("{:<12}{:>8}{:>10}{:>10}  first batch", "split", "rows", "windows", "batches");
    for s in &summaries {
        println!(
            "{:<12}{:>8}{:>10}{:>10}  {:?}",
            s.split, s.rows, s.windows, s.batches, s.first_batch_shape
        );
    }
    println!("Artifacts saved to '{}'.", artifacts_dir);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let report = InspectUseCase::new(args.artifacts_dir)?.window(args.split.into(), args.index)?;
    let sample = &report.sample;

    println!(
        "{} window {}/{} (rows {}..{})",
        report.split,
        report.index,
        report.windows,
        sample.start,
        sample.start + sample.seq_len
    );
    println!("{:>6}{}", "step", report.columns.iter().map(|c| format!("{c:>14}")).collect::<String>());
    for t in 0..sample.seq_len {
        let row: String = sample.step(t).iter().map(|v| format!("{v:>14.4}")).collect();
        println!("{:>6}{}", t, row);
    }
    println!("target: {}", sample.target);
    Ok(())
}
