// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `prepare` and `inspect`, and
// all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::prepare_use_case::PrepareConfig;
use crate::data::module::{default_drop_columns, default_missing_markers, DataModuleConfig};
use crate::domain::split::Split;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, clean, split, scale and window the CSV; save artifacts
    Prepare(PrepareArgs),

    /// Print one window of a split using saved artifacts
    Inspect(InspectArgs),
}

/// All arguments for the `prepare` command.
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// CSV file with daily counts per region
    #[arg(long, default_value = "data/train_trendency.csv")]
    pub source: String,

    /// Directory for data_config.json, scaler.json and split_summary.json
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,

    /// Number of consecutive days in one input window
    #[arg(long, default_value_t = 1)]
    pub seq_len: usize,

    /// Windows per batch
    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Threads prefetching batches in parallel (0 = none)
    #[arg(long, default_value_t = 0)]
    pub num_workers: usize,

    /// Fraction of the latest rows held out as test
    #[arg(long, default_value_t = 0.10)]
    pub test_fraction: f64,

    /// Fraction of the remaining latest rows held out as validation
    #[arg(long, default_value_t = 0.05)]
    pub val_fraction: f64,

    #[arg(long, default_value = "Date")]
    pub date_column: String,

    #[arg(long, default_value = "Province_State")]
    pub region_column: String,

    /// Column whose next-day value is the prediction target
    #[arg(long, default_value = "Deaths")]
    pub target_column: String,

    /// Columns removed before training (comma separated)
    #[arg(long, value_delimiter = ',', default_values_t = default_drop_columns())]
    pub drop_columns: Vec<String>,

    /// Let windows run across region boundaries
    #[arg(long)]
    pub global_windows: bool,
}

/// Convert CLI PrepareArgs into the application-layer PrepareConfig.
/// The application layer never sees clap types.
impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            data: DataModuleConfig {
                source_path:       a.source,
                seq_len:           a.seq_len,
                batch_size:        a.batch_size,
                num_workers:       a.num_workers,
                test_fraction:     a.test_fraction,
                val_fraction:      a.val_fraction,
                date_column:       a.date_column,
                region_column:     a.region_column,
                target_column:     a.target_column,
                drop_columns:      a.drop_columns,
                missing_markers:   default_missing_markers(),
                segment_by_region: !a.global_windows,
            },
            artifacts_dir: a.artifacts_dir,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SplitArg {
    Train,
    Val,
    Test,
}

impl From<SplitArg> for Split {
    fn from(s: SplitArg) -> Self {
        match s {
            SplitArg::Train => Split::Train,
            SplitArg::Val   => Split::Validation,
            SplitArg::Test  => Split::Test,
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory a previous `prepare` wrote to
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: String,

    #[arg(long, value_enum, default_value_t = SplitArg::Train)]
    pub split: SplitArg,

    /// Window index within the split
    #[arg(long, default_value_t = 0)]
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_prepare_defaults_match_data_module_defaults() {
        let cli = Cli::try_parse_from(["mortality-seq", "prepare"]).unwrap();
        let Commands::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        let cfg: PrepareConfig = args.into();
        assert_eq!(cfg.data, DataModuleConfig::default());
        assert_eq!(cfg.artifacts_dir, "artifacts");
    }

    #[test]
    fn test_prepare_flags() {
        let cli = Cli::try_parse_from([
            "mortality-seq", "prepare",
            "--seq-len", "14",
            "--num-workers", "4",
            "--drop-columns", "Active,Recovered",
            "--global-windows",
        ])
        .unwrap();
        let Commands::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };
        let cfg: PrepareConfig = args.into();
        assert_eq!(cfg.data.seq_len, 14);
        assert_eq!(cfg.data.num_workers, 4);
        assert_eq!(cfg.data.drop_columns, vec!["Active", "Recovered"]);
        assert!(!cfg.data.segment_by_region);
    }

    #[test]
    fn test_inspect_split_names() {
        let cli = Cli::try_parse_from(["mortality-seq", "inspect", "--split", "val", "--index", "2"]).unwrap();
        let Commands::Inspect(args) = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(Split::from(args.split), Split::Validation);
        assert_eq!(args.index, 2);
    }
}
