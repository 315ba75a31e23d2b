//! pliegue CLI - group-aware k-fold splitting from the command line
//!
//! Command-line interface for loading, cleaning and splitting datasets.

use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand, ValueEnum};

mod basic;
mod folds;

/// pliegue - Group-aware k-fold cross-validation for Arrow datasets
#[derive(Parser)]
#[command(name = "pliegue")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display dataset information
    Info {
        /// Path to dataset file (CSV or Parquet)
        path: PathBuf,
    },
    /// Display dataset schema
    Schema {
        /// Path to dataset file (CSV or Parquet)
        path: PathBuf,
    },
    /// Show how groups and rows fall into folds
    Folds {
        #[command(flatten)]
        split: SplitArgs,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Write the train and test set of every fold to disk
    Export {
        #[command(flatten)]
        split: SplitArgs,
        /// Directory receiving fold_<k>_train / fold_<k>_test files
        #[arg(short, long)]
        output_dir: PathBuf,
        /// File format of the written folds
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        output_format: OutputFormat,
    },
}

/// Input, cleaning and splitting options shared by `folds` and `export`.
#[derive(Args, Debug, Clone)]
pub(crate) struct SplitArgs {
    /// Path to dataset file (CSV or Parquet)
    pub(crate) path: PathBuf,
    /// Column holding the group label of each row
    #[arg(short, long)]
    pub(crate) group: String,
    /// Number of folds
    #[arg(short = 'k', long, default_value_t = crate::split::DEFAULT_N_SPLITS)]
    pub(crate) n_splits: usize,
    /// Drop rows with nulls in these columns, named as in the input file,
    /// e.g. `--drop-nulls=TailNum,ArrDelay` (all columns if given bare)
    #[arg(long, num_args = 0.., value_delimiter = ',', require_equals = true)]
    pub(crate) drop_nulls: Option<Vec<String>>,
    /// Rename a column before splitting, as old=new (repeatable)
    #[arg(long, value_parser = parse_rename)]
    pub(crate) rename: Vec<(String, String)>,
    /// CSV field delimiter
    #[arg(long)]
    pub(crate) delimiter: Option<char>,
}

/// How fold reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
    /// Human-readable table
    Text,
    /// Pretty-printed JSON
    Json,
}

/// File format for exported folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Comma-separated values
    Csv,
    /// Apache Parquet
    Parquet,
}

impl OutputFormat {
    pub(crate) fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

fn parse_rename(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((old, new)) if !old.is_empty() && !new.is_empty() => {
            Ok((old.to_string(), new.to_string()))
        }
        _ => Err(format!("expected old=new, got '{value}'")),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

/// Run the pliegue CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Info { path } => basic::cmd_info(&path),
        Commands::Schema { path } => basic::cmd_schema(&path),
        Commands::Folds { split, format } => folds::cmd_folds(&split, format),
        Commands::Export {
            split,
            output_dir,
            output_format,
        } => folds::cmd_export(&split, &output_dir, output_format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
