//! Waterfall - Entry Point

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use waterfall::config::{
    apply_cli_overrides, apply_env_overrides, load_config_with_precedence, merge_config,
};
use waterfall::model::AppError;

/// Output format for the layout report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Waterfall - replay masonry layout event scripts
#[derive(Parser, Debug)]
#[command(name = "waterfall")]
#[command(version)]
#[command(about = "Replay a JSONL event script through an incremental masonry layout engine")]
pub struct Args {
    /// Path to JSONL event script (reads from stdin if not provided)
    pub script: Option<PathBuf>,

    /// Number of columns (1 to 1024)
    #[arg(short, long, allow_negative_numbers = true)]
    pub columns: Option<i64>,

    /// Gap between items and columns in pixels
    #[arg(short, long, allow_negative_numbers = true)]
    pub gap: Option<i64>,

    /// Column width in pixels
    #[arg(long, allow_negative_numbers = true)]
    pub column_width: Option<i64>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = load_config_with_precedence(args.config.clone())?;
        let merged = merge_config(config_file);
        let with_env = apply_env_overrides(merged);
        apply_cli_overrides(with_env, args.columns, args.gap, args.column_width)
    };

    waterfall::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let settings = config.engine_settings();
    // Reject bad layout values before touching the input.
    settings.validate()?;

    let mut source = waterfall::source::detect_script_source(args.script.clone())?;
    let lines = source.read_lines()?;
    info!(lines = lines.len(), "Script read");

    let report = waterfall::replay::replay_script(settings, lines)?;

    match args.format {
        ReportFormat::Text => println!("{report}"),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
