use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use crate::diagnostics::Severity;
use crate::diagram::DiagramModel;
use crate::{Error, Export, ExportContext, config, export, output};

/// Generate a PostgreSQL create script from a database diagram
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the diagram snapshot (JSON)
    pub input: PathBuf,

    /// Output SQL file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Fail without writing anything if the diagram has warnings
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Run one export as described by `args`.
///
/// # Errors
///
/// Returns `Error` for unreadable input or configuration, an invalid
/// snapshot, a failed write, or warnings under `--deny-warnings`.
pub fn run(args: &Args) -> Result<Export, Error> {
    info!(
        input_path = args.input.display().to_string(),
        output_path = args.output.as_ref().map(|p| p.display().to_string());
        "Processing diagram"
    );

    let config = config::load_config(args.config.as_deref())?;
    let source = fs::read_to_string(&args.input)?;
    let model = DiagramModel::from_json(&source)?;

    let mut context = ExportContext::now();
    if let Some(name) = args.output.as_ref().and_then(|p| p.file_name()) {
        context = context.with_source_name(name.to_string_lossy());
    }

    let export = export(&model, &config, &context);

    let denied = export.diagnostics.count_at_least(Severity::Warning);
    if denied > 0 {
        warn!(count = denied; "Diagram has warnings");
        if args.deny_warnings {
            return Err(Error::DeniedDiagnostics { count: denied });
        }
    }

    match &args.output {
        Some(path) => {
            output::write_atomic(path, &export.sql)?;
            info!(output_file = path.display().to_string(); "SQL exported successfully");
        }
        None => io::stdout().write_all(export.sql.as_bytes())?,
    }

    Ok(export)
}
