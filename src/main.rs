use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use datapivot::{apply_transformations, Dataset, Settings};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "datapivot")]
#[command(about = "Turn tabular rows and a data pivot settings document into render-ready JSON", long_about = None)]
struct Args {
    /// Row data: a JSON array of objects, or a CSV file with a header row
    data: PathBuf,

    /// Settings document (JSON)
    settings: PathBuf,

    /// Data format; inferred from the file extension when omitted
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

fn infer_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
        _ => InputFormat::Json,
    }
}

fn load_dataset(path: &Path, format: InputFormat) -> Result<Dataset> {
    match format {
        InputFormat::Csv => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Dataset::from_csv(file)
        }
        InputFormat::Json => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Dataset::from_json_str(&text)
        }
    }
    .with_context(|| format!("Failed to load rows from {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let format = args.format.unwrap_or_else(|| infer_format(&args.data));
    let dataset = load_dataset(&args.data, format)?;
    debug!(rows = dataset.len(), ?format, "rows loaded");

    let text = fs::read_to_string(&args.settings)
        .with_context(|| format!("Failed to read {}", args.settings.display()))?;
    let settings = Settings::from_json_str(&text).context("Failed to parse settings")?;

    let output = apply_transformations(&dataset, &settings);
    info!(rows = output.rows.len(), "rendered");

    let json = if args.pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .context("Failed to serialize render data")?;

    // Write JSON to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
