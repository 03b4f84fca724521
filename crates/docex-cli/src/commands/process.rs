//! Process command - extract fields from a single document file.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docex_core::DocumentType;

use super::{build_processor, build_registry, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Document type (driving_license, shop_receipt, resume)
    #[arg(short = 't', long = "type")]
    document_type: String,

    /// Custom prompt text file replacing the generated prompt
    #[arg(short = 'p', long)]
    custom_prompt: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let document_type: DocumentType = args.document_type.parse()?;

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let (registry, _) = build_registry(document_type, args.custom_prompt.as_deref())?;
    let processor = build_processor(&config, registry)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Extracting {}...", document_type));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = processor
        .process_document(document_type, Some(&args.input))
        .await?
        .with_source(&args.input);

    pb.finish_and_clear();

    let output = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if result.is_success() {
        eprintln!(
            "{} Extracted {} in {:?}",
            style("✓").green(),
            document_type,
            start.elapsed()
        );
    } else {
        eprintln!(
            "{} Extraction failed: {}",
            style("✗").red(),
            result.error_message().unwrap_or("unknown error")
        );
    }

    Ok(())
}
