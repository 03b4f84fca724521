//! Extract command - process every supported file in a dataset directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use docex_core::batch::SUPPORTED_EXTENSIONS;
use docex_core::{DocumentType, OutputRecord, ProcessingResult, discover_documents, process_batch};

use super::{build_processor, build_registry, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Document type (driving_license, shop_receipt, resume)
    #[arg(short = 't', long = "type")]
    document_type: String,

    /// Dataset directory, searched recursively
    #[arg(short, long)]
    dataset: PathBuf,

    /// Custom prompt text file replacing the generated prompt
    #[arg(short = 'p', long)]
    custom_prompt: Option<PathBuf>,

    /// Output directory (default: output.output_dir from the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write a per-file summary CSV next to the JSON record
    #[arg(long)]
    summary: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let document_type: DocumentType = args.document_type.parse()?;
    let (registry, custom_name) = build_registry(document_type, args.custom_prompt.as_deref())?;

    let files = discover_documents(&args.dataset)?;
    if files.is_empty() {
        println!(
            "{} No supported files found in {}",
            style("ℹ").blue(),
            args.dataset.display()
        );
        println!(
            "Supported extensions: {}",
            SUPPORTED_EXTENSIONS.map(|ext| format!(".{ext}")).join(", ")
        );
        return Ok(());
    }

    let processor = build_processor(&config, registry)?;

    if let Some(path) = &args.custom_prompt {
        println!(
            "{} Using custom prompt from: {}",
            style("ℹ").blue(),
            path.display()
        );
    }
    println!(
        "{} Found {} supported files to process",
        style("ℹ").blue(),
        files.len()
    );
    println!("{} Document type: {}", style("ℹ").blue(), document_type);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let aggregator = process_batch(&processor, document_type, &files, &cancel, |path, result| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if result.is_success() {
            pb.println(format!("  {} {}", style("✓").green(), name));
        } else {
            pb.println(format!(
                "  {} {}: {}",
                style("✗").red(),
                name,
                result.error_message().unwrap_or("unknown error")
            ));
        }
        pb.inc(1);
    })
    .await?;
    pb.finish_and_clear();

    if cancel.load(Ordering::SeqCst) {
        println!(
            "{} Operation cancelled by user, saving {} processed files.",
            style("!").yellow(),
            aggregator.total()
        );
    }

    let record = OutputRecord::new(
        document_type,
        &args.dataset,
        custom_name.as_deref(),
        aggregator,
        Local::now(),
    );
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.output.output_dir.clone());
    let output_path = record.write(&output_dir)?;

    if args.summary || config.output.summary_csv {
        let summary_path = output_path.with_extension("csv");
        write_summary(&summary_path, &record.results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let summary = &record.processing_summary;
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        summary.total_files,
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(summary.successful_extractions).green(),
        style(summary.failed_extractions).red()
    );
    println!(
        "{} Results saved to: {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessingResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file_name", "file_path", "status", "error"])?;
    for result in results {
        let status = if result.is_success() { "success" } else { "error" };
        wtr.write_record([
            result.file_name().unwrap_or(""),
            result.file_path().unwrap_or(""),
            status,
            result.error_message().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let results = vec![
            ProcessingResult::failure(DocumentType::Resume, "", "Failed after 3 attempts. Last error: x")
                .with_source(Path::new("data/cv.png")),
        ];

        write_summary(&path, &results).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "file_name,file_path,status,error\ncv.png,data/cv.png,error,Failed after 3 attempts. Last error: x\n"
        );
    }
}
