//! Dataset traversal, result aggregation and output records.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use docex_gateway::ModelGateway;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, DocexError};
use crate::models::document::DocumentType;
use crate::models::result::ProcessingResult;
use crate::retry::DocumentProcessor;

/// File extensions accepted for processing (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "pdf", "tiff", "bmp"];

/// Timestamp format used in output file names and summaries.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Check whether a path has a supported extension (case-insensitive).
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Recursively list supported files under a dataset directory, sorted by path.
pub fn discover_documents(dataset: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    if !dataset.exists() {
        return Err(ConfigError::DatasetNotFound(dataset.to_path_buf()));
    }
    if !dataset.is_dir() {
        return Err(ConfigError::NotADirectory(dataset.to_path_buf()));
    }

    let root = glob::Pattern::escape(&dataset.to_string_lossy());
    let pattern = format!("{}/**/*", root.trim_end_matches('/'));

    let entries = glob::glob(&pattern).map_err(|e| ConfigError::File {
        path: dataset.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    files.sort();

    debug!("Found {} supported files in {}", files.len(), dataset.display());
    Ok(files)
}

/// Collects terminal results of a batch in input order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<ProcessingResult>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ProcessingResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    pub fn results(&self) -> &[ProcessingResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ProcessingResult> {
        self.results
    }
}

/// Run every file through the processor, in order.
///
/// `cancel` is checked before each document; once set, the remaining files
/// are skipped and the results so far are returned. `on_result` sees each
/// result as soon as it is final.
pub async fn process_batch<G, F>(
    processor: &DocumentProcessor<G>,
    document_type: DocumentType,
    files: &[PathBuf],
    cancel: &AtomicBool,
    mut on_result: F,
) -> Result<ResultAggregator, ConfigError>
where
    G: ModelGateway,
    F: FnMut(&Path, &ProcessingResult),
{
    processor.ensure_ready(document_type)?;

    let mut aggregator = ResultAggregator::new();
    for (i, file) in files.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            warn!("Cancelled, skipping {} remaining files", files.len() - i);
            break;
        }

        info!("Processing [{}/{}]: {}", i + 1, files.len(), file.display());
        let result = processor
            .process_document(document_type, Some(file))
            .await?
            .with_source(file);

        on_result(file, &result);
        aggregator.push(result);
    }

    Ok(aggregator)
}

/// Header of an output record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    pub document_type: DocumentType,
    pub dataset_directory: String,
    pub total_files: usize,
    pub successful_extractions: usize,
    pub failed_extractions: usize,
    pub timestamp: String,
    pub custom_prompt_used: bool,
    pub custom_prompt_name: Option<String>,
}

/// Everything written for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub processing_summary: ProcessingSummary,
    pub results: Vec<ProcessingResult>,
}

impl OutputRecord {
    pub fn new(
        document_type: DocumentType,
        dataset: &Path,
        custom_prompt_name: Option<&str>,
        aggregator: ResultAggregator,
        at: DateTime<Local>,
    ) -> Self {
        let processing_summary = ProcessingSummary {
            document_type,
            dataset_directory: dataset_name(dataset),
            total_files: aggregator.total(),
            successful_extractions: aggregator.successful(),
            failed_extractions: aggregator.failed(),
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            custom_prompt_used: custom_prompt_name.is_some(),
            custom_prompt_name: custom_prompt_name.map(str::to_string),
        };

        Self {
            processing_summary,
            results: aggregator.into_results(),
        }
    }

    /// `<type>_<dataset>[_custom_<name>]_<timestamp>.json`
    pub fn file_name(&self) -> String {
        let summary = &self.processing_summary;
        let mut parts = vec![
            summary.document_type.to_string(),
            summary.dataset_directory.clone(),
        ];
        if let Some(name) = &summary.custom_prompt_name {
            parts.push(format!("custom_{name}"));
        }
        parts.push(summary.timestamp.clone());
        format!("{}.json", parts.join("_"))
    }

    /// Write as pretty JSON into `output_dir`, creating it if needed.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, DocexError> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(self.file_name());
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        info!("Results saved to {}", path.display());
        Ok(path)
    }
}

fn dataset_name(dataset: &Path) -> String {
    dataset
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}
