//! Prompt command - print the prompt sent for a document type.

use std::path::PathBuf;

use clap::Args;

use docex_core::{DocumentRegistry, DocumentType};

/// Arguments for the prompt command.
#[derive(Args)]
pub struct PromptArgs {
    /// Document type (driving_license, shop_receipt, resume)
    document_type: String,

    /// Show this custom prompt file instead of the generated prompt
    #[arg(short = 'p', long)]
    custom_prompt: Option<PathBuf>,
}

pub async fn run(args: PromptArgs) -> anyhow::Result<()> {
    let document_type: DocumentType = args.document_type.parse()?;

    let mut registry = DocumentRegistry::builtin();
    if let Some(path) = &args.custom_prompt {
        registry.load_custom_prompt(document_type, path)?;
    }

    println!("{}", registry.get(document_type)?.prompt);
    Ok(())
}
