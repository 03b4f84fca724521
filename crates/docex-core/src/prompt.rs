//! Prompt rendering.
//!
//! The core prompt is a pure function of the schema and a per-document
//! [`PromptProfile`]: same inputs, same text. Attempt-specific context (OCR
//! text, the previous attempt's error) is appended after the core prompt and
//! never changes it.

use serde_json::Value;

use crate::schema::Schema;
use crate::schema::dates::DATE_FORMAT_LABEL;

/// Document-specific wording of the extraction prompt.
#[derive(Debug)]
pub struct PromptProfile {
    /// Plural noun used in the role framing, e.g. "driving licenses".
    pub documents: &'static str,
    /// Singular noun for the physical document, e.g. "license".
    pub document: &'static str,
    /// Extra numbered rules as (title, text), inserted before the output rule.
    pub rules: &'static [(&'static str, &'static str)],
    /// Literal example output.
    pub example: &'static str,
}

const DATE_RULE: (&str, &str) = (
    "Date Formatting",
    "All dates must be in `MM/DD/YYYY` format (e.g., 01/15/1990, 12/31/2025).",
);

pub static DRIVING_LICENSE_PROMPT: PromptProfile = PromptProfile {
    documents: "driving licenses",
    document: "license",
    rules: &[
        DATE_RULE,
        (
            "Name Extraction",
            "Extract the full name exactly as it appears, maintaining original capitalization and spacing.",
        ),
        (
            "License Numbers",
            "Extract the complete license/ID number including all letters, numbers, and hyphens.",
        ),
    ],
    example: r#"{
  "name": "JOHN MICHAEL SMITH",
  "date_of_birth": "03/15/1985",
  "license_number": "D1234567",
  "issuing_state": "CALIFORNIA",
  "expiry_date": "03/15/2029"
}"#,
};

pub static SHOP_RECEIPT_PROMPT: PromptProfile = PromptProfile {
    documents: "store receipts",
    document: "receipt",
    rules: &[
        DATE_RULE,
        (
            "Amounts",
            "Report amounts and quantities as plain numbers without currency symbols.",
        ),
    ],
    example: r#"{
  "MerchantName": "Walmart",
  "TotalAmount": 100.00,
  "LineItems": [
    {
      "ItemName": "Apple",
      "Quantity": 1,
      "Price": 1.00
    }
  ],
  "DateOfPurchase": "01/15/2025",
  "PaymentMethod": "Credit Card"
}"#,
};

pub static RESUME_PROMPT: PromptProfile = PromptProfile {
    documents: "resumes",
    document: "resume",
    rules: &[],
    example: r#"{
  "full_name": "John Doe",
  "email": "john.doe@example.com",
  "phone_number": "+1234567890",
  "skills": ["Python", "Machine Learning", "Data Analysis"],
  "work_experience": [
    {
      "company": "Google",
      "role": "Software Engineer",
      "dates": "01/01/2020 - 01/01/2023"
    }
  ],
  "education": [
    {
      "institution": "University of California, Los Angeles",
      "degree": "Bachelor of Science in Computer Science",
      "graduation_year": "2020"
    }
  ]
}"#,
};

/// Render the core extraction prompt for a schema.
pub fn render_prompt(schema: &Schema, profile: &PromptProfile) -> String {
    let template = serde_json::to_string_pretty(&Value::Object(schema.descriptions()))
        .unwrap_or_else(|_| "{}".to_string());

    let mut rules: Vec<(&str, String)> = vec![
        (
            "Strict Data Extraction",
            format!(
                "Extract ONLY information that is explicitly and clearly visible on the {}.",
                profile.document
            ),
        ),
        (
            "Handle Missing/Illegible Data",
            "If any field is not present, unclear, or impossible to read, use `null` as the value."
                .to_string(),
        ),
        (
            "No Assumptions",
            format!(
                "Never invent, guess, or infer information that isn't clearly present on the {}.",
                profile.document
            ),
        ),
    ];
    rules.extend(profile.rules.iter().map(|(title, text)| (*title, text.to_string())));
    rules.push((
        "JSON Output Only",
        "Return only a valid JSON object with no additional text, explanations, or markdown formatting."
            .to_string(),
    ));

    let instructions: String = rules
        .iter()
        .enumerate()
        .map(|(i, (title, text))| format!("{}.  **{title}**: {text}\n", i + 1))
        .collect();

    format!(
        "### ROLE & GOAL ###\n\
         You are a highly intelligent and meticulous document processing specialist. \
         Your primary function is to analyze images of {documents} and extract key information with perfect accuracy. \
         The output must be in a structured JSON format.\n\n\
         ### IMPORTANT INSTRUCTIONS ###\n\
         {instructions}\n\
         ### REQUIRED JSON STRUCTURE ###\n```json\n{template}\n```\n\n\
         ### EXAMPLE OUTPUT ###\n```json\n{example}\n```\n\n\
         ### TASK ###\nAnalyze the {document} image carefully and return the extracted information \
         in the exact JSON format specified above.",
        documents = profile.documents,
        example = profile.example,
        document = profile.document,
    )
}

/// Attempt-specific additions to a prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptContext<'a> {
    /// Text read from the document by OCR, sent instead of the image.
    pub ocr_text: Option<&'a str>,
    /// Error message of the previous attempt.
    pub previous_error: Option<&'a str>,
}

impl PromptContext<'_> {
    /// Append this context to a core (or custom) prompt.
    pub fn apply(&self, prompt: &str) -> String {
        let mut out = prompt.to_string();

        if let Some(text) = self.ocr_text {
            out.push_str(&format!(
                "\n\n### OCR TEXT ###\nThe document could not be attached as an image. \
                 This is the text read from it by OCR:\n{text}"
            ));
        }

        if let Some(error) = self.previous_error {
            out.push_str(&format!(
                "\n\n### PREVIOUS ATTEMPT ###\nYour previous answer was rejected:\n{error}\n\
                 Return a corrected JSON object. Dates must use {DATE_FORMAT_LABEL}."
            ));
        }

        out
    }
}
