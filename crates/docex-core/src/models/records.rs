//! Typed views of validated records.
//!
//! The validator produces a JSON object per document; these structs give
//! callers a typed handle on it via [`ProcessingResult::data_as`].
//!
//! [`ProcessingResult::data_as`]: super::result::ProcessingResult::data_as

use serde::{Deserialize, Serialize};

/// Fields read from a driving license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingLicense {
    pub name: String,
    pub date_of_birth: Option<String>,
    pub license_number: String,
    pub issuing_state: String,
    pub expiry_date: Option<String>,
}

/// Fields read from a shop receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShopReceipt {
    pub merchant_name: Option<String>,
    pub total_amount: Option<f64>,
    pub date_of_purchase: Option<String>,
    pub payment_method: Option<String>,
    pub line_items: Option<Vec<LineItem>>,
}

/// One purchased item on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    pub item_name: String,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

/// Fields read from a resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub skills: Option<Vec<String>>,
    pub work_experience: Option<Vec<WorkExperience>>,
    pub education: Option<Vec<Education>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company: String,
    pub role: String,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub graduation_year: Option<String>,
}
