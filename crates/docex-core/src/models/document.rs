//! Document type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Kind of document being extracted. Selects the schema and the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Driving license or state ID card.
    DrivingLicense,
    /// Shop receipt.
    ShopReceipt,
    /// Resume / CV.
    Resume,
}

impl DocumentType {
    /// All document types in their canonical listing order.
    pub const ALL: [DocumentType; 3] = [
        DocumentType::DrivingLicense,
        DocumentType::ShopReceipt,
        DocumentType::Resume,
    ];

    /// Wire name, e.g. `driving_license`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::DrivingLicense => "driving_license",
            DocumentType::ShopReceipt => "shop_receipt",
            DocumentType::Resume => "resume",
        }
    }

    /// Wire names of all document types.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(DocumentType::as_str).collect()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnsupportedDocumentType {
                requested: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("RESUME".parse::<DocumentType>().unwrap(), DocumentType::Resume);
        assert_eq!(
            "Driving_License".parse::<DocumentType>().unwrap(),
            DocumentType::DrivingLicense
        );
        assert_eq!(" shop_receipt ".parse::<DocumentType>().unwrap(), DocumentType::ShopReceipt);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "passport".parse::<DocumentType>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedDocumentType { ref requested } if requested == "passport"));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&DocumentType::ShopReceipt).unwrap(),
            "\"shop_receipt\""
        );
        for t in DocumentType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
    }
}
