//! Data models: document types, processing results, typed records, configuration.

pub mod config;
pub mod document;
pub mod records;
pub mod result;
