//! The document-extraction record produced from a document image.
//!
//! The vision model returns free text; the extractor structures it locally
//! into a document type, a small set of typed fields, and an entity list.

use crate::analysis::Confidence;
use serde::{Deserialize, Serialize};

/// Document categories recognized by content keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BusinessCard,
    Invoice,
    Form,
    Identification,
    /// Readable text that matched no specific category.
    Document,
    #[default]
    Unknown,
}

/// Typed fields pulled out of the extracted text.
///
/// Only fields that were actually found are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl StructuredFields {
    /// Returns `true` if no field was found.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.address.is_none()
    }
}

/// Everything extracted from one document image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub document_type: DocumentType,
    /// The raw text the vision model read off the image.
    pub extracted_text: String,
    pub structured_fields: StructuredFields,
    /// Deduplicated union of every matched field value, in first-seen order.
    pub entities: Vec<String>,
    pub confidence: Confidence,
}
