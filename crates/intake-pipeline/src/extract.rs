//! Document extraction: one vision chat-completions call, then local
//! structuring of the returned text into typed fields.

use crate::chat::{ChatClient, ChatMessage, ContentPart, ImageUrl};
use crate::config::ApiConfig;
use crate::error::PipelineError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use intake_types::{Confidence, DocumentType, ExtractionRecord, StructuredFields};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Maximum image input size (25 MiB).
const MAX_IMAGE_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// Timeout for one vision request.
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(90);

const EXTRACTION_MAX_TOKENS: u32 = 1000;

const EXTRACTION_PROMPT: &str = "Extract ALL text you can see in this image. List everything \
     clearly, including names, numbers, emails, addresses, and any other text. Be thorough.";

#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    chat: ChatClient,
}

impl DocumentExtractor {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            chat: ChatClient::new(config),
        }
    }

    /// Reads a document image, asks the vision model for its text, and
    /// structures the reply into typed fields.
    pub async fn extract(&self, image_path: &Path) -> Result<ExtractionRecord, PipelineError> {
        let data = tokio::fs::read(image_path).await.map_err(|e| {
            PipelineError::Extraction(format!("failed to read {:?}: {}", image_path, e))
        })?;

        if data.len() > MAX_IMAGE_INPUT_BYTES {
            return Err(PipelineError::Extraction(format!(
                "image exceeds maximum size: {} bytes (limit: {} bytes)",
                data.len(),
                MAX_IMAGE_INPUT_BYTES
            )));
        }

        // Trust magic bytes, not the extension.
        let mime = detect_image_type(&data).ok_or_else(|| {
            PipelineError::Extraction(format!("unrecognized image format: {:?}", image_path))
        })?;

        info!(file = ?image_path.file_name(), mime, bytes = data.len(), "extracting document");

        let data_uri = format!("data:{};base64,{}", mime, BASE64.encode(&data));
        let messages = [ChatMessage::user_parts(vec![
            ContentPart::Text {
                text: EXTRACTION_PROMPT.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: data_uri },
            },
        ])];

        let content = self
            .chat
            .complete(&messages, None, EXTRACTION_MAX_TOKENS, EXTRACTION_TIMEOUT)
            .await
            .map_err(PipelineError::Extraction)?;

        let extracted_text = content.trim().to_string();
        let (document_type, structured_fields, entities) = structure_text(&extracted_text);
        let confidence = if extracted_text.is_empty() {
            Confidence::Low
        } else {
            Confidence::High
        };

        info!(
            document_type = ?document_type,
            fields = entities.len(),
            "document extraction complete"
        );

        Ok(ExtractionRecord {
            document_type,
            extracted_text,
            structured_fields,
            entities,
            confidence,
        })
    }
}

/// Detects an image MIME type from magic bytes.
pub(crate) fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        Some("image/jpeg")
    } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
        Some("image/png")
    } else if data.len() >= 4 && &data[..4] == b"GIF8" {
        Some("image/gif")
    } else if data.len() >= 2 && &data[..2] == b"BM" {
        Some("image/bmp")
    } else if data.len() >= 4 && (&data[..4] == b"II*\0" || &data[..4] == b"MM\0*") {
        Some("image/tiff")
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Structures free text into a document type, typed fields, and an entity
/// list. First match wins per field; entities keep every match, deduplicated
/// in first-seen order.
fn structure_text(text: &str) -> (DocumentType, StructuredFields, Vec<String>) {
    if text.is_empty() {
        return (DocumentType::Unknown, StructuredFields::default(), Vec::new());
    }

    let document_type = classify_document(text);
    let mut fields = StructuredFields::default();
    let mut entities: Vec<String> = Vec::new();

    let emails = scan_emails(text);
    fields.email = emails.first().cloned();
    entities.extend(emails);

    let phones = scan_phones(text);
    fields.phone = phones.first().cloned();
    entities.extend(phones);

    let urls = scan_urls(text);
    fields.website = urls.first().cloned();
    entities.extend(urls);

    let addresses = scan_addresses(text);
    fields.address = addresses.first().cloned();
    entities.extend(addresses);

    let names = scan_names(text);
    fields.name = names.first().cloned();
    entities.extend(names);

    if let Some(company) = scan_company(text) {
        fields.company = Some(company.clone());
        entities.push(company);
    }

    let mut seen = HashSet::new();
    entities.retain(|e| seen.insert(e.clone()));

    (document_type, fields, entities)
}

fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if contains_any(&["business card", "card", "contact"]) {
        DocumentType::BusinessCard
    } else if contains_any(&["invoice", "bill", "receipt"]) {
        DocumentType::Invoice
    } else if contains_any(&["form", "application"]) {
        DocumentType::Form
    } else if contains_any(&["license", "passport"])
        // "id" only counts as a standalone word, not a substring.
        || lower
            .split_whitespace()
            .any(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()) == "id")
    {
        DocumentType::Identification
    } else {
        DocumentType::Document
    }
}

fn is_local_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'%' | b'+' | b'-')
}

fn is_domain_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-')
}

fn scan_emails(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();

    for (i, &b) in bytes.iter().enumerate() {
        if b != b'@' {
            continue;
        }
        let mut start = i;
        while start > 0 && is_local_char(bytes[start - 1]) {
            start -= 1;
        }
        if start == i {
            continue;
        }
        let mut end = i + 1;
        while end < bytes.len() && is_domain_char(bytes[end]) {
            end += 1;
        }
        let domain = text[i + 1..end].trim_end_matches(['.', '-']);
        let end = i + 1 + domain.len();
        let Some(dot) = domain.rfind('.') else {
            continue;
        };
        let tld = &domain[dot + 1..];
        if tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) {
            found.push(text[start..end].to_string());
        }
    }
    found
}

fn scan_phones(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let starts_candidate = b.is_ascii_digit() || b == b'(' || b == b'+';
        let mid_token = i > 0 && bytes[i - 1].is_ascii_alphanumeric();
        if !starts_candidate || mid_token {
            i += 1;
            continue;
        }

        let start = i;
        let mut j = i;
        let mut digits = 0usize;
        while j < bytes.len() {
            let c = bytes[j];
            if c.is_ascii_digit() {
                digits += 1;
                j += 1;
            } else if matches!(c, b'(' | b')' | b'-' | b'.' | b'+') {
                j += 1;
            } else if c == b' ' {
                // A space continues the number only when digits follow.
                if j + 1 < bytes.len() && (bytes[j + 1].is_ascii_digit() || bytes[j + 1] == b'(') {
                    j += 1;
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        let candidate = text[start..j].trim_end_matches([' ', '-', '.', '(', ')']);
        if (10..=15).contains(&digits) && !candidate.is_empty() {
            found.push(candidate.to_string());
        }
        i = j.max(i + 1);
    }
    found
}

fn scan_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|t| t.starts_with("http://") || t.starts_with("https://") || t.starts_with("www."))
        .map(|t| t.trim_end_matches([',', '.', ';', ')']).to_string())
        .filter(|t| t.len() > 4)
        .collect()
}

const STREET_SUFFIXES: &[&str] = &[
    "street", "st", "avenue", "ave", "road", "rd", "drive", "dr", "lane", "ln", "boulevard",
    "blvd",
];

fn scan_addresses(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let starts_numeric = tokens
            .first()
            .and_then(|t| t.chars().next())
            .is_some_and(|c| c.is_ascii_digit());
        if !starts_numeric {
            continue;
        }
        if let Some(pos) = tokens.iter().position(|t| {
            let word = t.trim_end_matches(['.', ',']).to_ascii_lowercase();
            STREET_SUFFIXES.contains(&word.as_str())
        }) {
            if pos > 0 {
                found.push(tokens[..=pos].join(" "));
            }
        }
    }
    found
}

fn looks_like_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase())
}

/// Lines of two or three capitalized words are treated as personal names.
fn scan_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let words: Vec<&str> = line.split_whitespace().collect();
            if !(2..=3).contains(&words.len()) {
                return None;
            }
            if words.iter().all(|w| looks_like_name_word(w)) {
                Some(words.join(" "))
            } else {
                None
            }
        })
        .collect()
}

const BUSINESS_WORDS: &[&str] = &["company", "corp", "inc", "llc", "ltd", "organization", "group"];

fn scan_company(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let lower = line.to_lowercase();
        if BUSINESS_WORDS.iter().any(|w| lower.contains(w)) {
            Some(line.trim().to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_TEXT: &str = "BUSINESS CARD\n\
        Jane Doe\n\
        Acme Widgets LLC\n\
        jane.doe@acme-widgets.com\n\
        (555) 123-4567\n\
        123 Main Street, Suite 4\n\
        www.acme-widgets.com";

    #[test]
    fn structures_a_business_card() {
        let (doc_type, fields, entities) = structure_text(CARD_TEXT);

        assert_eq!(doc_type, DocumentType::BusinessCard);
        assert_eq!(fields.name.as_deref(), Some("Jane Doe"));
        assert_eq!(fields.company.as_deref(), Some("Acme Widgets LLC"));
        assert_eq!(fields.email.as_deref(), Some("jane.doe@acme-widgets.com"));
        assert_eq!(fields.phone.as_deref(), Some("(555) 123-4567"));
        assert_eq!(fields.website.as_deref(), Some("www.acme-widgets.com"));
        assert_eq!(fields.address.as_deref(), Some("123 Main Street"));
        assert!(entities.contains(&"Jane Doe".to_string()));
    }

    #[test]
    fn classifies_an_invoice() {
        let (doc_type, fields, _) =
            structure_text("INVOICE #42\nTotal due: 150.00\nPay by 2024-07-01");
        assert_eq!(doc_type, DocumentType::Invoice);
        assert!(fields.email.is_none());
    }

    #[test]
    fn id_only_matches_as_a_word() {
        let (doc_type, _, _) = structure_text("David said he paid the bill");
        assert_eq!(doc_type, DocumentType::Invoice);

        let (doc_type, _, _) = structure_text("National ID 998877");
        assert_eq!(doc_type, DocumentType::Identification);
    }

    #[test]
    fn empty_text_is_unknown() {
        let (doc_type, fields, entities) = structure_text("");
        assert_eq!(doc_type, DocumentType::Unknown);
        assert!(fields.is_empty());
        assert!(entities.is_empty());
    }

    #[test]
    fn detects_magic_bytes() {
        assert_eq!(detect_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            detect_image_type(&[137, 80, 78, 71, 13, 10, 26, 10, 0]),
            Some("image/png")
        );
        assert_eq!(detect_image_type(b"BM0000"), Some("image/bmp"));
        assert_eq!(detect_image_type(b"II*\0rest"), Some("image/tiff"));
        assert_eq!(detect_image_type(b"not an image"), None);
    }

    #[test]
    fn phone_scanner_rejects_short_and_absorbing_runs() {
        assert!(scan_phones("call 555-1234").is_empty()); // 7 digits
        let found = scan_phones("+1 415 555 0199 tomorrow");
        assert_eq!(found, vec!["+1 415 555 0199"]);
    }
}
