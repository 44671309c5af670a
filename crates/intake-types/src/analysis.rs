//! The intent-analysis record produced by the language model.
//!
//! The model is prompted to return JSON following this shape. Every field
//! carries a serde default so a partially conforming reply still
//! deserializes; a reply that fails to deserialize at all is replaced by a
//! fallback record upstream rather than failing the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentiment classification of the user's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
}

/// How urgently the user's request needs handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Confidence level attached to a model judgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

/// Entities the model identified in the input, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(default)]
    pub named_entities: Vec<String>,
    #[serde(default)]
    pub temporal: Vec<String>,
    #[serde(default)]
    pub numerical: Vec<String>,
    #[serde(default)]
    pub products_services: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Actionable parameters extracted from the input.
///
/// `required` parameters are needed to fulfil the intent, `optional` ones
/// refine it, and `context` carries background information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub required: Map<String, Value>,
    #[serde(default)]
    pub optional: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

fn default_intent() -> String {
    "unknown".to_string()
}

/// The full NLU analysis of one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Primary intent category (e.g. `information_request`, `transaction`).
    #[serde(default = "default_intent")]
    pub intent: String,
    /// Natural-language description of what the user wants.
    #[serde(default)]
    pub intent_description: String,
    #[serde(default)]
    pub entities: EntitySet,
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub confidence: Confidence,
    /// Why the model assigned this confidence level.
    #[serde(default)]
    pub confidence_reasoning: String,
    /// A spoken-friendly reply, written to sound natural through TTS.
    #[serde(default)]
    pub suggested_response: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub requires_clarification: bool,
    #[serde(default)]
    pub clarification_questions: Vec<String>,
    #[serde(default)]
    pub extracted_keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_reply_fills_defaults() {
        let record: AnalysisRecord = serde_json::from_str(
            r#"{"intent": "transaction", "sentiment": "negative", "urgency": "high"}"#,
        )
        .unwrap();

        assert_eq!(record.intent, "transaction");
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.urgency, Urgency::High);
        assert_eq!(record.confidence, Confidence::Medium);
        assert!(record.suggested_response.is_empty());
        assert!(record.entities.named_entities.is_empty());
    }

    #[test]
    fn unrecognized_enum_value_is_a_parse_error() {
        // The caller treats any parse failure as "synthesize a fallback
        // record", so an out-of-vocabulary sentiment must not silently map
        // onto a known variant.
        let result =
            serde_json::from_str::<AnalysisRecord>(r#"{"intent": "x", "sentiment": "elated"}"#);
        assert!(result.is_err());
    }
}
