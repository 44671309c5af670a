//! Intent analysis: one chat-completions call that turns an utterance into
//! a structured [`AnalysisRecord`].
//!
//! The model is asked for strict JSON. Replies that fail to parse — with or
//! without a code fence around them — are replaced by a low-confidence
//! fallback record so the pipeline keeps moving.

use crate::chat::{ChatClient, ChatMessage};
use crate::config::ApiConfig;
use crate::error::PipelineError;
use intake_types::{AnalysisRecord, Confidence, EntitySet, ParameterSet, Sentiment, Urgency};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

const ANALYSIS_TEMPERATURE: f32 = 0.5;
const ANALYSIS_MAX_TOKENS: u32 = 1500;
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are an expert NLU system. Always respond with valid JSON \
     that follows the exact schema provided. Be thorough, accurate, and user-focused.";

#[derive(Debug, Clone)]
pub struct IntentAnalyzer {
    chat: ChatClient,
}

impl IntentAnalyzer {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            chat: ChatClient::new(config),
        }
    }

    /// Analyzes one utterance. Never fails on malformed model output — only
    /// on transport-level errors.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisRecord, PipelineError> {
        info!(text_length = text.len(), "analyzing intent");

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(text)),
        ];

        let content = self
            .chat
            .complete(
                &messages,
                Some(ANALYSIS_TEMPERATURE),
                ANALYSIS_MAX_TOKENS,
                ANALYSIS_TIMEOUT,
            )
            .await
            .map_err(PipelineError::Analysis)?;

        let record = parse_analysis(&content, text);
        info!(intent = %record.intent, confidence = ?record.confidence, "intent detected");
        Ok(record)
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"Analyze the user's input comprehensively and extract actionable insights.

ANALYSIS FRAMEWORK:

1. INTENT CLASSIFICATION - determine the primary action/goal, one of:
   information_request, task_execution, conversation, problem_solving,
   transaction, navigation, configuration, complaint, compliment, emergency

2. ENTITY EXTRACTION - named entities (people, places, organizations),
   temporal expressions, numerical values, products/services mentioned,
   and actions/verbs indicating desired operations.

3. PARAMETER MAPPING - required parameters (must-have for fulfilment),
   optional parameters, and context parameters (background information).

4. SENTIMENT & URGENCY - sentiment: positive/negative/neutral/mixed;
   urgency: low/medium/high/critical.

5. CONFIDENCE - high (clear and unambiguous), medium (likely but
   uncertain), low (multiple possible interpretations).

6. SPOKEN RESPONSE - the suggested_response must sound natural when
   spoken aloud: use contractions, natural pauses with commas, moderate
   sentence length, a friendly and empathetic tone, and no symbols,
   brackets, or complex punctuation. End with a clear next step or a
   question that invites a response.

USER INPUT: "{text}"

RESPONSE FORMAT (valid JSON only, exactly these keys):
{{
    "intent": "primary_intent_category",
    "intent_description": "what the user wants, in one sentence",
    "entities": {{
        "named_entities": [],
        "temporal": [],
        "numerical": [],
        "products_services": [],
        "actions": []
    }},
    "parameters": {{
        "required": {{}},
        "optional": {{}},
        "context": {{}}
    }},
    "sentiment": "positive|negative|neutral|mixed",
    "urgency": "low|medium|high|critical",
    "confidence": "high|medium|low",
    "confidence_reasoning": "why this confidence level",
    "suggested_response": "natural, spoken-friendly reply optimized for TTS",
    "next_steps": [],
    "category": "broad_classification",
    "subcategory": "specific_classification",
    "requires_clarification": false,
    "clarification_questions": [],
    "extracted_keywords": []
}}

Be specific but not overly granular, consider implied meaning, and handle
ambiguity gracefully with an appropriate confidence level."#
    )
}

/// Parses the model reply, unwrapping a ```json fence if present. Falls back
/// to a synthesized record when the reply is not usable JSON.
fn parse_analysis(content: &str, original_text: &str) -> AnalysisRecord {
    let trimmed = content.trim();

    if let Ok(record) = serde_json::from_str::<AnalysisRecord>(trimmed) {
        return record;
    }

    if let Some(inner) = strip_code_fence(trimmed) {
        if let Ok(record) = serde_json::from_str::<AnalysisRecord>(inner) {
            return record;
        }
    }

    warn!("model reply was not valid analysis JSON, using fallback record");
    fallback_record(original_text)
}

fn strip_code_fence(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("```")?;
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```")?;
    Some(rest.trim())
}

fn fallback_record(text: &str) -> AnalysisRecord {
    let mut required = serde_json::Map::new();
    required.insert("original_text".to_string(), Value::String(text.to_string()));

    AnalysisRecord {
        intent: "general_request".to_string(),
        intent_description: "Unable to parse specific intent".to_string(),
        entities: EntitySet {
            products_services: vec![text.to_string()],
            ..EntitySet::default()
        },
        parameters: ParameterSet {
            required,
            ..ParameterSet::default()
        },
        sentiment: Sentiment::Neutral,
        urgency: Urgency::Low,
        confidence: Confidence::Low,
        confidence_reasoning: "model reply was not valid JSON, fallback analysis used"
            .to_string(),
        suggested_response: format!(
            "I heard you say: {}. Could you help me understand what you'd like me to help you with?",
            text
        ),
        next_steps: vec![
            "request_clarification".to_string(),
            "provide_general_help".to_string(),
        ],
        category: "general".to_string(),
        subcategory: "unclear_request".to_string(),
        requires_clarification: true,
        clarification_questions: vec![
            "Could you please rephrase your request?".to_string(),
            "What specific help do you need?".to_string(),
        ],
        extracted_keywords: text
            .split_whitespace()
            .take(5)
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_REPLY: &str = r#"{
        "intent": "transaction",
        "intent_description": "User wants to book airline travel",
        "entities": {"named_entities": ["Paris"], "temporal": ["next Friday"],
                     "numerical": [], "products_services": ["flight"], "actions": ["book"]},
        "sentiment": "neutral",
        "urgency": "medium",
        "confidence": "high",
        "suggested_response": "I'd love to help you book that flight!"
    }"#;

    #[test]
    fn parses_a_plain_json_reply() {
        let record = parse_analysis(VALID_REPLY, "book me a flight");
        assert_eq!(record.intent, "transaction");
        assert_eq!(record.entities.named_entities, vec!["Paris"]);
        assert_eq!(record.confidence, Confidence::High);
    }

    #[test]
    fn unwraps_a_fenced_json_reply() {
        let fenced = format!("```json\n{}\n```", VALID_REPLY);
        let record = parse_analysis(&fenced, "book me a flight");
        assert_eq!(record.intent, "transaction");
        assert_eq!(record.urgency, Urgency::Medium);
    }

    #[test]
    fn garbage_reply_yields_the_fallback_record() {
        let record = parse_analysis(
            "Sorry, I can't produce JSON today.",
            "please reschedule my dentist appointment to Tuesday",
        );

        assert_eq!(record.intent, "general_request");
        assert_eq!(record.confidence, Confidence::Low);
        assert!(record.requires_clarification);
        assert_eq!(
            record.extracted_keywords,
            vec!["please", "reschedule", "my", "dentist", "appointment"]
        );
        assert_eq!(
            record.parameters.required["original_text"],
            "please reschedule my dentist appointment to Tuesday"
        );
    }
}
