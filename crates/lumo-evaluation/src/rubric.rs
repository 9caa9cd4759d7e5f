// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rubric prompt construction and JSON repair.
//!
//! The model is asked for a fixed JSON shape but its output is never trusted:
//! [`parse_rubric`] always returns a complete [`RubricPayload`], falling back
//! to neutral scores when the text cannot be used.

use lumo_core::{
    Competency, GenerationConfig, Message, MessageAuthor, ProviderMessage, ProviderRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// Score assigned when the model gives no usable number.
pub const DEFAULT_SCORE: i64 = 7;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 10;

pub const FALLBACK_OVERALL_FEEDBACK: &str = "The automatic evaluation could not be fully processed. \
Scores are neutral placeholders; review the conversation to reflect on your answers.";
pub const PLACEHOLDER_FEEDBACK: &str = "No specific feedback was provided.";
pub const PLACEHOLDER_EXAMPLE: &str = "No example was identified in the conversation.";
pub const PLACEHOLDER_IMPROVEMENT: &str = "Keep practising this competency in future interviews.";

const RUBRIC_INSTRUCTIONS: &str = r#"You are an expert interview coach evaluating a candidate's soft skills from a job interview transcript.

Score each competency with an integer from 1 to 10 and return JSON only, with exactly this shape:

{
  "overall_feedback": "two or three sentences about the whole interview",
  "competency_scores": {
    "Communication": {"score": 7, "feedback": "...", "example": "...", "improvement_area": "..."},
    "Critical thinking": {"score": 7, "feedback": "...", "example": "...", "improvement_area": "..."},
    "Adaptability": {"score": 7, "feedback": "...", "example": "...", "improvement_area": "..."},
    "Teamwork": {"score": 7, "feedback": "...", "example": "...", "improvement_area": "..."},
    "Emotional intelligence": {"score": 7, "feedback": "...", "example": "...", "improvement_area": "..."}
  }
}

"example" quotes or paraphrases something the candidate said. Judge only the candidate's answers."#;

/// One repaired competency entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyAssessment {
    pub competency: Competency,
    pub score: i64,
    pub feedback: String,
    pub example: String,
    pub improvement_area: String,
}

/// A complete rubric: overall feedback plus one entry per competency, in
/// [`Competency::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricPayload {
    pub overall_feedback: String,
    pub competencies: Vec<CompetencyAssessment>,
    /// True when the model output was unusable and neutral scores were substituted.
    pub fallback: bool,
}

impl RubricPayload {
    /// Renders the payload back into the JSON shape the model is asked for.
    pub fn to_json(&self) -> Value {
        let scores: Map<String, Value> = self
            .competencies
            .iter()
            .map(|c| {
                (
                    c.competency.name().to_string(),
                    json!({
                        "score": c.score,
                        "feedback": c.feedback,
                        "example": c.example,
                        "improvement_area": c.improvement_area,
                    }),
                )
            })
            .collect();
        json!({
            "overall_feedback": self.overall_feedback,
            "competency_scores": scores,
        })
    }
}

/// The deterministic payload used when the model output cannot be repaired.
pub fn fallback_payload() -> RubricPayload {
    RubricPayload {
        overall_feedback: FALLBACK_OVERALL_FEEDBACK.to_string(),
        competencies: Competency::ALL
            .iter()
            .map(|&competency| CompetencyAssessment {
                competency,
                score: DEFAULT_SCORE,
                feedback: PLACEHOLDER_FEEDBACK.to_string(),
                example: PLACEHOLDER_EXAMPLE.to_string(),
                improvement_area: PLACEHOLDER_IMPROVEMENT.to_string(),
            })
            .collect(),
        fallback: true,
    }
}

/// Formats the ordered conversation as a labelled transcript.
pub fn build_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let speaker = match m.author {
                MessageAuthor::Candidate => "Candidate",
                MessageAuthor::Interviewer => "Interviewer",
            };
            format!("{speaker}: {}", m.content.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the provider request asking for a rubric over `messages`.
pub fn build_rubric_request(messages: &[Message], generation: GenerationConfig) -> ProviderRequest {
    let prompt = format!(
        "Interview transcript:\n\n{}\n\nReturn the JSON evaluation now.",
        build_transcript(messages)
    );
    ProviderRequest {
        model: None,
        system_prompt: Some(RUBRIC_INSTRUCTIONS.to_string()),
        messages: vec![ProviderMessage::user(prompt)],
        generation,
    }
}

/// Parses raw model text into a complete rubric. Never fails.
pub fn parse_rubric(raw: &str) -> RubricPayload {
    let json_str = extract_json_object(raw);
    let value = match serde_json::from_str::<Value>(json_str) {
        Ok(value) => value,
        Err(e) => {
            warn!("rubric response is not valid JSON, using fallback scores: {e}");
            debug!("raw rubric response: {raw}");
            return fallback_payload();
        }
    };

    match repair_payload(&value) {
        Some(payload) => payload,
        None => {
            warn!("rubric response is missing required keys, using fallback scores");
            debug!("raw rubric response: {raw}");
            fallback_payload()
        }
    }
}

/// Repairs a parsed rubric value.
///
/// Returns `None` when a top-level key or a competency is missing; the caller
/// substitutes [`fallback_payload`]. Applying the repair to its own output
/// (via [`RubricPayload::to_json`]) yields the same payload.
pub fn repair_payload(value: &Value) -> Option<RubricPayload> {
    let root = value.as_object()?;
    let overall = root.get("overall_feedback")?;
    let scores = root.get("competency_scores")?.as_object()?;

    let competencies = Competency::ALL
        .iter()
        .map(|&competency| {
            let entry = scores.get(competency.name())?;
            Some(repair_entry(competency, entry))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(RubricPayload {
        overall_feedback: text_or(overall, FALLBACK_OVERALL_FEEDBACK),
        competencies,
        fallback: false,
    })
}

fn repair_entry(competency: Competency, entry: &Value) -> CompetencyAssessment {
    match entry {
        Value::Object(fields) => CompetencyAssessment {
            competency,
            score: fields.get("score").map_or(DEFAULT_SCORE, coerce_score),
            feedback: field_or(fields, "feedback", PLACEHOLDER_FEEDBACK),
            example: field_or(fields, "example", PLACEHOLDER_EXAMPLE),
            improvement_area: field_or(fields, "improvement_area", PLACEHOLDER_IMPROVEMENT),
        },
        // A bare number is taken as the score.
        other => CompetencyAssessment {
            competency,
            score: coerce_score(other),
            feedback: PLACEHOLDER_FEEDBACK.to_string(),
            example: PLACEHOLDER_EXAMPLE.to_string(),
            improvement_area: PLACEHOLDER_IMPROVEMENT.to_string(),
        },
    }
}

/// Coerces a JSON score to an integer in `MIN_SCORE..=MAX_SCORE`.
///
/// Integers are taken as-is, floats truncated, numeric strings parsed; any
/// other value becomes [`DEFAULT_SCORE`].
pub fn coerce_score(value: &Value) -> i64 {
    let raw = match value {
        Value::Number(n) => number_to_i64(n),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(truncate))
        }
        _ => None,
    };
    clamp_score(raw.unwrap_or(DEFAULT_SCORE))
}

pub fn clamp_score(score: i64) -> i64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

fn number_to_i64(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.as_u64().is_some() {
        return Some(i64::MAX);
    }
    n.as_f64().map(truncate)
}

fn truncate(f: f64) -> i64 {
    // `as` saturates at the i64 bounds.
    f.trunc() as i64
}

fn field_or(fields: &Map<String, Value>, key: &str, placeholder: &str) -> String {
    fields
        .get(key)
        .map_or_else(|| placeholder.to_string(), |v| text_or(v, placeholder))
}

fn text_or(value: &Value, placeholder: &str) -> String {
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => placeholder.to_string(),
    }
}

/// Strips code fences and surrounding prose, keeping the outermost `{...}`.
fn extract_json_object(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full_response() -> String {
        json!({
            "overall_feedback": "Solid interview overall.",
            "competency_scores": {
                "Communication": {"score": 8, "feedback": "Clear", "example": "Explained the outage", "improvement_area": "Pace"},
                "Critical thinking": {"score": 6, "feedback": "Good", "example": "Root cause", "improvement_area": "Depth"},
                "Adaptability": {"score": 7, "feedback": "Fine", "example": "New stack", "improvement_area": "Range"},
                "Teamwork": {"score": 9, "feedback": "Great", "example": "Pairing", "improvement_area": "Delegation"},
                "Emotional intelligence": {"score": 5, "feedback": "Ok", "example": "Conflict", "improvement_area": "Empathy"}
            }
        })
        .to_string()
    }

    fn scores(payload: &RubricPayload) -> Vec<i64> {
        payload.competencies.iter().map(|c| c.score).collect()
    }

    #[test]
    fn parses_well_formed_response() {
        let payload = parse_rubric(&full_response());
        assert!(!payload.fallback);
        assert_eq!(payload.overall_feedback, "Solid interview overall.");
        assert_eq!(scores(&payload), vec![8, 6, 7, 9, 5]);
        assert_eq!(payload.competencies[1].competency, Competency::CriticalThinking);
        assert_eq!(payload.competencies[0].example, "Explained the outage");
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = format!("```json\n{}\n```", full_response());
        let payload = parse_rubric(&raw);
        assert!(!payload.fallback);
        assert_eq!(scores(&payload), vec![8, 6, 7, 9, 5]);
    }

    #[test]
    fn truncated_json_falls_back() {
        let raw = full_response();
        let payload = parse_rubric(&raw[..raw.len() / 2]);
        assert!(payload.fallback);
        assert_eq!(payload, fallback_payload());
    }

    #[test]
    fn fenced_prose_falls_back() {
        let payload = parse_rubric("```\nI cannot evaluate this interview.\n```");
        assert!(payload.fallback);
        assert_eq!(scores(&payload), vec![DEFAULT_SCORE; 5]);
    }

    #[test]
    fn missing_competency_falls_back() {
        let mut value: Value = serde_json::from_str(&full_response()).unwrap();
        value["competency_scores"]
            .as_object_mut()
            .unwrap()
            .remove("Teamwork");
        assert!(repair_payload(&value).is_none());
        assert!(parse_rubric(&value.to_string()).fallback);
    }

    #[test]
    fn missing_top_level_key_falls_back() {
        let mut value: Value = serde_json::from_str(&full_response()).unwrap();
        value.as_object_mut().unwrap().remove("overall_feedback");
        assert!(parse_rubric(&value.to_string()).fallback);
    }

    #[test]
    fn repairs_scores_and_missing_fields() {
        let raw = json!({
            "overall_feedback": "",
            "competency_scores": {
                "Communication": {"score": 14},
                "Critical thinking": {"score": -3, "feedback": "Weak"},
                "Adaptability": {"score": "8"},
                "Teamwork": {"score": 6.9},
                "Emotional intelligence": 4
            }
        })
        .to_string();
        let payload = parse_rubric(&raw);
        assert!(!payload.fallback);
        assert_eq!(scores(&payload), vec![10, 1, 8, 6, 4]);
        assert_eq!(payload.overall_feedback, FALLBACK_OVERALL_FEEDBACK);
        assert_eq!(payload.competencies[0].feedback, PLACEHOLDER_FEEDBACK);
        assert_eq!(payload.competencies[1].feedback, "Weak");
        assert_eq!(payload.competencies[4].example, PLACEHOLDER_EXAMPLE);
    }

    #[test]
    fn non_numeric_scores_become_default() {
        for value in [json!("great"), json!(null), json!(true), json!([7]), json!({"v": 2})] {
            assert_eq!(coerce_score(&value), DEFAULT_SCORE, "{value}");
        }
    }

    #[test]
    fn huge_numbers_clamp() {
        assert_eq!(coerce_score(&json!(u64::MAX)), MAX_SCORE);
        assert_eq!(coerce_score(&json!(1e300)), MAX_SCORE);
        assert_eq!(coerce_score(&json!(-1e300)), MIN_SCORE);
    }

    #[test]
    fn transcript_labels_speakers_in_order() {
        let make = |author, content: &str| Message {
            id: content.into(),
            session_id: "s".into(),
            author,
            content: content.into(),
            created_at: String::new(),
            audio_path: None,
            tts_voice: None,
        };
        let transcript = build_transcript(&[
            make(MessageAuthor::Interviewer, "Tell me about yourself?"),
            make(MessageAuthor::Candidate, " I build systems. "),
        ]);
        assert_eq!(
            transcript,
            "Interviewer: Tell me about yourself?\nCandidate: I build systems."
        );
    }

    #[test]
    fn rubric_request_carries_instructions_and_sampling() {
        let generation = GenerationConfig {
            temperature: 0.3,
            max_output_tokens: 2048,
            ..GenerationConfig::default()
        };
        let request = build_rubric_request(&[], generation.clone());
        assert!(request.system_prompt.unwrap().contains("competency_scores"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.generation, generation);
    }

    proptest! {
        #[test]
        fn integer_scores_clamp(score in any::<i64>()) {
            prop_assert_eq!(coerce_score(&json!(score)), score.clamp(1, 10));
        }

        #[test]
        fn float_scores_truncate_then_clamp(score in -1000.0f64..1000.0) {
            let expected = (score.trunc() as i64).clamp(1, 10);
            prop_assert_eq!(coerce_score(&json!(score)), expected);
        }

        #[test]
        fn repair_is_idempotent(
            raw in proptest::collection::vec(-20i64..20, 5),
            feedback in proptest::option::of("[a-z ]{0,12}"),
        ) {
            let mut scores = Map::new();
            for (competency, score) in Competency::ALL.iter().zip(&raw) {
                let mut entry = json!({"score": score});
                if let Some(text) = &feedback {
                    entry["feedback"] = json!(text);
                }
                scores.insert(competency.name().to_string(), entry);
            }
            let value = json!({"overall_feedback": "ok", "competency_scores": scores});

            let once = repair_payload(&value).unwrap();
            let twice = repair_payload(&once.to_json()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn arbitrary_text_never_panics(raw in ".{0,200}") {
            let payload = parse_rubric(&raw);
            prop_assert_eq!(payload.competencies.len(), 5);
            for c in &payload.competencies {
                prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&c.score));
            }
        }
    }
}
