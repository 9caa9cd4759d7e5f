// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and services.
//!
//! Timestamps are ISO 8601 strings in UTC with millisecond precision
//! (`%Y-%m-%dT%H:%M:%S%.3fZ`), matching what the storage layer writes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

// --- Interview domain ---

/// Interview domain a session is conducted in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterviewCategory {
    Operations,
    SalesMarketing,
    Finance,
    Hr,
    It,
    Rd,
    CustomerSupport,
    Management,
    Health,
}

impl InterviewCategory {
    /// Every category, in presentation order.
    pub const ALL: [InterviewCategory; 9] = [
        Self::Operations,
        Self::SalesMarketing,
        Self::Finance,
        Self::Hr,
        Self::It,
        Self::Rd,
        Self::CustomerSupport,
        Self::Management,
        Self::Health,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Operations => "Operations and Production",
            Self::SalesMarketing => "Sales and Marketing",
            Self::Finance => "Finance and Administration",
            Self::Hr => "Human Resources",
            Self::It => "Information Technology",
            Self::Rd => "Research and Development",
            Self::CustomerSupport => "Customer Service and Support",
            Self::Management => "General and Strategic Management",
            Self::Health => "Health and Medicine",
        }
    }
}

/// The five soft-skill competencies every evaluation scores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString,
    Serialize, Deserialize,
)]
pub enum Competency {
    #[strum(serialize = "Communication")]
    #[serde(rename = "Communication")]
    Communication,
    #[strum(serialize = "Critical thinking")]
    #[serde(rename = "Critical thinking")]
    CriticalThinking,
    #[strum(serialize = "Adaptability")]
    #[serde(rename = "Adaptability")]
    Adaptability,
    #[strum(serialize = "Teamwork")]
    #[serde(rename = "Teamwork")]
    Teamwork,
    #[strum(serialize = "Emotional intelligence")]
    #[serde(rename = "Emotional intelligence")]
    EmotionalIntelligence,
}

impl Competency {
    /// All competencies in display order.
    pub const ALL: [Competency; 5] = [
        Self::Communication,
        Self::CriticalThinking,
        Self::Adaptability,
        Self::Teamwork,
        Self::EmotionalIntelligence,
    ];

    /// Canonical name, used as the rubric JSON key and the stored competency name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Communication => "Communication",
            Self::CriticalThinking => "Critical thinking",
            Self::Adaptability => "Adaptability",
            Self::Teamwork => "Teamwork",
            Self::EmotionalIntelligence => "Emotional intelligence",
        }
    }
}

/// Coarse label derived from a session's aggregate score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum PerformanceLevel {
    #[strum(serialize = "Excellent")]
    Excellent,
    #[strum(serialize = "Good")]
    Good,
    #[strum(serialize = "Fair")]
    Fair,
    #[strum(serialize = "Needs improvement")]
    #[serde(rename = "Needs improvement")]
    NeedsImprovement,
}

/// Who authored a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageAuthor {
    Candidate,
    Interviewer,
}

// --- Storage entities ---

/// One simulated interview conversation owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub category: InterviewCategory,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    pub is_completed: bool,
    /// Time budget in seconds.
    pub total_time_allowed: i64,
    /// Accumulated running time in seconds, excluding the current running stretch.
    pub total_time_used: i64,
    pub is_paused: bool,
    /// Instant the timer was last started or resumed; `None` while not running.
    pub last_resume_time: Option<String>,
}

/// A session together with its message count, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: Session,
    pub message_count: i64,
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub author: MessageAuthor,
    pub content: String,
    pub created_at: String,
    /// Reference to synthesized audio, attached after creation.
    pub audio_path: Option<String>,
    pub tts_voice: Option<String>,
}

impl Message {
    /// Returns true if the candidate wrote this message.
    pub fn is_candidate(&self) -> bool {
        self.author == MessageAuthor::Candidate
    }
}

/// Score for one competency in one session. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyScore {
    pub id: String,
    pub session_id: String,
    pub competency_name: String,
    /// Integer score in `1..=10`.
    pub score: i64,
    pub feedback: String,
    pub example: String,
    pub improvement_area: String,
    pub created_at: String,
}

/// The session-level evaluation. At most one per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub id: String,
    pub session_id: String,
    pub overall_feedback: String,
    pub average_score: f64,
    pub performance_level: PerformanceLevel,
    pub questions_analyzed: i64,
    pub session_duration_minutes: i64,
    pub time_management_score: Option<f64>,
    pub feedback_time: Option<String>,
    pub time_evaluation_enabled: bool,
    pub generated_at: String,
}

/// Per-user rollup, recomputed from source rows after every new report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
    pub user_id: String,
    pub total_sessions_evaluated: i64,
    pub average_overall_score: f64,
    pub total_questions_answered: i64,
    pub total_session_time_minutes: i64,
    pub time_scored_sessions: i64,
    pub time_score_sum: f64,
    pub average_time_management_score: Option<f64>,
    pub strongest_competency: Option<String>,
    pub weakest_competency: Option<String>,
    pub last_updated: String,
}

/// Static reference data describing a competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyDefinition {
    pub name: String,
    pub description: String,
    pub evaluation_criteria: String,
    pub display_order: i64,
}

/// Rows removed by a delete operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub sessions: u64,
    pub messages: u64,
}

// --- Evaluation gate ---

/// Outcome of the evaluation eligibility check for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    /// A report already exists; evaluation is final.
    pub existing: bool,
    pub questions_count: usize,
    pub responses_count: usize,
    pub min_questions: usize,
    pub min_responses: usize,
    pub reason: String,
}

// --- Provider types ---

/// Speaker of a provider message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a provider conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ProviderMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: 1024,
        }
    }
}

/// A request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    /// Model override; `None` uses the provider's configured model.
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub generation: GenerationConfig,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A complete response from an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    /// Concatenated text of the response.
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
}
