// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::LumoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    CompetencyDefinition, CompetencyScore, DeleteSummary, FeedbackReport, Message, Session,
    SessionSummary, UserAnalytics,
};

/// Persistence for sessions, messages, evaluations and analytics.
///
/// Lookups return `Ok(None)` for missing rows; ownership checks are the
/// caller's job.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the backend (migrations, connection).
    async fn initialize(&self) -> Result<(), LumoError>;

    /// Closes the backend, flushing pending writes.
    async fn close(&self) -> Result<(), LumoError>;

    // --- Sessions ---

    async fn create_session(&self, session: &Session) -> Result<(), LumoError>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>, LumoError>;

    /// Lists a user's sessions, newest first, with message counts.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, LumoError>;

    /// Lists recent sessions across users (or for one user), newest first.
    async fn list_recent_sessions(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, LumoError>;

    /// Persists the mutable state and timer fields of an existing session.
    async fn update_session(&self, session: &Session) -> Result<(), LumoError>;

    /// Deletes the given sessions owned by `user_id`, cascading to their rows.
    async fn delete_sessions(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> Result<DeleteSummary, LumoError>;

    /// Deletes every session owned by `user_id`.
    async fn delete_all_sessions(&self, user_id: &str) -> Result<DeleteSummary, LumoError>;

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), LumoError>;

    async fn get_message(&self, id: &str) -> Result<Option<Message>, LumoError>;

    /// Messages of a session in creation order.
    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>, LumoError>;

    /// Attaches a synthesized audio reference to a message.
    async fn attach_audio(
        &self,
        message_id: &str,
        audio_path: &str,
        voice: &str,
    ) -> Result<(), LumoError>;

    // --- Evaluations ---

    async fn get_feedback_report(
        &self,
        session_id: &str,
    ) -> Result<Option<FeedbackReport>, LumoError>;

    async fn get_competency_scores(
        &self,
        session_id: &str,
    ) -> Result<Vec<CompetencyScore>, LumoError>;

    /// Writes the report and all score rows atomically.
    ///
    /// Fails with [`LumoError::AlreadyEvaluated`] when the session already has
    /// a report; nothing is written in that case.
    async fn insert_evaluation(
        &self,
        report: &FeedbackReport,
        scores: &[CompetencyScore],
    ) -> Result<(), LumoError>;

    /// Rewrites the time-management fields of an existing report.
    async fn update_report_time(
        &self,
        session_id: &str,
        time_management_score: Option<f64>,
        feedback_time: Option<&str>,
        time_evaluation_enabled: bool,
    ) -> Result<(), LumoError>;

    /// Every report of a user's sessions, oldest first.
    async fn list_reports_for_user(&self, user_id: &str)
    -> Result<Vec<FeedbackReport>, LumoError>;

    /// Every competency score of a user's sessions, oldest first.
    async fn list_scores_for_user(&self, user_id: &str)
    -> Result<Vec<CompetencyScore>, LumoError>;

    // --- Analytics ---

    async fn get_user_analytics(&self, user_id: &str)
    -> Result<Option<UserAnalytics>, LumoError>;

    async fn upsert_user_analytics(&self, analytics: &UserAnalytics) -> Result<(), LumoError>;

    async fn list_competency_definitions(&self) -> Result<Vec<CompetencyDefinition>, LumoError>;
}
