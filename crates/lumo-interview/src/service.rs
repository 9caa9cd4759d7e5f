// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: CRUD, interviewer chat turns and the session timer.

use std::sync::Arc;

use chrono::Utc;
use lumo_config::LumoConfig;
use lumo_config::model::{EvaluationConfig, GeminiConfig};
use lumo_core::{
    DeleteSummary, FeedbackReport, GenerationConfig, InterviewCategory, LumoError, Message,
    MessageAuthor, PerformanceLevel, ProviderAdapter, ProviderMessage, ProviderRequest, Session,
    SessionSummary, StorageAdapter,
};
use lumo_evaluation::EvaluationService;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::prompts::{OPENING_USER_TURN, system_prompt};
use crate::timer::{self, TickResult, TimerStatus, format_timestamp};

/// Parameters for a new session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub category: InterviewCategory,
    #[serde(default)]
    pub title: Option<String>,
    /// Time budget in seconds; the configured default when absent.
    #[serde(default)]
    pub time_allowed_secs: Option<i64>,
}

/// Outcome of the automatic evaluation attempted after a turn or a finish.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AutoEvaluation {
    Generated {
        average_score: f64,
        performance_level: PerformanceLevel,
    },
    Failed {
        error: String,
    },
}

/// Result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub candidate_message: Message,
    pub interviewer_message: Message,
    pub evaluation: Option<AutoEvaluation>,
}

/// Result of finishing a session.
#[derive(Debug, Clone, Serialize)]
pub struct FinishOutcome {
    pub session: Session,
    /// The session's report after the finish, if it has one.
    pub report: Option<FeedbackReport>,
    pub evaluation: Option<AutoEvaluation>,
}

/// Result of a timer tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickOutcome {
    pub status: TimerStatus,
    /// Present when the tick used up the budget and finished the session.
    pub finished: Option<FinishOutcome>,
}

/// Sampling for interviewer turns.
pub fn chat_generation(config: &GeminiConfig) -> GenerationConfig {
    GenerationConfig {
        temperature: config.temperature,
        top_k: Some(config.top_k),
        top_p: Some(config.top_p),
        max_output_tokens: config.max_output_tokens,
    }
}

/// Owns every per-user session operation. Access to a session owned by
/// another user is reported as not found.
pub struct SessionService {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    evaluation: Arc<EvaluationService>,
    generation: GenerationConfig,
    prompt_config: EvaluationConfig,
    default_time_allowed_secs: i64,
}

impl SessionService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        evaluation: Arc<EvaluationService>,
        config: &LumoConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            evaluation,
            generation: chat_generation(&config.gemini),
            prompt_config: config.evaluation.clone(),
            default_time_allowed_secs: config.session.default_time_allowed_secs,
        }
    }

    pub fn evaluation(&self) -> &Arc<EvaluationService> {
        &self.evaluation
    }

    // --- Sessions ---

    pub async fn create_session(
        &self,
        user_id: &str,
        new: NewSession,
    ) -> Result<Session, LumoError> {
        let total_time_allowed = new.time_allowed_secs.unwrap_or(self.default_time_allowed_secs);
        if total_time_allowed <= 0 {
            return Err(LumoError::BadRequest(
                "time_allowed_secs must be positive".to_string(),
            ));
        }
        let title = new
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| new.category.label().to_string());

        let now = format_timestamp(Utc::now());
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: new.category,
            title,
            created_at: now.clone(),
            updated_at: now,
            is_active: true,
            is_completed: false,
            total_time_allowed,
            total_time_used: 0,
            is_paused: false,
            last_resume_time: None,
        };
        self.storage.create_session(&session).await?;
        info!(session_id = %session.id, user_id, category = %session.category, "session created");
        Ok(session)
    }

    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, LumoError> {
        self.storage.list_sessions(user_id).await
    }

    pub async fn session(&self, user_id: &str, session_id: &str) -> Result<Session, LumoError> {
        self.evaluation.owned_session(user_id, session_id).await
    }

    pub async fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<DeleteSummary, LumoError> {
        let summary = self
            .storage
            .delete_sessions(user_id, &[session_id.to_string()])
            .await?;
        if summary.sessions == 0 {
            return Err(LumoError::session_not_found(session_id));
        }
        info!(session_id, user_id, messages = summary.messages, "session deleted");
        Ok(summary)
    }

    /// Deletes the listed sessions the user owns; ids of other users' sessions are skipped.
    pub async fn delete_sessions(
        &self,
        user_id: &str,
        session_ids: &[String],
    ) -> Result<DeleteSummary, LumoError> {
        if session_ids.is_empty() {
            return Err(LumoError::BadRequest("no session ids provided".to_string()));
        }
        let summary = self.storage.delete_sessions(user_id, session_ids).await?;
        info!(
            user_id,
            sessions = summary.sessions,
            messages = summary.messages,
            "sessions deleted"
        );
        Ok(summary)
    }

    pub async fn delete_all_sessions(&self, user_id: &str) -> Result<DeleteSummary, LumoError> {
        let summary = self.storage.delete_all_sessions(user_id).await?;
        info!(
            user_id,
            sessions = summary.sessions,
            messages = summary.messages,
            "all sessions deleted"
        );
        Ok(summary)
    }

    // --- Messages ---

    pub async fn messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(Session, Vec<Message>), LumoError> {
        let session = self.session(user_id, session_id).await?;
        let messages = self.storage.get_messages(session_id).await?;
        Ok((session, messages))
    }

    pub async fn message(&self, user_id: &str, message_id: &str) -> Result<Message, LumoError> {
        let not_found = || LumoError::NotFound {
            entity: "message",
            id: message_id.to_string(),
        };
        let message = self.storage.get_message(message_id).await?.ok_or_else(not_found)?;
        match self.session(user_id, &message.session_id).await {
            Ok(_) => Ok(message),
            Err(LumoError::NotFound { .. }) => Err(not_found()),
            Err(e) => Err(e),
        }
    }

    /// Records synthesized audio for a message the user can see.
    pub async fn attach_audio(
        &self,
        user_id: &str,
        message_id: &str,
        audio_path: &str,
        voice: &str,
    ) -> Result<Message, LumoError> {
        self.message(user_id, message_id).await?;
        self.storage.attach_audio(message_id, audio_path, voice).await?;
        self.message(user_id, message_id).await
    }

    /// Stores the candidate's message, asks the model for the interviewer's
    /// reply, stores it, then evaluates the session if it just became eligible.
    pub async fn chat(
        &self,
        user_id: &str,
        session_id: &str,
        content: &str,
    ) -> Result<ChatTurn, LumoError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(LumoError::BadRequest("message must not be empty".to_string()));
        }
        let mut session = self.session(user_id, session_id).await?;
        if session.is_completed {
            return Err(LumoError::InvalidState(format!(
                "session {session_id} is completed"
            )));
        }

        let candidate_message = self
            .store_message(session_id, MessageAuthor::Candidate, content)
            .await?;

        let history = self.storage.get_messages(session_id).await?;
        let request = ProviderRequest {
            model: None,
            system_prompt: Some(system_prompt(session.category, &self.prompt_config)),
            messages: provider_history(&history),
            generation: self.generation.clone(),
        };
        debug!(session_id, history = history.len(), "requesting interviewer turn");
        let response = self.provider.complete(request).await?;

        let interviewer_message = self
            .store_message(session_id, MessageAuthor::Interviewer, response.content.trim())
            .await?;

        session.updated_at = interviewer_message.created_at.clone();
        self.storage.update_session(&session).await?;

        let evaluation = self.auto_evaluate(session_id).await;
        Ok(ChatTurn {
            candidate_message,
            interviewer_message,
            evaluation,
        })
    }

    async fn store_message(
        &self,
        session_id: &str,
        author: MessageAuthor,
        content: &str,
    ) -> Result<Message, LumoError> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            author,
            content: content.to_string(),
            created_at: format_timestamp(Utc::now()),
            audio_path: None,
            tts_voice: None,
        };
        self.storage.insert_message(&message).await?;
        Ok(message)
    }

    /// Evaluates the session when eligible. Errors are reported, not raised.
    async fn auto_evaluate(&self, session_id: &str) -> Option<AutoEvaluation> {
        let gate = match self.evaluation.eligibility(session_id).await {
            Ok(gate) => gate,
            Err(e) => {
                warn!(session_id, error = %e, "eligibility check failed");
                return Some(AutoEvaluation::Failed {
                    error: e.to_string(),
                });
            }
        };
        if !gate.eligible {
            debug!(session_id, reason = %gate.reason, "session not ready for evaluation");
            return None;
        }

        match self.evaluation.evaluate(session_id).await {
            Ok(outcome) => Some(AutoEvaluation::Generated {
                average_score: outcome.report.average_score,
                performance_level: outcome.report.performance_level,
            }),
            Err(LumoError::Ineligible(report)) => {
                debug!(session_id, reason = %report.reason, "automatic evaluation skipped");
                None
            }
            Err(e) => {
                warn!(session_id, error = %e, "automatic evaluation failed");
                Some(AutoEvaluation::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    // --- Timer ---

    pub async fn timer_status(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<TimerStatus, LumoError> {
        let session = self.session(user_id, session_id).await?;
        Ok(timer::status(&session, Utc::now()))
    }

    pub async fn start_timer(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<TimerStatus, LumoError> {
        self.transition(user_id, session_id, timer::start).await
    }

    pub async fn pause_timer(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<TimerStatus, LumoError> {
        self.transition(user_id, session_id, timer::pause).await
    }

    pub async fn resume_timer(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<TimerStatus, LumoError> {
        self.transition(user_id, session_id, timer::resume).await
    }

    async fn transition(
        &self,
        user_id: &str,
        session_id: &str,
        apply: fn(&mut Session, chrono::DateTime<Utc>) -> Result<(), LumoError>,
    ) -> Result<TimerStatus, LumoError> {
        let mut session = self.session(user_id, session_id).await?;
        let now = Utc::now();
        apply(&mut session, now)?;
        session.updated_at = format_timestamp(now);
        self.storage.update_session(&session).await?;
        Ok(timer::status(&session, now))
    }

    /// Adds client-measured seconds; finishes the session once the budget is used.
    pub async fn tick_timer(
        &self,
        user_id: &str,
        session_id: &str,
        seconds: i64,
    ) -> Result<TickOutcome, LumoError> {
        let mut session = self.session(user_id, session_id).await?;
        let now = Utc::now();
        let result = timer::tick(&mut session, seconds)?;
        session.updated_at = format_timestamp(now);
        self.storage.update_session(&session).await?;

        let finished = match result {
            TickResult::Running => None,
            TickResult::Exhausted => Some(self.finish_session(session.clone(), false).await?),
        };
        let status = match &finished {
            Some(outcome) => timer::status(&outcome.session, now),
            None => timer::status(&session, now),
        };
        Ok(TickOutcome { status, finished })
    }

    pub async fn finish_timer(
        &self,
        user_id: &str,
        session_id: &str,
        interrupted: bool,
    ) -> Result<FinishOutcome, LumoError> {
        let session = self.session(user_id, session_id).await?;
        self.finish_session(session, interrupted).await
    }

    /// Completes the session, then brings its report up to date: an existing
    /// report gets its time evaluation recomputed, a missing one is generated
    /// when the session is eligible.
    async fn finish_session(
        &self,
        mut session: Session,
        interrupted: bool,
    ) -> Result<FinishOutcome, LumoError> {
        let now = Utc::now();
        timer::finish(&mut session, now);
        session.updated_at = format_timestamp(now);
        self.storage.update_session(&session).await?;
        info!(
            session_id = %session.id,
            used_secs = session.total_time_used,
            interrupted,
            "session finished"
        );

        let mut evaluation = None;
        let report = match self.evaluation.apply_time_evaluation(&session, interrupted).await? {
            Some(report) => Some(report),
            None => {
                evaluation = self.auto_evaluate(&session.id).await;
                if interrupted && matches!(evaluation, Some(AutoEvaluation::Generated { .. })) {
                    self.evaluation.apply_time_evaluation(&session, true).await?
                } else {
                    self.storage.get_feedback_report(&session.id).await?
                }
            }
        };

        Ok(FinishOutcome {
            session,
            report,
            evaluation,
        })
    }
}

/// Maps stored messages to provider turns, starting with a user turn.
pub fn provider_history(messages: &[Message]) -> Vec<ProviderMessage> {
    let mut turns = Vec::with_capacity(messages.len() + 1);
    if messages.first().is_some_and(|m| m.author == MessageAuthor::Interviewer) {
        turns.push(ProviderMessage::user(OPENING_USER_TURN));
    }
    turns.extend(messages.iter().map(|m| match m.author {
        MessageAuthor::Candidate => ProviderMessage::user(m.content.clone()),
        MessageAuthor::Interviewer => ProviderMessage::assistant(m.content.clone()),
    }));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumo_core::ChatRole;

    fn message(author: MessageAuthor, content: &str) -> Message {
        Message {
            id: content.into(),
            session_id: "s".into(),
            author,
            content: content.into(),
            created_at: String::new(),
            audio_path: None,
            tts_voice: None,
        }
    }

    #[test]
    fn history_starting_with_interviewer_gets_an_opener() {
        let turns = provider_history(&[
            message(MessageAuthor::Interviewer, "Welcome! First question?"),
            message(MessageAuthor::Candidate, "Hello"),
        ]);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], ProviderMessage::user(OPENING_USER_TURN));
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[2].role, ChatRole::User);
    }

    #[test]
    fn history_starting_with_candidate_is_unchanged() {
        let turns = provider_history(&[message(MessageAuthor::Candidate, "Hi")]);
        assert_eq!(turns, vec![ProviderMessage::user("Hi")]);
    }

    #[test]
    fn chat_generation_uses_chat_sampling() {
        let generation = chat_generation(&GeminiConfig::default());
        assert_eq!(generation.temperature, 0.7);
        assert_eq!(generation.max_output_tokens, 1024);
    }
}
