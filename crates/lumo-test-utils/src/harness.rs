// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness: a temp SQLite database, a scripted provider and helpers
//! for seeding interview conversations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lumo_config::LumoConfig;
use lumo_core::{
    InterviewCategory, LumoError, Message, MessageAuthor, ProviderAdapter, Session,
    StorageAdapter,
};
use lumo_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Instant the first seeded message is stamped with.
pub const SEED_START: &str = "2026-03-02T09:00:00.000Z";

/// Gap between consecutive seeded messages.
pub const SEED_STEP_SECS: i64 = 60;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: LumoConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: LumoConfig::default(),
        }
    }

    /// Script the mock provider.
    pub fn with_mock_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Override the question/response thresholds.
    pub fn with_thresholds(mut self, min_questions: usize, min_responses: usize) -> Self {
        self.config.evaluation.min_questions = min_questions;
        self.config.evaluation.min_responses = min_responses;
        self
    }

    /// Start from a custom configuration. The database path is always replaced.
    pub fn with_config(mut self, config: LumoConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn build(self) -> Result<TestHarness, LumoError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| LumoError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .into_owned();

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            storage: Arc::new(storage),
            provider: MockProvider::with_responses(self.responses),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A ready-to-use storage + provider pair backed by a throwaway database.
pub struct TestHarness {
    pub storage: Arc<SqliteStorage>,
    pub provider: MockProvider,
    pub config: LumoConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Storage as a trait object.
    pub fn storage(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }

    /// A handle to the mock provider as a trait object. Clones share state.
    pub fn provider(&self) -> Arc<dyn ProviderAdapter> {
        Arc::new(self.provider.clone())
    }

    /// Insert a session for `user_id` with a 900 second budget.
    pub async fn create_session(&self, user_id: &str) -> Result<Session, LumoError> {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category: InterviewCategory::It,
            title: InterviewCategory::It.label().to_string(),
            created_at: SEED_START.to_string(),
            updated_at: SEED_START.to_string(),
            is_active: true,
            is_completed: false,
            total_time_allowed: 900,
            total_time_used: 0,
            is_paused: false,
            last_resume_time: None,
        };
        self.storage.create_session(&session).await?;
        Ok(session)
    }

    /// Seed alternating interviewer questions and candidate answers,
    /// one minute apart, starting at [`SEED_START`].
    pub async fn seed_conversation(
        &self,
        session_id: &str,
        questions: usize,
        answers: usize,
    ) -> Result<Vec<Message>, LumoError> {
        let mut turns = Vec::new();
        for i in 0..questions.max(answers) {
            if i < questions {
                turns.push((MessageAuthor::Interviewer, format!("Question {}?", i + 1)));
            }
            if i < answers {
                turns.push((MessageAuthor::Candidate, format!("Answer {}.", i + 1)));
            }
        }
        self.seed_messages(session_id, turns).await
    }

    /// Seed the given turns in order, one minute apart.
    pub async fn seed_messages(
        &self,
        session_id: &str,
        turns: Vec<(MessageAuthor, String)>,
    ) -> Result<Vec<Message>, LumoError> {
        let start = seed_start();
        let mut messages = Vec::with_capacity(turns.len());
        for (i, (author, content)) in turns.into_iter().enumerate() {
            let at = start + Duration::seconds(SEED_STEP_SECS * i as i64);
            let message = Message {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                author,
                content,
                created_at: at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
                audio_path: None,
                tts_voice: None,
            };
            self.storage.insert_message(&message).await?;
            messages.push(message);
        }
        Ok(messages)
    }

    /// Overwrite a session's time budget and used time.
    pub async fn set_session_time(
        &self,
        session_id: &str,
        allowed: i64,
        used: i64,
    ) -> Result<Session, LumoError> {
        let mut session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| LumoError::session_not_found(session_id))?;
        session.total_time_allowed = allowed;
        session.total_time_used = used;
        self.storage.update_session(&session).await?;
        Ok(session)
    }
}

fn seed_start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(SEED_START)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
