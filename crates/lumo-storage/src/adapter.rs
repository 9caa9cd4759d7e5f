// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use lumo_config::model::StorageConfig;
use lumo_core::{AdapterType, HealthStatus, LumoError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::models::{
    CompetencyDefinition, CompetencyScore, DeleteSummary, FeedbackReport, Message, Session,
    SessionSummary, UserAnalytics,
};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. No connection is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, LumoError> {
        self.db.get().ok_or_else(|| LumoError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LumoError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumoError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), LumoError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LumoError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LumoError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Sessions ---

    async fn create_session(&self, session: &Session) -> Result<(), LumoError> {
        queries::sessions::create_session(self.db()?, session).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, LumoError> {
        queries::sessions::get_session(self.db()?, id).await
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, LumoError> {
        queries::sessions::list_sessions(self.db()?, Some(user_id), None).await
    }

    async fn list_recent_sessions(
        &self,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SessionSummary>, LumoError> {
        queries::sessions::list_sessions(self.db()?, user_id, Some(limit)).await
    }

    async fn update_session(&self, session: &Session) -> Result<(), LumoError> {
        if queries::sessions::update_session(self.db()?, session).await? {
            Ok(())
        } else {
            Err(LumoError::session_not_found(&session.id))
        }
    }

    async fn delete_sessions(
        &self,
        user_id: &str,
        ids: &[String],
    ) -> Result<DeleteSummary, LumoError> {
        queries::sessions::delete_sessions(self.db()?, user_id, ids).await
    }

    async fn delete_all_sessions(&self, user_id: &str) -> Result<DeleteSummary, LumoError> {
        queries::sessions::delete_all_sessions(self.db()?, user_id).await
    }

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), LumoError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn get_message(&self, id: &str) -> Result<Option<Message>, LumoError> {
        queries::messages::get_message(self.db()?, id).await
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>, LumoError> {
        queries::messages::get_messages_for_session(self.db()?, session_id).await
    }

    async fn attach_audio(
        &self,
        message_id: &str,
        audio_path: &str,
        voice: &str,
    ) -> Result<(), LumoError> {
        if queries::messages::attach_audio(self.db()?, message_id, audio_path, voice).await? {
            Ok(())
        } else {
            Err(LumoError::NotFound {
                entity: "message",
                id: message_id.to_string(),
            })
        }
    }

    // --- Evaluations ---

    async fn get_feedback_report(
        &self,
        session_id: &str,
    ) -> Result<Option<FeedbackReport>, LumoError> {
        queries::evaluations::get_report(self.db()?, session_id).await
    }

    async fn get_competency_scores(
        &self,
        session_id: &str,
    ) -> Result<Vec<CompetencyScore>, LumoError> {
        queries::evaluations::get_scores(self.db()?, session_id).await
    }

    async fn insert_evaluation(
        &self,
        report: &FeedbackReport,
        scores: &[CompetencyScore],
    ) -> Result<(), LumoError> {
        queries::evaluations::insert_evaluation(self.db()?, report, scores).await
    }

    async fn update_report_time(
        &self,
        session_id: &str,
        time_management_score: Option<f64>,
        feedback_time: Option<&str>,
        time_evaluation_enabled: bool,
    ) -> Result<(), LumoError> {
        let updated = queries::evaluations::update_report_time(
            self.db()?,
            session_id,
            time_management_score,
            feedback_time,
            time_evaluation_enabled,
        )
        .await?;
        if updated {
            Ok(())
        } else {
            Err(LumoError::NotFound {
                entity: "feedback report",
                id: session_id.to_string(),
            })
        }
    }

    async fn list_reports_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<FeedbackReport>, LumoError> {
        queries::evaluations::list_reports_for_user(self.db()?, user_id).await
    }

    async fn list_scores_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<CompetencyScore>, LumoError> {
        queries::evaluations::list_scores_for_user(self.db()?, user_id).await
    }

    // --- Analytics ---

    async fn get_user_analytics(
        &self,
        user_id: &str,
    ) -> Result<Option<UserAnalytics>, LumoError> {
        queries::analytics::get_user_analytics(self.db()?, user_id).await
    }

    async fn upsert_user_analytics(&self, analytics: &UserAnalytics) -> Result<(), LumoError> {
        queries::analytics::upsert_user_analytics(self.db()?, analytics).await
    }

    async fn list_competency_definitions(&self) -> Result<Vec<CompetencyDefinition>, LumoError> {
        queries::competencies::list_definitions(self.db()?).await
    }
}
