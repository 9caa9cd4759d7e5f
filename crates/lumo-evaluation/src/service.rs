// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The evaluation pipeline and the read models built on its output.

use std::sync::Arc;

use dashmap::DashMap;
use lumo_config::LumoConfig;
use lumo_config::model::{EvaluationConfig, GeminiConfig};
use lumo_core::{
    CompetencyDefinition, CompetencyScore, EligibilityReport, FeedbackReport, GenerationConfig,
    LumoError, ProviderAdapter, Session, StorageAdapter, UserAnalytics,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analytics::{self, CompetencyAnalysis, UserProgress};
use crate::eligibility::{check_eligibility, check_substance};
use crate::rubric::{build_rubric_request, parse_rubric};
use crate::scoring::{average_score, performance_level, session_duration_minutes};
use crate::time_management::{self, TimeAssessment};

/// Result of a successful evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub report: FeedbackReport,
    pub scores: Vec<CompetencyScore>,
    /// The model output was unusable and neutral scores were stored.
    pub used_fallback: bool,
}

/// One competency row of the session evaluation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetencyView {
    pub name: String,
    pub score: i64,
    pub feedback: String,
    pub example: String,
    pub improvement_area: String,
    pub percentage: f64,
}

impl From<CompetencyScore> for CompetencyView {
    fn from(score: CompetencyScore) -> Self {
        Self {
            percentage: score.score as f64 * 10.0,
            name: score.competency_name,
            score: score.score,
            feedback: score.feedback,
            example: score.example,
            improvement_area: score.improvement_area,
        }
    }
}

/// A session's evaluation, or why there is none yet.
#[derive(Debug, Clone)]
pub enum SessionEvaluation {
    Ready {
        report: FeedbackReport,
        competencies: Vec<CompetencyView>,
    },
    Missing(EligibilityReport),
}

/// Sampling for rubric requests: low temperature, larger output budget.
pub fn evaluation_generation(config: &GeminiConfig) -> GenerationConfig {
    GenerationConfig {
        temperature: config.evaluation_temperature,
        top_k: Some(config.top_k),
        top_p: Some(config.top_p),
        max_output_tokens: config.evaluation_max_output_tokens,
    }
}

/// Mutexes keyed by id, dropped from the map once nobody holds them.
#[derive(Default)]
struct KeyedLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        self.inner.entry(key.to_string()).or_default().clone()
    }

    fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.inner.remove_if(key, |_, l| Arc::strong_count(l) == 1);
    }
}

/// Runs the eligibility gate, the rubric request and persistence, and keeps
/// user analytics in step with stored reports.
///
/// Evaluations of the same session are serialized in-process; the storage
/// uniqueness constraint on the report remains the final arbiter.
pub struct EvaluationService {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    config: EvaluationConfig,
    generation: GenerationConfig,
    session_locks: KeyedLocks,
    user_locks: KeyedLocks,
}

impl EvaluationService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        config: EvaluationConfig,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            storage,
            provider,
            config,
            generation,
            session_locks: KeyedLocks::default(),
            user_locks: KeyedLocks::default(),
        }
    }

    pub fn from_config(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        config: &LumoConfig,
    ) -> Self {
        Self::new(
            storage,
            provider,
            config.evaluation.clone(),
            evaluation_generation(&config.gemini),
        )
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Loads a session owned by `user_id`. Another user's session is not found.
    pub async fn owned_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, LumoError> {
        match self.storage.get_session(session_id).await? {
            Some(session) if session.user_id == user_id => Ok(session),
            _ => Err(LumoError::session_not_found(session_id)),
        }
    }

    /// Eligibility of a session. Read-only.
    pub async fn eligibility(&self, session_id: &str) -> Result<EligibilityReport, LumoError> {
        let has_report = self.storage.get_feedback_report(session_id).await?.is_some();
        let messages = self.storage.get_messages(session_id).await?;
        Ok(check_eligibility(has_report, &messages, &self.config))
    }

    /// Evaluates a session owned by `user_id`.
    pub async fn evaluate_for_user(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<EvaluationOutcome, LumoError> {
        self.owned_session(user_id, session_id).await?;
        self.evaluate(session_id).await
    }

    /// Runs the pipeline for one session.
    ///
    /// Fails with [`LumoError::Ineligible`] when the gate rejects the session
    /// and with [`LumoError::Provider`] when the model call fails. Unusable
    /// model output is replaced by neutral scores, never surfaced as an error.
    pub async fn evaluate(&self, session_id: &str) -> Result<EvaluationOutcome, LumoError> {
        let lock = self.session_locks.acquire(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.evaluate_locked(session_id).await
        };
        self.session_locks.release(session_id, lock);
        result
    }

    async fn evaluate_locked(&self, session_id: &str) -> Result<EvaluationOutcome, LumoError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| LumoError::session_not_found(session_id))?;
        let messages = self.storage.get_messages(session_id).await?;
        let has_report = self.storage.get_feedback_report(session_id).await?.is_some();

        let gate = check_eligibility(has_report, &messages, &self.config);
        let gate = check_substance(gate, messages.len(), self.config.min_messages);
        if !gate.eligible {
            debug!(session_id, reason = %gate.reason, "session not eligible for evaluation");
            return Err(LumoError::Ineligible(Box::new(gate)));
        }

        let request = build_rubric_request(&messages, self.generation.clone());
        let response = self.provider.complete(request).await?;
        let rubric = parse_rubric(&response.content);
        if rubric.fallback {
            warn!(session_id, "stored neutral scores after unusable rubric output");
        }

        let average = average_score(&rubric.competencies);
        let used = time_management::used_seconds(&session, chrono::Utc::now());
        let time = time_management::assess_time(session.total_time_allowed, used);
        let now = timestamp_now();

        let report = FeedbackReport {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            overall_feedback: rubric.overall_feedback,
            average_score: average,
            performance_level: performance_level(average),
            questions_analyzed: gate.questions_count as i64,
            session_duration_minutes: session_duration_minutes(&messages),
            time_management_score: time.score,
            feedback_time: Some(time.feedback),
            time_evaluation_enabled: true,
            generated_at: now.clone(),
        };
        let scores: Vec<CompetencyScore> = rubric
            .competencies
            .into_iter()
            .map(|c| CompetencyScore {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                competency_name: c.competency.name().to_string(),
                score: c.score,
                feedback: c.feedback,
                example: c.example,
                improvement_area: c.improvement_area,
                created_at: now.clone(),
            })
            .collect();

        self.storage.insert_evaluation(&report, &scores).await?;
        info!(
            session_id,
            user_id = %session.user_id,
            average_score = report.average_score,
            performance_level = %report.performance_level,
            questions = report.questions_analyzed,
            duration_minutes = report.session_duration_minutes,
            "evaluation persisted"
        );

        self.refresh_analytics(&session.user_id).await?;

        Ok(EvaluationOutcome {
            report,
            scores,
            used_fallback: rubric.fallback,
        })
    }

    /// Recomputes the time-management fields of an existing report after the
    /// session timer finishes. Returns `None` when the session has no report.
    pub async fn apply_time_evaluation(
        &self,
        session: &Session,
        interrupted: bool,
    ) -> Result<Option<FeedbackReport>, LumoError> {
        if self.storage.get_feedback_report(&session.id).await?.is_none() {
            return Ok(None);
        }

        let TimeAssessment { feedback, score } = if interrupted {
            time_management::interrupted()
        } else {
            let used = time_management::used_seconds(session, chrono::Utc::now());
            time_management::assess_time(session.total_time_allowed, used)
        };
        self.storage
            .update_report_time(&session.id, score, Some(&feedback), !interrupted)
            .await?;
        debug!(session_id = %session.id, ?score, interrupted, "report time evaluation updated");

        self.refresh_analytics(&session.user_id).await?;
        self.storage.get_feedback_report(&session.id).await
    }

    /// Rebuilds and stores the analytics rollup for `user_id`.
    pub async fn refresh_analytics(&self, user_id: &str) -> Result<UserAnalytics, LumoError> {
        let lock = self.user_locks.acquire(user_id);
        let result = {
            let _guard = lock.lock().await;
            self.refresh_analytics_locked(user_id).await
        };
        self.user_locks.release(user_id, lock);
        result
    }

    async fn refresh_analytics_locked(&self, user_id: &str) -> Result<UserAnalytics, LumoError> {
        let reports = self.storage.list_reports_for_user(user_id).await?;
        let scores = self.storage.list_scores_for_user(user_id).await?;
        let analytics =
            analytics::compute_user_analytics(user_id, &reports, &scores, &timestamp_now());
        self.storage.upsert_user_analytics(&analytics).await?;
        info!(
            user_id,
            sessions = analytics.total_sessions_evaluated,
            average_score = analytics.average_overall_score,
            "user analytics refreshed"
        );
        Ok(analytics)
    }

    /// The stored evaluation of a session owned by `user_id`, or its
    /// eligibility diagnostics when it has none.
    pub async fn session_evaluation(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionEvaluation, LumoError> {
        self.owned_session(user_id, session_id).await?;
        match self.storage.get_feedback_report(session_id).await? {
            Some(report) => {
                let competencies = self
                    .storage
                    .get_competency_scores(session_id)
                    .await?
                    .into_iter()
                    .map(CompetencyView::from)
                    .collect();
                Ok(SessionEvaluation::Ready {
                    report,
                    competencies,
                })
            }
            None => Ok(SessionEvaluation::Missing(self.eligibility(session_id).await?)),
        }
    }

    /// Stored rollup plus progress trend, strengths and a narrative summary.
    pub async fn user_progress(&self, user_id: &str) -> Result<UserProgress, LumoError> {
        let reports = self.storage.list_reports_for_user(user_id).await?;
        let scores = self.storage.list_scores_for_user(user_id).await?;
        let analytics = match self.storage.get_user_analytics(user_id).await? {
            Some(stored) => stored,
            None => analytics::compute_user_analytics(user_id, &reports, &scores, &timestamp_now()),
        };
        Ok(analytics::user_progress(analytics, &reports, &scores))
    }

    pub async fn competency_analysis(
        &self,
        user_id: &str,
    ) -> Result<CompetencyAnalysis, LumoError> {
        let scores = self.storage.list_scores_for_user(user_id).await?;
        Ok(analytics::competency_analysis(&scores))
    }

    pub async fn competency_definitions(&self) -> Result<Vec<CompetencyDefinition>, LumoError> {
        self.storage.list_competency_definitions().await
    }
}

fn timestamp_now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_locks_are_released() {
        let locks = KeyedLocks::default();
        let first = locks.acquire("s1");
        let second = locks.acquire("s1");
        assert!(Arc::ptr_eq(&first, &second));

        locks.release("s1", first);
        assert_eq!(locks.inner.len(), 1);
        locks.release("s1", second);
        assert!(locks.inner.is_empty());
    }

    #[test]
    fn competency_view_percentage() {
        let view = CompetencyView::from(CompetencyScore {
            id: "c".into(),
            session_id: "s".into(),
            competency_name: "Teamwork".into(),
            score: 7,
            feedback: "f".into(),
            example: "e".into(),
            improvement_area: "i".into(),
            created_at: "t".into(),
        });
        assert_eq!(view.percentage, 70.0);
        assert_eq!(view.name, "Teamwork");
    }

    #[test]
    fn generation_uses_evaluation_sampling() {
        let generation = evaluation_generation(&GeminiConfig::default());
        assert_eq!(generation.temperature, 0.3);
        assert_eq!(generation.max_output_tokens, 2048);
        assert_eq!(generation.top_k, Some(40));
    }
}
