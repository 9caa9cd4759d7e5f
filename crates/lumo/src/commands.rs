// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands: `lumo sessions`, `lumo evaluate` and `lumo analytics`.
//!
//! These work directly against the configured database. Only `evaluate`
//! needs the model provider.

use std::sync::Arc;

use lumo_config::LumoConfig;
use lumo_config::model::EvaluationConfig;
use lumo_core::{
    EligibilityReport, FeedbackReport, LumoError, ProviderAdapter, SessionSummary,
    StorageAdapter, UserAnalytics,
};
use lumo_evaluation::analytics::compute_user_analytics;
use lumo_evaluation::{EvaluationService, check_eligibility};
use lumo_gemini::GeminiProvider;
use lumo_storage::{SqliteStorage, now_timestamp};

/// One line of the `lumo sessions` listing.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub summary: SessionSummary,
    pub eligibility: EligibilityReport,
}

async fn open_storage(config: &LumoConfig) -> Result<Arc<dyn StorageAdapter>, LumoError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Recent sessions with their eligibility decision.
pub async fn session_rows(
    storage: &dyn StorageAdapter,
    config: &EvaluationConfig,
    user_id: Option<&str>,
    limit: usize,
) -> Result<Vec<SessionRow>, LumoError> {
    let summaries = storage.list_recent_sessions(user_id, limit).await?;
    let mut rows = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let has_report = storage
            .get_feedback_report(&summary.session.id)
            .await?
            .is_some();
        let messages = storage.get_messages(&summary.session.id).await?;
        let eligibility = check_eligibility(has_report, &messages, config);
        rows.push(SessionRow {
            summary,
            eligibility,
        });
    }
    Ok(rows)
}

pub fn format_session_row(row: &SessionRow) -> String {
    let session = &row.summary.session;
    let decision = if row.eligibility.existing {
        "evaluated"
    } else if row.eligibility.eligible {
        "eligible"
    } else {
        "not eligible"
    };
    format!(
        "{id}  user={user}  category={category}  messages={count}  q={q}/{min_q}  r={r}/{min_r}  {decision}: {reason}",
        id = session.id,
        user = session.user_id,
        category = session.category,
        count = row.summary.message_count,
        q = row.eligibility.questions_count,
        min_q = row.eligibility.min_questions,
        r = row.eligibility.responses_count,
        min_r = row.eligibility.min_responses,
        reason = row.eligibility.reason,
    )
}

pub async fn run_sessions(
    config: &LumoConfig,
    user_id: Option<&str>,
    limit: usize,
) -> Result<(), LumoError> {
    let storage = open_storage(config).await?;
    let rows = session_rows(storage.as_ref(), &config.evaluation, user_id, limit).await?;
    if rows.is_empty() {
        println!("no sessions found");
    }
    for row in &rows {
        println!("{}", format_session_row(row));
    }
    storage.close().await
}

fn format_report(report: &FeedbackReport) -> String {
    let time_score = report
        .time_management_score
        .map_or_else(|| "n/a".to_string(), |score| format!("{score:.1}"));
    format!(
        "session {}\n  average score: {:.1} ({})\n  questions analyzed: {}\n  duration: {} min\n  time management: {}\n  {}",
        report.session_id,
        report.average_score,
        report.performance_level,
        report.questions_analyzed,
        report.session_duration_minutes,
        time_score,
        report.overall_feedback,
    )
}

pub async fn run_evaluate(config: LumoConfig, session_id: &str) -> Result<(), LumoError> {
    let storage = open_storage(&config).await?;
    let provider: Arc<dyn ProviderAdapter> = Arc::new(GeminiProvider::new(&config.gemini)?);
    let service = EvaluationService::from_config(storage.clone(), provider, &config);

    if storage.get_session(session_id).await?.is_none() {
        storage.close().await?;
        return Err(LumoError::session_not_found(session_id));
    }

    let result = match service.evaluate(session_id).await {
        Ok(outcome) => {
            if outcome.used_fallback {
                println!("model output was unusable; neutral scores were stored");
            }
            println!("{}", format_report(&outcome.report));
            for score in &outcome.scores {
                println!("  {:<24} {:>2}/10", score.competency_name, score.score);
            }
            Ok(())
        }
        Err(LumoError::Ineligible(gate)) if gate.existing => {
            match storage.get_feedback_report(session_id).await? {
                Some(report) => {
                    println!("already evaluated");
                    println!("{}", format_report(&report));
                }
                None => println!("{}", gate.reason),
            }
            Ok(())
        }
        Err(e) => Err(e),
    };

    storage.close().await?;
    result
}

/// Rebuilds and stores a user's rollup from their reports and scores.
pub async fn recompute_analytics(
    storage: &dyn StorageAdapter,
    user_id: &str,
) -> Result<UserAnalytics, LumoError> {
    let reports = storage.list_reports_for_user(user_id).await?;
    let scores = storage.list_scores_for_user(user_id).await?;
    let analytics = compute_user_analytics(user_id, &reports, &scores, &now_timestamp());
    storage.upsert_user_analytics(&analytics).await?;
    Ok(analytics)
}

pub async fn run_analytics(config: &LumoConfig, user_id: &str) -> Result<(), LumoError> {
    let storage = open_storage(config).await?;
    let analytics = recompute_analytics(storage.as_ref(), user_id).await?;
    let rendered = serde_json::to_string_pretty(&analytics)
        .map_err(|e| LumoError::Internal(format!("failed to render analytics: {e}")))?;
    println!("{rendered}");
    storage.close().await
}
