// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the evaluation pipeline against a real SQLite store.

use std::sync::Arc;

use lumo_core::{LumoError, PerformanceLevel, StorageAdapter};
use lumo_evaluation::{EvaluationService, SessionEvaluation, Trend};
use lumo_test_utils::TestHarness;

fn rubric_json() -> String {
    serde_json::json!({
        "overall_feedback": "Confident answers with room to deepen examples.",
        "competency_scores": {
            "Communication": {"score": 8, "feedback": "Clear", "example": "Outage story", "improvement_area": "Pace"},
            "Critical thinking": {"score": 6, "feedback": "Sound", "example": "Root cause", "improvement_area": "Depth"},
            "Adaptability": {"score": 7, "feedback": "Flexible", "example": "New stack", "improvement_area": "Range"},
            "Teamwork": {"score": 9, "feedback": "Collaborative", "example": "Pairing", "improvement_area": "Delegation"},
            "Emotional intelligence": {"score": 5, "feedback": "Reserved", "example": "Conflict", "improvement_area": "Empathy"}
        }
    })
    .to_string()
}

async fn setup(responses: Vec<String>) -> (TestHarness, Arc<EvaluationService>) {
    let harness = TestHarness::builder()
        .with_mock_responses(responses)
        .build()
        .await
        .unwrap();
    let service = Arc::new(EvaluationService::from_config(
        harness.storage(),
        harness.provider(),
        &harness.config,
    ));
    (harness, service)
}

async fn ready_session(harness: &TestHarness, user: &str, used: i64) -> String {
    let session = harness.create_session(user).await.unwrap();
    harness.seed_conversation(&session.id, 7, 6).await.unwrap();
    harness.set_session_time(&session.id, 900, used).await.unwrap();
    session.id
}

#[tokio::test]
async fn well_used_session_is_evaluated_end_to_end() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session_id = ready_session(&harness, "alice", 810).await;

    let gate = service.eligibility(&session_id).await.unwrap();
    assert!(gate.eligible, "{}", gate.reason);
    assert_eq!(gate.questions_count, 7);
    assert_eq!(gate.responses_count, 6);

    let outcome = service.evaluate(&session_id).await.unwrap();
    assert!(!outcome.used_fallback);
    assert_eq!(outcome.report.average_score, 7.0);
    assert_eq!(outcome.report.performance_level, PerformanceLevel::Good);
    assert_eq!(outcome.report.questions_analyzed, 7);
    assert_eq!(outcome.report.session_duration_minutes, 12);
    assert_eq!(outcome.report.time_management_score, Some(10.0));
    assert!(outcome.report.time_evaluation_enabled);

    let stored = harness
        .storage
        .get_feedback_report(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.time_management_score, Some(10.0));
    let scores = harness.storage.get_competency_scores(&session_id).await.unwrap();
    assert_eq!(scores.len(), 5);

    let analytics = harness
        .storage
        .get_user_analytics("alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(analytics.total_sessions_evaluated, 1);
    assert_eq!(analytics.total_questions_answered, 7);
    assert_eq!(analytics.strongest_competency.as_deref(), Some("Teamwork"));
    assert_eq!(
        analytics.weakest_competency.as_deref(),
        Some("Emotional intelligence")
    );
    assert_eq!(analytics.average_time_management_score, Some(10.0));

    let requests = harness.provider.requests().await;
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[0].content.contains("Candidate: Answer 6."));
}

#[tokio::test]
async fn malformed_rubric_persists_neutral_scores() {
    let (harness, service) = setup(vec!["```json\n{\"overall_feedback\": \"cut".into()]).await;
    let session_id = ready_session(&harness, "bob", 450).await;

    let outcome = service.evaluate(&session_id).await.unwrap();
    assert!(outcome.used_fallback);
    assert_eq!(outcome.report.average_score, 7.0);
    assert_eq!(outcome.report.performance_level, PerformanceLevel::Good);
    assert_eq!(outcome.report.time_management_score, Some(6.3));

    let scores = harness.storage.get_competency_scores(&session_id).await.unwrap();
    assert_eq!(scores.len(), 5);
    assert!(scores.iter().all(|s| s.score == 7));
}

#[tokio::test]
async fn ineligible_session_never_reaches_the_model() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session = harness.create_session("carol").await.unwrap();
    harness.seed_conversation(&session.id, 3, 3).await.unwrap();

    let err = service.evaluate(&session.id).await.unwrap_err();
    match err {
        LumoError::Ineligible(report) => {
            assert!(!report.existing);
            assert_eq!(report.questions_count, 3);
            assert_eq!(report.min_questions, 7);
        }
        other => panic!("expected Ineligible, got {other:?}"),
    }
    assert_eq!(harness.provider.call_count().await, 0);
}

#[tokio::test]
async fn second_evaluation_is_rejected_as_existing() {
    let (harness, service) = setup(vec![rubric_json(), rubric_json()]).await;
    let session_id = ready_session(&harness, "dave", 810).await;

    service.evaluate(&session_id).await.unwrap();
    let err = service.evaluate(&session_id).await.unwrap_err();
    assert!(
        matches!(&err, LumoError::Ineligible(report) if report.existing),
        "got {err:?}"
    );
    assert_eq!(harness.provider.call_count().await, 1);
}

#[tokio::test]
async fn concurrent_evaluations_produce_one_report() {
    let (harness, service) = setup(vec![rubric_json(), rubric_json()]).await;
    let session_id = ready_session(&harness, "erin", 810).await;

    let (first, second) = tokio::join!(
        service.evaluate(&session_id),
        service.evaluate(&session_id)
    );
    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    assert_eq!(harness.provider.call_count().await, 1);
    assert_eq!(
        harness
            .storage
            .list_reports_for_user("erin")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn provider_failure_is_reported_and_nothing_is_stored() {
    let (harness, service) = setup(vec![]).await;
    harness.provider.set_failure(Some("quota exceeded".into())).await;
    let session_id = ready_session(&harness, "frank", 810).await;

    let err = service.evaluate(&session_id).await.unwrap_err();
    assert!(matches!(err, LumoError::Provider { .. }), "got {err:?}");
    assert!(
        harness
            .storage
            .get_feedback_report(&session_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn session_evaluation_view_before_and_after() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session_id = ready_session(&harness, "gina", 810).await;

    match service.session_evaluation("gina", &session_id).await.unwrap() {
        SessionEvaluation::Missing(gate) => assert!(gate.eligible),
        SessionEvaluation::Ready { .. } => panic!("no report yet"),
    }

    service.evaluate_for_user("gina", &session_id).await.unwrap();

    match service.session_evaluation("gina", &session_id).await.unwrap() {
        SessionEvaluation::Ready {
            report,
            competencies,
        } => {
            assert_eq!(report.session_id, session_id);
            let names: Vec<_> = competencies.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(
                names,
                [
                    "Communication",
                    "Critical thinking",
                    "Adaptability",
                    "Teamwork",
                    "Emotional intelligence"
                ]
            );
            assert_eq!(competencies[3].percentage, 90.0);
        }
        SessionEvaluation::Missing(_) => panic!("report expected"),
    }
}

#[tokio::test]
async fn other_users_cannot_see_or_evaluate_a_session() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session_id = ready_session(&harness, "hank", 810).await;

    let err = service.evaluate_for_user("mallory", &session_id).await.unwrap_err();
    assert!(matches!(err, LumoError::NotFound { .. }));
    let err = service
        .session_evaluation("mallory", &session_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LumoError::NotFound { .. }));
    assert_eq!(harness.provider.call_count().await, 0);
}

#[tokio::test]
async fn running_clock_counts_toward_time_score() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session_id = ready_session(&harness, "oscar", 0).await;

    let mut session = harness.storage.get_session(&session_id).await.unwrap().unwrap();
    session.is_active = true;
    session.is_paused = false;
    let resumed = chrono::Utc::now() - chrono::Duration::seconds(810);
    session.last_resume_time = Some(resumed.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
    harness.storage.update_session(&session).await.unwrap();

    let outcome = service.evaluate(&session_id).await.unwrap();
    assert_eq!(outcome.report.time_management_score, Some(10.0));
    assert_eq!(
        outcome.report.feedback_time.as_deref(),
        Some(lumo_evaluation::time_management::FEEDBACK_WELL_USED)
    );
}

#[tokio::test]
async fn interrupted_finish_clears_time_score() {
    let (harness, service) = setup(vec![rubric_json()]).await;
    let session_id = ready_session(&harness, "ivan", 810).await;
    service.evaluate(&session_id).await.unwrap();

    let session = harness.storage.get_session(&session_id).await.unwrap().unwrap();
    let report = service
        .apply_time_evaluation(&session, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.time_management_score, None);
    assert!(!report.time_evaluation_enabled);

    let analytics = harness.storage.get_user_analytics("ivan").await.unwrap().unwrap();
    assert_eq!(analytics.time_scored_sessions, 0);
    assert_eq!(analytics.average_time_management_score, None);
}

#[tokio::test]
async fn time_evaluation_without_report_is_a_no_op() {
    let (harness, service) = setup(vec![]).await;
    let session = harness.create_session("judy").await.unwrap();
    assert!(
        service
            .apply_time_evaluation(&session, false)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn progress_and_competency_analysis_span_sessions() {
    let (harness, service) = setup(vec![rubric_json(), "not json".into(), rubric_json()]).await;
    for _ in 0..3 {
        let session_id = ready_session(&harness, "kim", 810).await;
        service.evaluate(&session_id).await.unwrap();
    }

    let progress = service.user_progress("kim").await.unwrap();
    assert_eq!(progress.analytics.total_sessions_evaluated, 3);
    assert_eq!(progress.progress_trend.len(), 3);
    assert_eq!(progress.trend, Trend::Stable);
    assert!(progress.summary.contains("3 evaluated interviews"));

    let analysis = service.competency_analysis("kim").await.unwrap();
    assert_eq!(analysis.total_evaluations, 15);
    assert_eq!(analysis.competencies.len(), 5);
    assert_eq!(analysis.evolution["Teamwork"].len(), 3);

    let definitions = service.competency_definitions().await.unwrap();
    assert_eq!(definitions.len(), 5);
    assert_eq!(definitions[0].name, "Communication");
}
