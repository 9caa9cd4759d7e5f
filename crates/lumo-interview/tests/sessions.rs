// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle, chat and timer tests against a real SQLite store.

use std::sync::Arc;

use lumo_core::{ChatRole, InterviewCategory, LumoError, PerformanceLevel, StorageAdapter};
use lumo_evaluation::EvaluationService;
use lumo_interview::{AutoEvaluation, NewSession, SessionService, TimerState};
use lumo_test_utils::TestHarness;

fn rubric_json() -> String {
    let entry = |score: i64| {
        serde_json::json!({
            "score": score,
            "feedback": "f",
            "example": "e",
            "improvement_area": "i"
        })
    };
    serde_json::json!({
        "overall_feedback": "Well done.",
        "competency_scores": {
            "Communication": entry(8),
            "Critical thinking": entry(8),
            "Adaptability": entry(8),
            "Teamwork": entry(8),
            "Emotional intelligence": entry(8)
        }
    })
    .to_string()
}

fn service_for(harness: &TestHarness) -> SessionService {
    let evaluation = Arc::new(EvaluationService::from_config(
        harness.storage(),
        harness.provider(),
        &harness.config,
    ));
    SessionService::new(
        harness.storage(),
        harness.provider(),
        evaluation,
        &harness.config,
    )
}

fn new_session(category: InterviewCategory) -> NewSession {
    NewSession {
        category,
        title: None,
        time_allowed_secs: None,
    }
}

#[tokio::test]
async fn create_applies_defaults_and_validates_budget() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);

    let session = service
        .create_session("alice", new_session(InterviewCategory::Hr))
        .await
        .unwrap();
    assert_eq!(session.title, "Human Resources");
    assert_eq!(session.total_time_allowed, 900);
    assert!(session.is_active);
    assert!(!session.is_completed);

    let custom = service
        .create_session(
            "alice",
            NewSession {
                category: InterviewCategory::It,
                title: Some("  Backend role ".into()),
                time_allowed_secs: Some(1200),
            },
        )
        .await
        .unwrap();
    assert_eq!(custom.title, "Backend role");
    assert_eq!(custom.total_time_allowed, 1200);

    let err = service
        .create_session(
            "alice",
            NewSession {
                time_allowed_secs: Some(0),
                ..new_session(InterviewCategory::It)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LumoError::BadRequest(_)));

    assert_eq!(service.list_sessions("alice").await.unwrap().len(), 2);
    assert!(service.list_sessions("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn deletes_report_removed_counts_and_respect_ownership() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let session = harness.create_session("alice").await.unwrap();
        harness.seed_conversation(&session.id, 2, 2).await.unwrap();
        ids.push(session.id);
    }
    let other = harness.create_session("bob").await.unwrap();

    let err = service.delete_session("alice", &other.id).await.unwrap_err();
    assert!(matches!(err, LumoError::NotFound { .. }));

    let one = service.delete_session("alice", &ids[0]).await.unwrap();
    assert_eq!((one.sessions, one.messages), (1, 4));

    let bulk = service
        .delete_sessions("alice", &[ids[1].clone(), other.id.clone()])
        .await
        .unwrap();
    assert_eq!((bulk.sessions, bulk.messages), (1, 4));

    let err = service.delete_sessions("alice", &[]).await.unwrap_err();
    assert!(matches!(err, LumoError::BadRequest(_)));

    let all = service.delete_all_sessions("alice").await.unwrap();
    assert_eq!((all.sessions, all.messages), (1, 4));
    assert!(harness.storage.get_session(&other.id).await.unwrap().is_some());
}

#[tokio::test]
async fn messages_are_private_to_their_owner() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();
    let seeded = harness.seed_conversation(&session.id, 1, 1).await.unwrap();

    let (_, messages) = service.messages("alice", &session.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(matches!(
        service.messages("bob", &session.id).await,
        Err(LumoError::NotFound { .. })
    ));

    let found = service.message("alice", &seeded[0].id).await.unwrap();
    assert_eq!(found.content, seeded[0].content);
    assert!(matches!(
        service.message("bob", &seeded[0].id).await,
        Err(LumoError::NotFound { entity: "message", .. })
    ));

    let with_audio = service
        .attach_audio("alice", &seeded[0].id, "audio/msg-1.wav", "Leda")
        .await
        .unwrap();
    assert_eq!(with_audio.audio_path.as_deref(), Some("audio/msg-1.wav"));
    assert_eq!(with_audio.tts_voice.as_deref(), Some("Leda"));
}

#[tokio::test]
async fn chat_turns_run_until_the_session_is_evaluated() {
    let harness = TestHarness::builder()
        .with_thresholds(2, 2)
        .with_mock_responses(["First question?", "Second question?", "Third question?"])
        .build()
        .await
        .unwrap();
    harness.provider.add_response(rubric_json()).await;
    let service = service_for(&harness);
    let session = service
        .create_session("alice", new_session(InterviewCategory::Finance))
        .await
        .unwrap();

    let first = service.chat("alice", &session.id, " Hello! ").await.unwrap();
    assert_eq!(first.candidate_message.content, "Hello!");
    assert_eq!(first.interviewer_message.content, "First question?");
    assert_eq!(first.evaluation, None);

    // Four messages pass the counts but not the minimum conversation length.
    let second = service.chat("alice", &session.id, "Answer one").await.unwrap();
    assert_eq!(second.evaluation, None);

    let third = service.chat("alice", &session.id, "Answer two").await.unwrap();
    assert_eq!(
        third.evaluation,
        Some(AutoEvaluation::Generated {
            average_score: 8.0,
            performance_level: PerformanceLevel::Excellent,
        })
    );

    let requests = harness.provider.requests().await;
    assert_eq!(requests.len(), 4);
    assert!(
        requests[0]
            .system_prompt
            .as_deref()
            .unwrap()
            .contains("Finance and Administration")
    );
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[2].messages.len(), 5);
    assert_eq!(requests[2].messages[4].role, ChatRole::User);
    assert_eq!(requests[2].messages[4].content, "Answer two");

    let messages = harness.storage.get_messages(&session.id).await.unwrap();
    assert_eq!(messages.len(), 6);
}

#[tokio::test]
async fn evaluation_failure_is_reported_in_the_turn() {
    let harness = TestHarness::builder()
        .with_thresholds(1, 1)
        .with_mock_responses(["Next question?"])
        .build()
        .await
        .unwrap();
    harness.provider.add_failure("model overloaded").await;
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();
    harness.seed_conversation(&session.id, 2, 1).await.unwrap();

    let turn = service.chat("alice", &session.id, "My answer").await.unwrap();
    match turn.evaluation {
        Some(AutoEvaluation::Failed { error }) => assert!(error.contains("model overloaded")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(turn.interviewer_message.content, "Next question?");
}

#[tokio::test]
async fn chat_rejects_empty_and_completed_sessions() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();

    assert!(matches!(
        service.chat("alice", &session.id, "   ").await,
        Err(LumoError::BadRequest(_))
    ));

    service.finish_timer("alice", &session.id, false).await.unwrap();
    assert!(matches!(
        service.chat("alice", &session.id, "hello").await,
        Err(LumoError::InvalidState(_))
    ));
    assert_eq!(harness.provider.call_count().await, 0);
}

#[tokio::test]
async fn model_failure_fails_the_turn() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness.provider.set_failure(Some("network down".into())).await;
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();

    let err = service.chat("alice", &session.id, "Hi").await.unwrap_err();
    assert!(matches!(err, LumoError::Provider { .. }));
}

#[tokio::test]
async fn timer_transitions_are_persisted() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();

    let status = service.start_timer("alice", &session.id).await.unwrap();
    assert_eq!(status.status, TimerState::Running);

    let status = service.pause_timer("alice", &session.id).await.unwrap();
    assert_eq!(status.status, TimerState::Paused);
    let stored = harness.storage.get_session(&session.id).await.unwrap().unwrap();
    assert!(stored.is_paused);

    assert!(matches!(
        service.pause_timer("alice", &session.id).await,
        Err(LumoError::InvalidState(_))
    ));
    assert!(matches!(
        service.tick_timer("alice", &session.id, 10).await,
        Err(LumoError::InvalidState(_))
    ));

    service.resume_timer("alice", &session.id).await.unwrap();
    let tick = service.tick_timer("alice", &session.id, 300).await.unwrap();
    assert!(tick.finished.is_none());
    assert_eq!(tick.status.remaining_seconds, 600);

    let status = service.timer_status("alice", &session.id).await.unwrap();
    assert_eq!(status.progress_ratio, 0.333);
    assert!(matches!(
        service.timer_status("bob", &session.id).await,
        Err(LumoError::NotFound { .. })
    ));
}

#[tokio::test]
async fn exhausting_the_budget_finishes_and_evaluates() {
    let harness = TestHarness::builder()
        .with_mock_responses([rubric_json()])
        .build()
        .await
        .unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();
    harness.seed_conversation(&session.id, 7, 6).await.unwrap();

    let tick = service.tick_timer("alice", &session.id, 900).await.unwrap();
    assert_eq!(tick.status.status, TimerState::Ended);
    let finished = tick.finished.unwrap();
    assert!(finished.session.is_completed);
    assert!(!finished.session.is_active);
    assert!(matches!(
        finished.evaluation,
        Some(AutoEvaluation::Generated { .. })
    ));
    let report = finished.report.unwrap();
    assert_eq!(report.time_management_score, Some(10.0));
    assert!(report.time_evaluation_enabled);
}

#[tokio::test]
async fn finishing_updates_an_existing_report() {
    let harness = TestHarness::builder()
        .with_mock_responses([rubric_json()])
        .build()
        .await
        .unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();
    harness.seed_conversation(&session.id, 7, 6).await.unwrap();
    harness.set_session_time(&session.id, 900, 450).await.unwrap();
    service
        .evaluation()
        .evaluate_for_user("alice", &session.id)
        .await
        .unwrap();

    harness.set_session_time(&session.id, 900, 810).await.unwrap();
    let outcome = service.finish_timer("alice", &session.id, false).await.unwrap();
    assert_eq!(outcome.evaluation, None);
    assert_eq!(outcome.report.unwrap().time_management_score, Some(10.0));

    let outcome = service.finish_timer("alice", &session.id, true).await.unwrap();
    let report = outcome.report.unwrap();
    assert_eq!(report.time_management_score, None);
    assert!(!report.time_evaluation_enabled);
    assert_eq!(harness.provider.call_count().await, 1);
}

#[tokio::test]
async fn interrupted_finish_of_an_ineligible_session_has_no_report() {
    let harness = TestHarness::builder().build().await.unwrap();
    let service = service_for(&harness);
    let session = harness.create_session("alice").await.unwrap();

    let outcome = service.finish_timer("alice", &session.id, true).await.unwrap();
    assert!(outcome.session.is_completed);
    assert!(outcome.report.is_none());
    assert!(outcome.evaluation.is_none());
}
