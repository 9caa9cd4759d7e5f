// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation eligibility gate.
//!
//! Pure and read-only: the same inputs always produce the same report.

use lumo_config::model::EvaluationConfig;
use lumo_core::{EligibilityReport, Message, MessageAuthor};

/// Counts interviewer messages, excluding the closing message that carries
/// the termination sentinel (matched case-insensitively).
pub const ALREADY_EVALUATED_REASON: &str = "An evaluation already exists for this session";

pub fn count_questions(messages: &[Message], sentinel: &str) -> usize {
    let sentinel = sentinel.trim().to_lowercase();
    messages
        .iter()
        .filter(|m| m.author == MessageAuthor::Interviewer)
        .filter(|m| sentinel.is_empty() || !m.content.to_lowercase().contains(&sentinel))
        .count()
}

/// Counts candidate-authored messages.
pub fn count_responses(messages: &[Message]) -> usize {
    messages.iter().filter(|m| m.is_candidate()).count()
}

/// Decides whether a session may be evaluated.
///
/// `has_report` short-circuits: a session with a report is never eligible
/// again, whatever its message counts.
pub fn check_eligibility(
    has_report: bool,
    messages: &[Message],
    config: &EvaluationConfig,
) -> EligibilityReport {
    let questions_count = count_questions(messages, &config.termination_sentinel);
    let responses_count = count_responses(messages);
    let min_questions = config.min_questions;
    let min_responses = config.min_responses;

    let (eligible, reason) = if has_report {
        (false, ALREADY_EVALUATED_REASON.to_string())
    } else if questions_count < min_questions {
        (
            false,
            format!(
                "At least {min_questions} interviewer questions are required ({questions_count} asked so far)"
            ),
        )
    } else if responses_count < min_responses {
        (
            false,
            format!(
                "At least {min_responses} candidate responses are required ({responses_count} given so far)"
            ),
        )
    } else {
        (true, "Ready for evaluation".to_string())
    };

    EligibilityReport {
        eligible,
        existing: has_report,
        questions_count,
        responses_count,
        min_questions,
        min_responses,
        reason,
    }
}

/// Rejects sessions too short to evaluate even when the counts pass.
pub fn check_substance(
    report: EligibilityReport,
    message_count: usize,
    min_messages: usize,
) -> EligibilityReport {
    if report.eligible && message_count < min_messages {
        EligibilityReport {
            eligible: false,
            reason: format!(
                "At least {min_messages} messages are required for an evaluation ({message_count} recorded)"
            ),
            ..report
        }
    } else {
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(author: MessageAuthor, content: &str) -> Message {
        Message {
            id: format!("m-{content}"),
            session_id: "s1".into(),
            author,
            content: content.into(),
            created_at: "2026-03-02T09:00:00.000Z".into(),
            audio_path: None,
            tts_voice: None,
        }
    }

    fn conversation(questions: usize, answers: usize) -> Vec<Message> {
        let mut out = Vec::new();
        for i in 0..questions.max(answers) {
            if i < questions {
                out.push(msg(MessageAuthor::Interviewer, &format!("Question {i}?")));
            }
            if i < answers {
                out.push(msg(MessageAuthor::Candidate, &format!("Answer {i}")));
            }
        }
        out
    }

    #[test]
    fn eligible_at_exact_thresholds() {
        let config = EvaluationConfig::default();
        let report = check_eligibility(false, &conversation(7, 6), &config);
        assert!(report.eligible);
        assert!(!report.existing);
        assert_eq!(report.questions_count, 7);
        assert_eq!(report.responses_count, 6);
        assert_eq!(report.reason, "Ready for evaluation");
    }

    #[test]
    fn too_few_questions_reports_counts() {
        let config = EvaluationConfig::default();
        let report = check_eligibility(false, &conversation(6, 6), &config);
        assert!(!report.eligible);
        assert!(report.reason.contains('7'), "{}", report.reason);
        assert!(report.reason.contains('6'), "{}", report.reason);
    }

    #[test]
    fn too_few_responses_is_ineligible() {
        let config = EvaluationConfig::default();
        let report = check_eligibility(false, &conversation(7, 5), &config);
        assert!(!report.eligible);
        assert!(report.reason.contains("candidate responses"));
    }

    #[test]
    fn existing_report_wins_over_counts() {
        let config = EvaluationConfig::default();
        let report = check_eligibility(true, &conversation(20, 20), &config);
        assert!(!report.eligible);
        assert!(report.existing);
    }

    #[test]
    fn sentinel_message_is_not_a_question() {
        let config = EvaluationConfig::default();
        let mut messages = conversation(6, 6);
        messages.push(msg(
            MessageAuthor::Interviewer,
            "Thank you! YOU HAVE COMPLETED THE INTERVIEW QUESTIONS.",
        ));
        let report = check_eligibility(false, &messages, &config);
        assert_eq!(report.questions_count, 6);
        assert!(!report.eligible);
    }

    #[test]
    fn thresholds_come_from_config() {
        let config = EvaluationConfig {
            min_questions: 10,
            min_responses: 9,
            ..EvaluationConfig::default()
        };
        assert!(!check_eligibility(false, &conversation(7, 6), &config).eligible);
        assert!(check_eligibility(false, &conversation(10, 9), &config).eligible);
    }

    #[test]
    fn check_is_idempotent() {
        let config = EvaluationConfig::default();
        let messages = conversation(7, 6);
        assert_eq!(
            check_eligibility(false, &messages, &config),
            check_eligibility(false, &messages, &config)
        );
    }

    #[test]
    fn short_sessions_fail_substance_check() {
        let config = EvaluationConfig {
            min_questions: 2,
            min_responses: 1,
            ..EvaluationConfig::default()
        };
        let messages = conversation(2, 1);
        let report = check_eligibility(false, &messages, &config);
        assert!(report.eligible);

        let report = check_substance(report, messages.len(), config.min_messages);
        assert!(!report.eligible);
        assert!(report.reason.contains("5 messages"));
    }
}
