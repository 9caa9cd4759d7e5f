// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interviewer system prompts.

use lumo_config::model::EvaluationConfig;
use lumo_core::InterviewCategory;

/// Synthetic opener used when the history would otherwise begin with an
/// interviewer turn; the model API requires user-first conversations.
pub const OPENING_USER_TURN: &str = "Start the interview.";

const PERSONA: &str = "You are Lumo, a professional and friendly job interview coach \
running a realistic practice interview.";

fn focus(category: InterviewCategory) -> &'static str {
    match category {
        InterviewCategory::Operations => {
            "process improvement, production planning, quality control, logistics and safety"
        }
        InterviewCategory::SalesMarketing => {
            "prospecting, negotiation, customer relationships, campaigns and hitting targets"
        }
        InterviewCategory::Finance => {
            "budgeting, financial analysis, reporting, controls and working with stakeholders on numbers"
        }
        InterviewCategory::Hr => {
            "recruiting, onboarding, employee relations, conflict mediation and people development"
        }
        InterviewCategory::It => {
            "troubleshooting, system design, incident handling, collaboration with engineers and learning new technology"
        }
        InterviewCategory::Rd => {
            "experimentation, research methods, prototyping, handling failure and turning ideas into products"
        }
        InterviewCategory::CustomerSupport => {
            "handling difficult customers, empathy under pressure, escalation and service quality"
        }
        InterviewCategory::Management => {
            "leadership, strategy, decision making, managing teams through change and stakeholder alignment"
        }
        InterviewCategory::Health => {
            "patient care, teamwork in clinical settings, ethics, stress management and communication with families"
        }
    }
}

/// System prompt for an interview in `category`.
///
/// Tells the model how many questions to ask and the exact closing phrase,
/// which the eligibility gate excludes from the question count.
pub fn system_prompt(category: InterviewCategory, config: &EvaluationConfig) -> String {
    format!(
        "{PERSONA}\n\n\
         The interview is for a role in {label}. Focus your questions on {focus}, \
         and probe the candidate's soft skills: communication, critical thinking, \
         adaptability, teamwork and emotional intelligence.\n\n\
         Rules:\n\
         - Ask exactly one question per turn and wait for the answer.\n\
         - Briefly acknowledge each answer before the next question.\n\
         - Ask {questions} questions in total.\n\
         - After the candidate answers the last question, reply with: \"{sentinel}\" \
         followed by a short thank-you, and ask nothing further.\n\
         - Keep every turn concise and encouraging.",
        label = category.label(),
        focus = focus(category),
        questions = config.min_questions,
        sentinel = config.termination_sentinel,
    )
}
