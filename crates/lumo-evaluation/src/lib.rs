// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation of interview sessions.
//!
//! A session passes the eligibility gate, the model scores the transcript
//! against a five-competency rubric, the result is repaired, persisted with
//! derived metrics and folded into the owner's analytics.

pub mod analytics;
pub mod eligibility;
pub mod rubric;
pub mod scoring;
pub mod service;
pub mod time_management;

pub use analytics::{CompetencyAnalysis, CompetencyStat, Trend, UserProgress};
pub use eligibility::check_eligibility;
pub use rubric::{RubricPayload, parse_rubric};
pub use service::{
    CompetencyView, EvaluationOutcome, EvaluationService, SessionEvaluation, evaluation_generation,
};
pub use time_management::{TimeAssessment, assess_time};
