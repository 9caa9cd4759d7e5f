// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage entity types.
//!
//! The canonical definitions live in `lumo-core::types` so they can cross the
//! adapter trait boundary; they are re-exported here for convenience.

pub use lumo_core::types::{
    CompetencyDefinition, CompetencyScore, DeleteSummary, FeedbackReport, Message, Session,
    SessionSummary, UserAnalytics,
};
