// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lumo interview trainer.
//!
//! Provides the domain types, the [`LumoError`] enum and the adapter traits
//! that storage and LLM backends implement.

pub mod error;
pub mod traits;
pub mod types;

pub use error::LumoError;
pub use types::{
    AdapterType, ChatRole, Competency, CompetencyDefinition, CompetencyScore, DeleteSummary,
    EligibilityReport, FeedbackReport, GenerationConfig, HealthStatus, InterviewCategory,
    Message, MessageAuthor, PerformanceLevel, ProviderMessage, ProviderRequest,
    ProviderResponse, Session, SessionSummary, TokenUsage, UserAnalytics,
};

pub use traits::{PluginAdapter, ProviderAdapter, StorageAdapter};
