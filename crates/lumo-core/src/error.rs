// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lumo interview trainer.

use thiserror::Error;

use crate::types::EligibilityReport;

/// The primary error type used across all Lumo adapters and services.
#[derive(Debug, Error)]
pub enum LumoError {
    /// Configuration errors (invalid TOML, missing API key, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors (network failure, quota, unusable API response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A requested entity does not exist or is not owned by the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The session is not ready to be evaluated.
    #[error("session not eligible for evaluation: {}", .0.reason)]
    Ineligible(Box<EligibilityReport>),

    /// A feedback report already exists for the session.
    #[error("session {session_id} has already been evaluated")]
    AlreadyEvaluated { session_id: String },

    /// An operation is not allowed in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The caller supplied an invalid request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LumoError {
    /// Shorthand for a [`LumoError::NotFound`] on a session.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "session",
            id: id.into(),
        }
    }

    /// Returns true for errors caused by the caller rather than by Lumo or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Ineligible(_)
                | Self::AlreadyEvaluated { .. }
                | Self::InvalidState(_)
                | Self::BadRequest(_)
        )
    }
}
