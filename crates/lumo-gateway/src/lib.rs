// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Lumo.
//!
//! Exposes session management, the interviewer chat, the session timer,
//! evaluations and user analytics as a JSON API.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, CurrentUser};
pub use error::{ApiError, ErrorResponse};
pub use server::{GatewayState, build_router, serve};
