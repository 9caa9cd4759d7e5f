// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lumo integration tests.
//!
//! - [`MockProvider`]: scripted LLM provider that records requests
//! - [`TestHarness`]: temp SQLite storage plus conversation seeding helpers

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
