// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview sessions: lifecycle, the interviewer chat loop and the timer.

pub mod prompts;
pub mod service;
pub mod timer;

pub use service::{AutoEvaluation, ChatTurn, FinishOutcome, NewSession, SessionService, TickOutcome};
pub use timer::{TimerState, TimerStatus};
