// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call-coordination engine for Turbodial.
//!
//! Decides who talks to whom and when: the dispatch launcher fans out
//! batches of outbound calls ([`dispatch`]), the answer handler claims a
//! rep the moment a human picks up ([`answer`]), the lifecycle processor
//! folds at-least-once provider events into the call state machine
//! ([`lifecycle`]), and the voicemail finisher closes out recorded
//! messages ([`voicemail`]).
//!
//! All coordination state lives in SQLite; the handlers share nothing in
//! process, which is what lets concurrent webhook deliveries race safely.

pub mod answer;
pub mod conference;
pub mod dispatch;
pub mod engine;
pub mod lifecycle;
pub mod voicemail;

pub use answer::{AnswerAction, handle_answer};
pub use dispatch::{run_dispatch_cycle, run_dispatch_loop};
pub use engine::DialerEngine;
pub use lifecycle::{process_conference_event, process_status_event};
pub use voicemail::finish_voicemail;
