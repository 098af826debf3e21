// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adaptive polling of light state.
//!
//! A [`Monitor`] runs monitoring sessions. Each session repeatedly polls
//! every tracked light, reports what changed, and ends on its own once no
//! change has been seen for the configured quiet timeout. The returned
//! [`MonitorSession`] lets the caller await the end of the session, stop it
//! early, or follow its progress through [`MonitorEvent`]s.
//!
//! # Session lifecycle
//!
//! ```text
//! start ──► poll ──► report ──► changed? ──► deadline = now + quiet
//!            ▲                      │
//!            │                      ▼
//!         sleep ◄── now < deadline? ──► stopped (Quiet)
//!            │
//!            └── stop() ──► stopped (Cancelled)
//! ```
//!
//! A poll that fails structurally (for example a light answering with
//! another light's id) ends the session with [`StopReason::Failed`]. A light
//! that merely fails to fetch is handled by the configured
//! [`FetchFailurePolicy`] and does not end the session.

mod config;
mod scheduler;
mod session;

pub use config::{FetchFailurePolicy, MonitorConfig};
pub use scheduler::Monitor;
pub use session::{MonitorEvent, MonitorOutcome, MonitorSession, SessionId, StopReason};
