// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Handle to a running monitoring session.

use std::fmt;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::state::Snapshot;
use crate::types::LightId;

/// Unique identifier of a monitoring session.
///
/// Attached to every log line and event of the session.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new unique session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show only first 8 characters for readability
        let short = &self.0.to_string()[..8];
        write!(f, "SessionId({short}...)")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a monitoring session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// No change was detected for the whole quiet timeout.
    Quiet,
    /// [`MonitorSession::stop`] was called.
    Cancelled,
    /// A poll failed in a way that cannot be recovered.
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => f.write_str("quiet timeout elapsed"),
            Self::Cancelled => f.write_str("stop requested"),
            Self::Failed(message) => write!(f, "poll failed: {message}"),
        }
    }
}

/// Events published by a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A poll finished.
    CycleCompleted {
        /// The session that polled.
        session_id: SessionId,
        /// 1-based poll number.
        cycle: u64,
        /// Whether any light changed in this poll.
        changed: bool,
    },

    /// A light stopped being tracked after a failed fetch.
    LightDropped {
        /// The session that dropped the light.
        session_id: SessionId,
        /// The dropped light.
        light_id: LightId,
    },

    /// The session ended.
    Stopped {
        /// The session that ended.
        session_id: SessionId,
        /// Why it ended.
        reason: StopReason,
    },
}

impl MonitorEvent {
    /// Returns the session that published this event.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::CycleCompleted { session_id, .. }
            | Self::LightDropped { session_id, .. }
            | Self::Stopped { session_id, .. } => *session_id,
        }
    }
}

/// Final result of a monitoring session.
#[derive(Debug, Clone)]
pub struct MonitorOutcome {
    /// The session that ended.
    pub session_id: SessionId,
    /// Number of polls that were started.
    pub cycles: u64,
    /// Why the session ended.
    pub reason: StopReason,
    /// The last snapshot observed.
    pub snapshot: Snapshot,
}

/// Handle to a monitoring session running in the background.
///
/// Dropping the handle does not stop the session; it keeps polling until
/// its quiet timeout elapses.
///
/// # Examples
///
/// ```no_run
/// use huewatch::monitor::{Monitor, MonitorConfig, StopReason};
/// use huewatch::protocol::BridgeConfig;
///
/// # async fn example() -> huewatch::Result<()> {
/// let client = BridgeConfig::new("192.168.1.2")
///     .with_username("d9f8c1")
///     .into_client()?;
/// let monitor = Monitor::new(client, MonitorConfig::default());
///
/// let session = monitor.start().await?;
/// let outcome = session.wait().await?;
/// assert_eq!(outcome.reason, StopReason::Quiet);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MonitorSession {
    id: SessionId,
    stop_tx: watch::Sender<bool>,
    events: broadcast::Sender<MonitorEvent>,
    handle: JoinHandle<MonitorOutcome>,
}

impl MonitorSession {
    pub(crate) fn new(
        id: SessionId,
        stop_tx: watch::Sender<bool>,
        events: broadcast::Sender<MonitorEvent>,
        handle: JoinHandle<MonitorOutcome>,
    ) -> Self {
        Self {
            id,
            stop_tx,
            events,
            handle,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Requests the session to stop.
    ///
    /// A poll in progress runs to completion; the session then ends with
    /// [`StopReason::Cancelled`] instead of waiting for the next poll.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Returns `true` once the session has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Subscribes to session events.
    ///
    /// Only events published after the call are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Waits for the session to end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionAborted`] if the session task panicked or was
    /// cancelled by the runtime.
    pub async fn wait(self) -> Result<MonitorOutcome> {
        self.handle
            .await
            .map_err(|e| Error::SessionAborted(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn session_id_debug_is_short() {
        let debug = format!("{:?}", SessionId::new());
        assert!(debug.starts_with("SessionId("));
        assert!(debug.ends_with("...)"));
    }

    #[test]
    fn event_session_id() {
        let session_id = SessionId::new();
        let event = MonitorEvent::Stopped {
            session_id,
            reason: StopReason::Quiet,
        };
        assert_eq!(event.session_id(), session_id);
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::Quiet.to_string(), "quiet timeout elapsed");
        assert_eq!(
            StopReason::Failed("boom".to_string()).to_string(),
            "poll failed: boom"
        );
    }
}
