// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `huewatch` - A Rust library to monitor Philips Hue lights.
//!
//! The bridge offers no push notifications, so lights are observed by
//! polling. This library polls the bridge, detects which fields of which
//! lights changed between two polls, reports those changes, and stops on its
//! own once the lights have been quiet for a while.
//!
//! # Components
//!
//! - [`protocol`]: bridge access ([`LightFetcher`], [`HueBridgeClient`])
//! - [`state`]: light states, snapshots and change detection
//! - [`report`]: rendering of changes to a [`ReportSink`]
//! - [`monitor`]: the poll scheduler and session handle
//!
//! # Quick Start
//!
//! ```no_run
//! use huewatch::{BridgeConfig, Monitor, MonitorConfig};
//!
//! #[tokio::main]
//! async fn main() -> huewatch::Result<()> {
//!     let client = BridgeConfig::new("192.168.1.2").into_client()?;
//!     client.ping().await?;
//!
//!     // Press the bridge's link button first
//!     let username = client.connect_user().await?;
//!     let client = client.with_username(username);
//!
//!     // Dump every light, then report changes until 60s pass without any
//!     let session = Monitor::new(client, MonitorConfig::default()).start().await?;
//!     let outcome = session.wait().await?;
//!     println!("{} polls, {}", outcome.cycles, outcome.reason);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Change detection
//!
//! ```
//! use huewatch::state::{LightState, Snapshot};
//! use huewatch::report::{ChangeReporter, MemorySink};
//! use huewatch::types::Brightness;
//!
//! let before: Snapshot = [LightState::new("1", "Lamp", false, Brightness::MIN)].into_iter().collect();
//! let after: Snapshot = [LightState::new("1", "Lamp", true, Brightness::MAX)].into_iter().collect();
//!
//! let report = ChangeReporter::new(MemorySink::new())
//!     .report_changes(&before, &after)
//!     .unwrap();
//!
//! assert!(report.changed);
//! assert!(report.text.contains("\"on\": true"));
//! assert!(report.text.contains("\"brightness\": 100"));
//! ```

pub mod error;
pub mod monitor;
pub mod protocol;
pub mod report;
pub mod state;
pub mod types;

pub use error::{CompareError, Error, ParseError, ProtocolError, ReportError, Result};
pub use monitor::{
    FetchFailurePolicy, Monitor, MonitorConfig, MonitorEvent, MonitorOutcome, MonitorSession,
    StopReason,
};
pub use protocol::LightFetcher;
#[cfg(feature = "http")]
pub use protocol::{BridgeConfig, HueBridgeClient};
pub use report::{ChangeReport, ChangeReporter, ReportSink};
pub use state::{Delta, FieldChange, LightState, Snapshot};
pub use types::{Brightness, LightId};
