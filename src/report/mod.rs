// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Human readable reports of light changes.
//!
//! The [`ChangeReporter`] turns a pair of snapshots into a text report and
//! writes it to a [`ReportSink`]. Three sinks are provided:
//!
//! - [`TracingSink`] - info-level `tracing` events (the default)
//! - [`StdoutSink`] - plain standard output
//! - [`MemorySink`] - an in-memory buffer, handy in tests

mod reporter;
mod sink;

pub use reporter::{CHANGES_BANNER, ChangeReport, ChangeReporter};
pub use sink::{MemorySink, ReportSink, StdoutSink, TracingSink};
