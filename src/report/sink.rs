// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Destinations for rendered reports.

use std::sync::Arc;

use parking_lot::Mutex;

/// A destination for report output.
///
/// Each call to [`emit`](Self::emit) carries one block of output: the
/// banner line, a batch of rendered deltas, or a full snapshot dump.
pub trait ReportSink: Send + Sync + std::fmt::Debug {
    /// Writes one block of report output.
    fn emit(&self, output: &str);
}

/// Sink that forwards report output to `tracing` at info level.
///
/// Events use the target `huewatch::report`, so they can be filtered
/// separately from the library's diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, output: &str) {
        tracing::info!(target: "huewatch::report", "{output}");
    }
}

/// Sink that prints report output to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    #[allow(clippy::print_stdout)]
    fn emit(&self, output: &str) {
        println!("{output}");
    }
}

/// Sink that keeps report output in memory.
///
/// Clones share the same buffer, so a clone handed to a reporter can be
/// inspected from the outside.
///
/// # Examples
///
/// ```
/// use huewatch::report::{MemorySink, ReportSink};
///
/// let sink = MemorySink::new();
/// sink.emit("hello");
/// assert_eq!(sink.entries(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything emitted so far.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns `true` if nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes and returns everything emitted so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, output: &str) {
        self.entries.lock().push(output.to_string());
    }
}
