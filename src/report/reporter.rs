// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rendering of light changes and snapshot dumps.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::ReportError;
use crate::state::{Snapshot, compare};

use super::sink::{ReportSink, TracingSink};

/// Banner emitted ahead of every non-empty change report.
pub const CHANGES_BANNER: &str = "----- light changes -----";

/// Result of reporting on two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeReport {
    /// Every delta rendered as pretty JSON, each block followed by `\n`.
    pub text: String,
    /// `true` if at least one field of one light changed.
    pub changed: bool,
}

/// Renders light changes to a [`ReportSink`].
///
/// # Examples
///
/// ```
/// use huewatch::report::{ChangeReporter, MemorySink};
/// use huewatch::state::{LightState, Snapshot};
/// use huewatch::types::Brightness;
///
/// let sink = MemorySink::new();
/// let reporter = ChangeReporter::new(sink.clone());
///
/// let prev: Snapshot = [LightState::new("1", "Lamp", false, Brightness::MIN)].into_iter().collect();
/// let curr: Snapshot = [LightState::new("1", "Lamp", true, Brightness::MIN)].into_iter().collect();
///
/// let report = reporter.report_changes(&prev, &curr).unwrap();
/// assert!(report.changed);
/// assert_eq!(sink.entries().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ChangeReporter {
    sink: Arc<dyn ReportSink>,
}

impl ChangeReporter {
    /// Creates a reporter writing to `sink`.
    #[must_use]
    pub fn new(sink: impl ReportSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Creates a reporter writing to a shared sink.
    #[must_use]
    pub fn from_shared(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Reports every field that changed between two parallel snapshots.
    ///
    /// Lights are visited in the order of `prev`. When anything changed, the
    /// banner and the rendered deltas are emitted to the sink; otherwise
    /// nothing is emitted.
    ///
    /// # Errors
    ///
    /// - [`ReportError::NonParallelSnapshots`] if the snapshots do not hold
    ///   the same ids in the same order. Nothing is emitted.
    /// - [`ReportError::Compare`] if a light is stored under an id that does
    ///   not match its state.
    pub fn report_changes(
        &self,
        prev: &Snapshot,
        curr: &Snapshot,
    ) -> Result<ChangeReport, ReportError> {
        if !prev.is_parallel(curr) {
            return Err(ReportError::NonParallelSnapshots {
                previous: prev.ids().cloned().collect(),
                current: curr.ids().cloned().collect(),
            });
        }

        let mut text = String::new();
        for (id, before) in prev.iter() {
            for delta in compare(Some(before), curr.get(id))? {
                let _ = writeln!(text, "{}", delta.to_pretty_json()?);
            }
        }

        let changed = !text.is_empty();
        if changed {
            self.sink.emit(CHANGES_BANNER);
            self.sink.emit(&text);
        }

        Ok(ChangeReport { text, changed })
    }

    /// Dumps every light of `snapshot` as a pretty JSON array.
    ///
    /// The dump is emitted only if the snapshot holds at least one light;
    /// it is returned either way.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Render`] if serialization fails.
    pub fn report_all(&self, snapshot: &Snapshot) -> Result<String, ReportError> {
        let output = serde_json::to_string_pretty(snapshot)?;
        if !snapshot.is_empty() {
            self.sink.emit(&output);
        }
        Ok(output)
    }
}

impl Default for ChangeReporter {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}
