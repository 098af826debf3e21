// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshot of all observed lights at one point in time.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::types::LightId;

use super::LightState;

/// Mapping from light id to light state, in insertion order.
///
/// Iteration order is the order lights were inserted, which the monitor
/// keeps stable from one poll to the next. Two snapshots are *parallel*
/// when they hold the same ids in the same order.
///
/// Serializes as a JSON array of states (not keyed by id).
///
/// # Examples
///
/// ```
/// use huewatch::state::{LightState, Snapshot};
/// use huewatch::types::Brightness;
///
/// let snapshot: Snapshot = [
///     LightState::new("1", "Lamp", true, Brightness::MAX),
///     LightState::new("2", "Desk", false, Brightness::MIN),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(snapshot.len(), 2);
/// assert!(snapshot.get(&"2".into()).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    entries: IndexMap<LightId, LightState>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty snapshot with room for `capacity` lights.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a state under `id`.
    ///
    /// An existing entry keeps its position and has its state replaced.
    /// Returns the replaced state, if any.
    pub fn insert(&mut self, id: LightId, state: LightState) -> Option<LightState> {
        self.entries.insert(id, state)
    }

    /// Removes the entry for `id`, returning its state.
    ///
    /// The remaining entries keep their relative order.
    pub fn remove(&mut self, id: &LightId) -> Option<LightState> {
        self.entries.shift_remove(id)
    }

    /// Returns the state stored under `id`.
    #[must_use]
    pub fn get(&self, id: &LightId) -> Option<&LightState> {
        self.entries.get(id)
    }

    /// Returns `true` if the snapshot holds `id`.
    #[must_use]
    pub fn contains(&self, id: &LightId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the ids in iteration order.
    pub fn ids(&self) -> impl Iterator<Item = &LightId> {
        self.entries.keys()
    }

    /// Returns the states in iteration order.
    pub fn states(&self) -> impl Iterator<Item = &LightState> {
        self.entries.values()
    }

    /// Returns `(id, state)` pairs in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&LightId, &LightState)> {
        self.entries.iter()
    }

    /// Returns the number of lights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot holds no lights.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if both snapshots hold the same ids in the same order.
    #[must_use]
    pub fn is_parallel(&self, other: &Self) -> bool {
        self.ids().eq(other.ids())
    }
}

/// Snapshots are equal when they hold the same entries in the same order.
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Snapshot {}

impl FromIterator<LightState> for Snapshot {
    fn from_iter<I: IntoIterator<Item = LightState>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for state in iter {
            snapshot.insert(state.id.clone(), state);
        }
        snapshot
    }
}

impl FromIterator<(LightId, LightState)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (LightId, LightState)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (id, state) in iter {
            snapshot.insert(id, state);
        }
        snapshot
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for state in self.states() {
            seq.serialize_element(state)?;
        }
        seq.end()
    }
}
