// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field-level change detection between two light states.
//!
//! A [`Delta`] records one changed field of one light. A light with three
//! changed fields yields three deltas, in field declaration order.
//!
//! # Examples
//!
//! ```
//! use huewatch::state::{compare, Delta, FieldChange, LightState};
//! use huewatch::types::Brightness;
//!
//! let prev = LightState::new("1", "Lamp", false, Brightness::MIN);
//! let curr = LightState::new("1", "Lamp", true, Brightness::MAX);
//!
//! let deltas = compare(Some(&prev), Some(&curr)).unwrap();
//! assert_eq!(deltas, vec![
//!     Delta::new("1", FieldChange::On(true)),
//!     Delta::new("1", FieldChange::Brightness(Brightness::MAX)),
//! ]);
//! ```

use serde::Serialize;

use crate::error::{CompareError, Side};
use crate::types::{Brightness, LightId};

use super::LightState;

/// The new value of a single changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldChange {
    /// The light was renamed.
    Name(String),
    /// The light was switched on or off.
    On(bool),
    /// The brightness changed.
    Brightness(Brightness),
}

impl FieldChange {
    /// Returns the name of the changed field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::On(_) => "on",
            Self::Brightness(_) => "brightness",
        }
    }
}

/// One changed field of one light.
///
/// Serializes as a flat object holding the light id and the changed field,
/// e.g. `{"id": "1", "on": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta {
    /// The light that changed.
    pub id: LightId,
    /// The changed field and its new value.
    #[serde(flatten)]
    pub change: FieldChange,
}

impl Delta {
    /// Creates a delta.
    #[must_use]
    pub fn new(id: impl Into<LightId>, change: FieldChange) -> Self {
        Self {
            id: id.into(),
            change,
        }
    }

    /// Renders the delta as 2-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Compares two states of the same light.
///
/// # Errors
///
/// - [`CompareError::MissingArgument`] if either state is absent.
/// - [`CompareError::IdentityMismatch`] if the states belong to different
///   lights.
pub fn compare(
    prev: Option<&LightState>,
    curr: Option<&LightState>,
) -> Result<Vec<Delta>, CompareError> {
    let prev = prev.ok_or(CompareError::MissingArgument(Side::Previous))?;
    let curr = curr.ok_or(CompareError::MissingArgument(Side::Current))?;

    if prev.id != curr.id {
        return Err(CompareError::IdentityMismatch {
            previous: prev.id.clone(),
            current: curr.id.clone(),
        });
    }

    Ok(prev.diff(curr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp(id: &str, on: bool, brightness: u8) -> LightState {
        LightState::new(id, "Hue Lamp 1", on, Brightness::Percent(brightness))
    }

    #[test]
    fn identical_states_yield_no_deltas() {
        let prev = lamp("999", false, 0);
        let curr = prev.clone();
        assert!(compare(Some(&prev), Some(&curr)).unwrap().is_empty());
        // repeated calls give the same answer
        assert!(compare(Some(&prev), Some(&curr)).unwrap().is_empty());
    }

    #[test]
    fn one_delta_per_changed_field() {
        let prev = lamp("1", false, 0);
        let curr = lamp("1", true, 100);

        let deltas = compare(Some(&prev), Some(&curr)).unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0], Delta::new("1", FieldChange::On(true)));
        assert_eq!(
            deltas[1],
            Delta::new("1", FieldChange::Brightness(Brightness::MAX))
        );
    }

    #[test]
    fn different_ids_fail() {
        let err = compare(Some(&lamp("111", false, 0)), Some(&lamp("999", false, 0))).unwrap_err();
        assert_eq!(
            err,
            CompareError::IdentityMismatch {
                previous: LightId::from("111"),
                current: LightId::from("999"),
            }
        );
    }

    #[test]
    fn missing_inputs_fail() {
        let state = lamp("111", false, 0);
        assert_eq!(
            compare(Some(&state), None).unwrap_err(),
            CompareError::MissingArgument(Side::Current)
        );
        assert_eq!(
            compare(None, Some(&state)).unwrap_err(),
            CompareError::MissingArgument(Side::Previous)
        );
        assert_eq!(
            compare(None, None).unwrap_err(),
            CompareError::MissingArgument(Side::Previous)
        );
    }

    #[test]
    fn delta_renders_flat_pretty_json() {
        let on = Delta::new("1", FieldChange::On(true));
        assert_eq!(on.to_pretty_json().unwrap(), "{\n  \"id\": \"1\",\n  \"on\": true\n}");

        let bri = Delta::new("1", FieldChange::Brightness(Brightness::MAX));
        assert_eq!(
            bri.to_pretty_json().unwrap(),
            "{\n  \"id\": \"1\",\n  \"brightness\": 100\n}"
        );

        let name = Delta::new("2", FieldChange::Name("Desk".to_string()));
        assert_eq!(
            name.to_pretty_json().unwrap(),
            "{\n  \"id\": \"2\",\n  \"name\": \"Desk\"\n}"
        );
    }

    #[test]
    fn field_names() {
        assert_eq!(FieldChange::On(false).field(), "on");
        assert_eq!(FieldChange::Brightness(Brightness::MIN).field(), "brightness");
        assert_eq!(FieldChange::Name(String::new()).field(), "name");
    }
}
