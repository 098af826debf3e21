// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observed state of a single light.

use serde::Serialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{Brightness, LightId};

use super::delta::{Delta, FieldChange};

/// The observed state of one light.
///
/// Fields are declared (and serialized) in the order `name`, `id`, `on`,
/// `brightness`. Change detection walks them in that order.
///
/// # Examples
///
/// ```
/// use huewatch::state::LightState;
/// use huewatch::types::Brightness;
///
/// let state = LightState::new("1", "Hue Lamp 1", true, Brightness::MAX);
/// assert!(state.on);
/// assert_eq!(state.id.as_str(), "1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightState {
    /// Human readable name configured on the bridge.
    pub name: String,
    /// Bridge identifier of the light.
    pub id: LightId,
    /// Whether the light is switched on.
    pub on: bool,
    /// Normalized brightness.
    pub brightness: Brightness,
}

impl LightState {
    /// Creates a light state.
    #[must_use]
    pub fn new(
        id: impl Into<LightId>,
        name: impl Into<String>,
        on: bool,
        brightness: Brightness,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            on,
            brightness,
        }
    }

    /// Maps a bridge light-details payload to a light state.
    ///
    /// Reads `name`, `state.on` and `state.bri`. Brightness is normalized
    /// with [`Brightness::from_api`]; every other listed field is required.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingField`] if `name`, `state` or `state.on`
    /// is missing or has the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use huewatch::state::LightState;
    /// use huewatch::types::Brightness;
    /// use serde_json::json;
    ///
    /// let details = json!({ "name": "Hue Lamp 1", "state": { "on": false, "bri": 0 } });
    /// let state = LightState::from_api("999", &details).unwrap();
    /// assert_eq!(state, LightState::new("999", "Hue Lamp 1", false, Brightness::MIN));
    /// ```
    pub fn from_api(id: impl Into<LightId>, details: &Value) -> Result<Self, ParseError> {
        let name = details
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ParseError::MissingField("name".to_string()))?;
        let state = details
            .get("state")
            .filter(|s| s.is_object())
            .ok_or_else(|| ParseError::MissingField("state".to_string()))?;
        let on = state
            .get("on")
            .and_then(Value::as_bool)
            .ok_or_else(|| ParseError::MissingField("state.on".to_string()))?;

        Ok(Self {
            name: name.to_string(),
            id: id.into(),
            on,
            brightness: Brightness::from_api(state.get("bri")),
        })
    }

    /// Lists the fields of `other` that differ from `self`.
    ///
    /// The identifier is not compared; callers are expected to pass two
    /// states of the same light. See [`compare`](super::compare) for the
    /// checked version.
    #[must_use]
    pub fn diff(&self, other: &Self) -> Vec<Delta> {
        let mut changes = Vec::new();
        if self.name != other.name {
            changes.push(FieldChange::Name(other.name.clone()));
        }
        if self.on != other.on {
            changes.push(FieldChange::On(other.on));
        }
        if self.brightness != other.brightness {
            changes.push(FieldChange::Brightness(other.brightness));
        }

        changes
            .into_iter()
            .map(|change| Delta::new(self.id.clone(), change))
            .collect()
    }
}
