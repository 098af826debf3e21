// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light identifier type.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a light on the bridge.
///
/// The bridge keys its lights by short numeric strings (`"1"`, `"2"`, ...).
/// The identifier is kept as a string so non-numeric ids survive untouched.
///
/// # Examples
///
/// ```
/// use huewatch::types::LightId;
///
/// let id = LightId::from("7");
/// assert_eq!(id.as_str(), "7");
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LightId(String);

impl LightId {
    /// Creates a light identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordering used when listing lights discovered on the bridge.
    ///
    /// Integer ids come first in ascending numeric order, so `"2"` sorts
    /// before `"10"`. Everything else follows in lexicographic order.
    #[must_use]
    pub fn bridge_order(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }

    fn numeric(&self) -> Option<u64> {
        // "01" is not a canonical integer key
        if self.0.len() > 1 && self.0.starts_with('0') {
            return None;
        }
        self.0.parse().ok()
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LightId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LightId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u32> for LightId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for LightId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_number_matches_string() {
        assert_eq!(LightId::from(999), LightId::from("999"));
    }

    #[test]
    fn bridge_order_sorts_numeric_ids_by_value() {
        let mut ids: Vec<LightId> = ["10", "2", "lamp", "1", "01"]
            .into_iter()
            .map(LightId::from)
            .collect();
        ids.sort_by(LightId::bridge_order);

        let sorted: Vec<&str> = ids.iter().map(LightId::as_str).collect();
        assert_eq!(sorted, ["1", "2", "10", "01", "lamp"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&LightId::from("4")).unwrap();
        assert_eq!(json, "\"4\"");
    }
}
