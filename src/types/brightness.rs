// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for light state.
//!
//! The bridge reports brightness (`bri`) on a 0-254 scale. Lights are
//! tracked with a percentage in 0-100, normalized once when the bridge
//! response is mapped.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Brightness of a light as a percentage (0-100).
///
/// A bridge value that cannot be read as a number is kept as
/// [`Brightness::NotANumber`] rather than rejected, so one odd light does
/// not prevent the others from being observed.
///
/// # Examples
///
/// ```
/// use huewatch::types::Brightness;
///
/// assert_eq!(Brightness::from_raw(254.0), Brightness::Percent(100));
/// assert_eq!(Brightness::from_raw(2.0), Brightness::Percent(1));
/// assert_eq!(Brightness::from_raw(f64::NAN), Brightness::NotANumber);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Brightness {
    /// Normalized brightness percentage.
    Percent(u8),
    /// The bridge value was not numeric.
    NotANumber,
}

impl Brightness {
    /// Minimum brightness (0%).
    pub const MIN: Self = Self::Percent(0);

    /// Maximum brightness (100%).
    pub const MAX: Self = Self::Percent(100);

    /// Upper bound of the bridge's brightness scale.
    pub const API_MAX: f64 = 254.0;

    /// Normalizes a raw bridge brightness to a percentage.
    ///
    /// The input is clamped to `0..=254` and scaled to `0..=100`, rounding
    /// half up. `NaN` yields [`Brightness::NotANumber`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_raw(raw: f64) -> Self {
        if raw.is_nan() {
            return Self::NotANumber;
        }
        let clamped = raw.clamp(0.0, Self::API_MAX);
        // Safe: clamped * 100 / 254 is within 0.0..=100.0
        Self::Percent((clamped * 100.0 / Self::API_MAX).round() as u8)
    }

    /// Normalizes the `bri` field of a bridge response.
    ///
    /// Values are coerced the way the bridge's JavaScript clients read them:
    /// numbers and numeric strings are taken as is, `null`, `false` and blank
    /// strings count as 0 and `true` as 1. Anything else, including a missing
    /// field or an infinite string value, yields [`Brightness::NotANumber`].
    ///
    /// # Examples
    ///
    /// ```
    /// use huewatch::types::Brightness;
    /// use serde_json::json;
    ///
    /// assert_eq!(Brightness::from_api(Some(&json!(127))), Brightness::Percent(50));
    /// assert_eq!(Brightness::from_api(Some(&json!("foo"))), Brightness::NotANumber);
    /// assert_eq!(Brightness::from_api(None), Brightness::NotANumber);
    /// ```
    #[must_use]
    pub fn from_api(raw: Option<&Value>) -> Self {
        let number = match raw {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::Null) => Some(0.0),
            Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
            Some(Value::String(s)) => match s.trim() {
                "" => Some(0.0),
                // "inf", "NaN" and friends parse, but are not numbers to the bridge
                trimmed => trimmed.parse::<f64>().ok().filter(|n| n.is_finite()),
            },
            _ => None,
        };
        number.map_or(Self::NotANumber, Self::from_raw)
    }

    /// Returns the percentage, or `None` for a non-numeric brightness.
    #[must_use]
    pub const fn value(&self) -> Option<u8> {
        match self {
            Self::Percent(v) => Some(*v),
            Self::NotANumber => None,
        }
    }

    /// Returns `true` if the bridge value was not numeric.
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::NotANumber)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(v) => write!(f, "{v}%"),
            Self::NotANumber => f.write_str("NaN"),
        }
    }
}

impl Serialize for Brightness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Percent(v) => serializer.serialize_u8(*v),
            Self::NotANumber => serializer.serialize_none(),
        }
    }
}
