// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light state, snapshots and change detection.
//!
//! A [`LightState`] is the observed state of one light, a [`Snapshot`] is
//! the observed state of every light at one poll, and a [`Delta`] records a
//! single field that changed between two polls.
//!
//! # Examples
//!
//! ```
//! use huewatch::state::{LightState, Snapshot};
//! use huewatch::types::Brightness;
//!
//! let before = LightState::new("1", "Lamp", false, Brightness::MIN);
//! let after = LightState::new("1", "Lamp", true, Brightness::MIN);
//!
//! assert_eq!(before.diff(&after).len(), 1);
//! ```

mod delta;
mod light_state;
mod snapshot;

pub use delta::{Delta, FieldChange, compare};
pub use light_state::LightState;
pub use snapshot::Snapshot;
