// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for light state.
//!
//! # Types
//!
//! - [`LightId`] - Identifier of a light on the bridge
//! - [`Brightness`] - Brightness percentage (0-100) or a non-numeric marker

mod brightness;
mod light_id;

pub use brightness::Brightness;
pub use light_id::LightId;
