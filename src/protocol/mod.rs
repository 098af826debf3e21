// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access to the lights on a bridge.
//!
//! The monitor only needs two operations from the bridge, captured by the
//! [`LightFetcher`] trait. [`HueBridgeClient`] implements it over the
//! bridge's HTTP API.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{BridgeConfig, HueBridgeClient};

use std::future::Future;

use crate::error::Result;
use crate::state::LightState;
use crate::types::LightId;

/// Source of light ids and light states.
///
/// Returned futures must be `Send` so monitoring sessions can run on a
/// multi-threaded runtime and fetches can be spawned as separate tasks.
pub trait LightFetcher: Send + Sync {
    /// Lists the ids of every light on the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the bridge cannot be reached or answers with an
    /// unexpected payload.
    fn fetch_ids(&self) -> impl Future<Output = Result<Vec<LightId>>> + Send;

    /// Fetches the current state of one light.
    ///
    /// # Errors
    ///
    /// Returns error if the bridge cannot be reached, does not know `id`,
    /// or answers with an unexpected payload.
    fn fetch_state(&self, id: &LightId) -> impl Future<Output = Result<LightState>> + Send;
}
