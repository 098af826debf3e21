// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitoring configuration.

use std::time::Duration;

/// What to do with a light whose state could not be fetched during a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Keep the light's last known state for this poll.
    ///
    /// The light stays tracked and no change is reported for it.
    #[default]
    RetainLastKnown,

    /// Stop tracking the light for the rest of the session.
    DropLight,
}

/// Configuration for a monitoring session.
///
/// # Examples
///
/// ```
/// use huewatch::monitor::{FetchFailurePolicy, MonitorConfig};
/// use std::time::Duration;
///
/// let config = MonitorConfig::default()
///     .with_poll_interval(Duration::from_millis(500))
///     .with_quiet_timeout(Duration::from_secs(30))
///     .with_failure_policy(FetchFailurePolicy::DropLight);
///
/// assert_eq!(config.poll_interval(), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    poll_interval: Duration,
    quiet_timeout: Duration,
    failure_policy: FetchFailurePolicy,
    event_capacity: usize,
}

impl MonitorConfig {
    /// Default delay between two polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
    /// Default quiet period after which monitoring stops.
    pub const DEFAULT_QUIET_TIMEOUT: Duration = Duration::from_secs(60);
    /// Default capacity of the session event channel.
    pub const DEFAULT_EVENT_CAPACITY: usize = 64;

    /// Creates a configuration with the given poll interval and quiet
    /// timeout.
    #[must_use]
    pub fn new(poll_interval: Duration, quiet_timeout: Duration) -> Self {
        Self {
            poll_interval,
            quiet_timeout,
            failure_policy: FetchFailurePolicy::default(),
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Sets the delay between the end of one poll and the start of the next.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets how long monitoring continues without any detected change.
    #[must_use]
    pub fn with_quiet_timeout(mut self, quiet_timeout: Duration) -> Self {
        self.quiet_timeout = quiet_timeout;
        self
    }

    /// Sets the policy applied to lights that fail to fetch.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the capacity of the session event channel.
    ///
    /// Subscribers that fall further behind lose the oldest events.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the quiet timeout.
    #[must_use]
    pub fn quiet_timeout(&self) -> Duration {
        self.quiet_timeout
    }

    /// Returns the fetch failure policy.
    #[must_use]
    pub fn failure_policy(&self) -> FetchFailurePolicy {
        self.failure_policy
    }

    /// Returns the event channel capacity.
    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POLL_INTERVAL, Self::DEFAULT_QUIET_TIMEOUT)
    }
}
