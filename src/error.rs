// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `huewatch` library.
//!
//! Errors fall in two classes:
//!
//! - structural violations ([`CompareError`], [`ReportError`]) raised when
//!   states or snapshots that cannot be compared are handed to the
//!   differencer or the reporter. These are programming errors and always
//!   propagate to the caller.
//! - transport and decoding failures ([`ProtocolError`], [`ParseError`])
//!   raised while talking to the bridge. Inside a monitoring cycle these are
//!   contained to the light being fetched.

use thiserror::Error;

use crate::types::LightId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Two light states could not be compared.
    #[error("compare error: {0}")]
    Compare(#[from] CompareError),

    /// Two snapshots could not be reported on.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a bridge response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Fetching the state of a single light failed.
    #[error("failed to fetch light {id}: {source}")]
    Fetch {
        /// The light that could not be fetched.
        id: LightId,
        /// The underlying failure.
        #[source]
        source: Box<Error>,
    },

    /// A background fetch task ended without producing a result.
    #[error("fetch task failed: {0}")]
    TaskFailed(String),

    /// The monitoring session task ended without producing an outcome.
    #[error("monitoring session aborted: {0}")]
    SessionAborted(String),
}

impl Error {
    /// Wraps this error as a fetch failure for the given light.
    #[must_use]
    pub fn for_light(self, id: LightId) -> Self {
        match self {
            already @ Self::Fetch { .. } => already,
            other => Self::Fetch {
                id,
                source: Box::new(other),
            },
        }
    }
}

/// Errors raised when comparing two light states.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// One of the states to compare was not provided.
    #[error("missing {0} state")]
    MissingArgument(Side),

    /// The two states belong to different lights.
    #[error("states belong to different lights: {previous} != {current}")]
    IdentityMismatch {
        /// Identifier of the previous state.
        previous: LightId,
        /// Identifier of the current state.
        current: LightId,
    },
}

/// Which side of a comparison an argument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The earlier state.
    Previous,
    /// The later state.
    Current,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Previous => f.write_str("previous"),
            Self::Current => f.write_str("current"),
        }
    }
}

/// Errors raised when reporting on two snapshots.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A per-light comparison failed.
    #[error(transparent)]
    Compare(#[from] CompareError),

    /// The snapshots do not cover the same lights in the same order.
    #[error("snapshots are not parallel: [{}] vs [{}]", join(.previous), join(.current))]
    NonParallelSnapshots {
        /// Light ids of the previous snapshot.
        previous: Vec<LightId>,
        /// Light ids of the current snapshot.
        current: Vec<LightId>,
    },

    /// A report block could not be rendered.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

fn join(ids: &[LightId]) -> String {
    ids.iter()
        .map(LightId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors related to communicating with the bridge.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge answered with a non-success status.
    #[error("HTTP {code} - {reason}")]
    Status {
        /// The HTTP status code.
        code: u16,
        /// The canonical reason phrase.
        reason: String,
    },

    /// The bridge answered with an empty body.
    #[error("empty server response")]
    EmptyResponse,

    /// The bridge rejected the request with a description.
    #[error("request rejected by bridge: {0}")]
    Rejected(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A request needs a bridge username but none is configured.
    #[error("no bridge username configured")]
    MissingUsername,
}

/// Errors related to parsing bridge responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_error_display() {
        let err = CompareError::IdentityMismatch {
            previous: LightId::from("111"),
            current: LightId::from("999"),
        };
        assert_eq!(
            err.to_string(),
            "states belong to different lights: 111 != 999"
        );
        assert_eq!(
            CompareError::MissingArgument(Side::Current).to_string(),
            "missing current state"
        );
    }

    #[test]
    fn non_parallel_display() {
        let err = ReportError::NonParallelSnapshots {
            previous: vec![LightId::from("1"), LightId::from("2")],
            current: vec![LightId::from("1")],
        };
        assert_eq!(err.to_string(), "snapshots are not parallel: [1, 2] vs [1]");
    }

    #[test]
    fn error_from_compare_error() {
        let err: Error = CompareError::MissingArgument(Side::Previous).into();
        assert!(matches!(
            err,
            Error::Compare(CompareError::MissingArgument(Side::Previous))
        ));
    }

    #[test]
    fn for_light_wraps_once() {
        let err = Error::from(ProtocolError::EmptyResponse).for_light(LightId::from("3"));
        assert_eq!(
            err.to_string(),
            "failed to fetch light 3: protocol error: empty server response"
        );

        let rewrapped = err.for_light(LightId::from("4"));
        assert!(matches!(rewrapped, Error::Fetch { ref id, .. } if id.as_str() == "3"));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("state.on".to_string());
        assert_eq!(err.to_string(), "missing field in response: state.on");
    }
}
