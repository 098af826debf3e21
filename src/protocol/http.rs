// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP access to a Hue bridge.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::protocol::LightFetcher;
use crate::state::LightState;
use crate::types::LightId;

// ============================================================================
// BridgeConfig - Connection parameters for a bridge
// ============================================================================

/// Configuration for a Hue bridge connection.
///
/// # Examples
///
/// ```
/// use huewatch::protocol::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::new("192.168.1.2")
///     .with_port(8080)
///     .with_username("d9f8c1")
///     .with_app_name("living-room.monitor")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://192.168.1.2:8080");
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    host: String,
    port: u16,
    use_https: bool,
    username: Option<String>,
    app_name: String,
    timeout: Duration,
}

impl BridgeConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default application name sent when registering a user.
    pub const DEFAULT_APP_NAME: &'static str = "huewatch.app";

    /// Creates a configuration for the bridge at `host`.
    ///
    /// `host` may carry a port (`"localhost:8080"`), in which case the port
    /// is taken from it, and an `http://` or `https://` scheme, which selects
    /// the protocol.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let (use_https, address) = match host.strip_prefix("https://") {
            Some(rest) => (true, rest),
            None => (false, host.strip_prefix("http://").unwrap_or(host.as_str())),
        };
        let address = address.trim_end_matches('/');
        let default_port = if use_https {
            Self::DEFAULT_HTTPS_PORT
        } else {
            Self::DEFAULT_PORT
        };

        let (host, port) = match address.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') => match port.parse() {
                Ok(port) => (name.to_string(), port),
                Err(_) => (address.to_string(), default_port),
            },
            _ => (address.to_string(), default_port),
        };

        Self {
            host,
            port,
            use_https,
            username: None,
            app_name: Self::DEFAULT_APP_NAME.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the username issued by the bridge.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the application name sent when registering a user.
    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the username, if one is set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates a [`HueBridgeClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> std::result::Result<HueBridgeClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HueBridgeClient {
            base_url,
            client,
            username: self.username,
            app_name: self.app_name,
        })
    }
}

// ============================================================================
// HueBridgeClient - HTTP client for the bridge API
// ============================================================================

/// HTTP client for a Hue bridge.
///
/// # Examples
///
/// ```no_run
/// use huewatch::protocol::{BridgeConfig, LightFetcher};
///
/// # async fn example() -> huewatch::Result<()> {
/// let client = BridgeConfig::new("192.168.1.2").into_client()?;
/// client.ping().await?;
/// let username = client.connect_user().await?;
///
/// let client = client.with_username(username);
/// let ids = client.fetch_ids().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HueBridgeClient {
    base_url: String,
    client: Client,
    username: Option<String>,
    app_name: String,
}

impl HueBridgeClient {
    /// Returns the base URL of the bridge.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the username used for light requests, if set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Sets the username issued by the bridge.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Checks that the bridge answers by fetching its `description.xml`.
    ///
    /// Returns the description document.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptyResponse`] if the document is empty,
    /// or a transport error if the bridge cannot be reached.
    pub async fn ping(&self) -> Result<String> {
        let url = format!("{}/description.xml", self.base_url);
        tracing::debug!(url = %url, "Pinging bridge");

        let response = self.client.get(&url).send().await.map_err(ProtocolError::Http)?;
        let body = Self::success(response)?
            .text()
            .await
            .map_err(ProtocolError::Http)?;

        if body.is_empty() {
            return Err(ProtocolError::EmptyResponse.into());
        }
        Ok(body)
    }

    /// Registers this application on the bridge and returns the username
    /// the bridge issued.
    ///
    /// The bridge only accepts the request shortly after its link button
    /// was pressed.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Rejected`] with the bridge's description if it
    ///   refused the registration.
    /// - [`ParseError::UnexpectedFormat`] if the response is neither a
    ///   success nor an error entry.
    pub async fn connect_user(&self) -> Result<String> {
        let url = format!("{}/api", self.base_url);
        let body = serde_json::json!({
            "devicetype": self.app_name,
            "username": "",
        });
        tracing::debug!(url = %url, devicetype = %self.app_name, "Registering bridge user");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let value = Self::json(Self::success(response)?).await?;

        parse_registration(&value)
    }

    /// Lists the ids of every light on the bridge.
    ///
    /// Integer ids are returned in ascending numeric order.
    ///
    /// # Errors
    ///
    /// Returns error if no username is set, the request fails, or the
    /// response is not an object keyed by light id.
    pub async fn lights(&self) -> Result<Vec<LightId>> {
        let value = self.get_json(&self.lights_url(None)?).await?;
        let lights = value.as_object().ok_or_else(|| {
            ParseError::UnexpectedFormat("expected an object keyed by light id".to_string())
        })?;

        let mut ids: Vec<LightId> = lights.keys().map(|k| LightId::from(k.as_str())).collect();
        ids.sort_by(LightId::bridge_order);
        Ok(ids)
    }

    /// Fetches the raw details of one light.
    ///
    /// # Errors
    ///
    /// Returns error if no username is set, the request fails, or the bridge
    /// reports an error for `id`.
    pub async fn light_details(&self, id: &LightId) -> Result<Value> {
        self.get_json(&self.lights_url(Some(id))?).await
    }

    fn lights_url(&self, id: Option<&LightId>) -> std::result::Result<String, ProtocolError> {
        let username = self
            .username
            .as_deref()
            .ok_or(ProtocolError::MissingUsername)?;
        let mut url = format!(
            "{}/api/{}/lights",
            self.base_url,
            urlencoding::encode(username)
        );
        if let Some(id) = id {
            url.push('/');
            url.push_str(&urlencoding::encode(id.as_str()));
        }
        Ok(url)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self.client.get(url).send().await.map_err(ProtocolError::Http)?;
        let value = Self::json(Self::success(response)?).await?;
        check_bridge_error(&value)?;
        Ok(value)
    }

    fn success(response: Response) -> std::result::Result<Response, ProtocolError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        Ok(response)
    }

    async fn json(response: Response) -> Result<Value> {
        let body = response.text().await.map_err(ProtocolError::Http)?;
        tracing::debug!(body = %body, "Received HTTP response");

        if body.is_empty() {
            return Err(ProtocolError::EmptyResponse.into());
        }
        Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
    }
}

impl LightFetcher for HueBridgeClient {
    async fn fetch_ids(&self) -> Result<Vec<LightId>> {
        self.lights().await
    }

    async fn fetch_state(&self, id: &LightId) -> Result<LightState> {
        let fetch = async {
            let details = self.light_details(id).await?;
            Ok::<_, Error>(LightState::from_api(id.clone(), &details)?)
        };
        fetch.await.map_err(|e| e.for_light(id.clone()))
    }
}

/// Extracts the username from a user registration response.
fn parse_registration(value: &Value) -> Result<String> {
    let entry = value.as_array().and_then(|entries| entries.first());

    if let Some(entry) = entry {
        if let Some(username) = entry.pointer("/success/username").and_then(Value::as_str) {
            return Ok(username.to_string());
        }
        if let Some(error) = entry.get("error") {
            let description = error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ProtocolError::Rejected(description.to_string()).into());
        }
    }

    Err(ParseError::UnexpectedFormat("unexpected /api server response".to_string()).into())
}

/// The bridge answers API errors with status 200 and an array of error
/// entries.
fn check_bridge_error(value: &Value) -> std::result::Result<(), ProtocolError> {
    let description = value
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|entry| entry.get("error"))
        .map(|error| {
            error
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string()
        });

    match description {
        Some(description) => Err(ProtocolError::Rejected(description)),
        None => Ok(()),
    }
}
