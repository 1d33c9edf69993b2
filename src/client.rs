use crate::error::{KeylightError, Result};
use crate::protocol::{LightUpdate, LightsDocument, LightsUpdateRequest};
use crate::types::{DeviceAddress, DeviceState};
use futures_util::future::join_all;
use std::time::Duration;

/// Vendor control port for Key Light devices
pub const CONTROL_PORT: u16 = 9123;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the Key Light HTTP control API
///
/// A `KeylightClient` issues GET/PUT requests against
/// `http://<address>:9123/elgato/lights`. It holds no per-device state and is
/// cheap to clone; one client can serve any number of devices.
///
/// The client performs no retries. Callers that want a retry policy layer it
/// on top.
///
/// # Example
///
/// ```no_run
/// use keylight_control::KeylightClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = KeylightClient::new();
///     let state = client.fetch_state("192.168.1.40").await?;
///     println!("{} is {}", state.address, if state.powered { "on" } else { "off" });
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct KeylightClient {
    http: reqwest::Client,
    port: u16,
}

impl KeylightClient {
    /// Create a client targeting the vendor control port (9123)
    pub fn new() -> Self {
        Self::with_port(CONTROL_PORT)
    }

    /// Create a client targeting a non-standard control port
    pub fn with_port(port: u16) -> Self {
        Self {
            http: reqwest::Client::new(),
            port,
        }
    }

    /// Fetch the current state of the device at `address`
    ///
    /// Returns the first light entry of the device's state document merged
    /// with the queried address. A device that reports no lights at all is a
    /// protocol violation, not an empty success.
    pub async fn fetch_state(&self, address: &str) -> Result<DeviceState> {
        let url = self.lights_url(address);
        tracing::debug!("Fetching state from {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let document: LightsDocument = serde_json::from_str(&body)?;

        let light = document
            .lights
            .first()
            .ok_or_else(|| KeylightError::protocol(address, "state document contains no lights"))?;

        Ok(DeviceState {
            address: address.to_string(),
            powered: light.is_on(),
            brightness: light.brightness,
            temperature: light.temperature,
        })
    }

    /// Apply a partial state update to the device at `address`
    ///
    /// The PUT body contains only the fields set on `update`. An update with
    /// no fields is rejected before any I/O.
    pub async fn set_state(&self, address: &str, update: LightUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(KeylightError::Validation(
                "state update has no fields set".to_string(),
            ));
        }

        let url = self.lights_url(address);
        tracing::debug!("Sending update to {}: {:?}", url, update);

        let body = LightsUpdateRequest {
            lights: vec![update],
        };

        self.http
            .put(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    /// Turn the device at `address` on or off
    pub async fn set_power(&self, address: &str, on: bool) -> Result<()> {
        self.set_state(address, LightUpdate::new().with_power(on))
            .await
    }

    /// Toggle the device at `address` and return the new power state
    pub async fn toggle_power(&self, address: &str) -> Result<bool> {
        let state = self.fetch_state(address).await?;
        let target = !state.powered;
        self.set_power(address, target).await?;
        Ok(target)
    }

    /// Set the brightness of the device at `address`
    pub async fn set_brightness(&self, address: &str, brightness: u32) -> Result<()> {
        self.set_state(address, LightUpdate::new().with_brightness(brightness))
            .await
    }

    /// Set the color temperature of the device at `address`
    pub async fn set_temperature(&self, address: &str, temperature: u32) -> Result<()> {
        self.set_state(address, LightUpdate::new().with_temperature(temperature))
            .await
    }

    /// Fetch the state of every address, concurrently
    ///
    /// One unreachable device must not hide the rest, so results are returned
    /// per-address in input order and failures stay in place.
    pub async fn fetch_all(
        &self,
        addresses: &[DeviceAddress],
    ) -> Vec<(DeviceAddress, Result<DeviceState>)> {
        let polls = addresses.iter().map(|address| {
            let address = address.clone();
            async move {
                let result = self.fetch_state(&address).await;
                if let Err(e) = &result {
                    tracing::warn!("Failed to poll {}: {}", address, e);
                }
                (address, result)
            }
        });

        join_all(polls).await
    }

    fn lights_url(&self, address: &str) -> String {
        format!("http://{}:{}/elgato/lights", address, self.port)
    }
}

impl Default for KeylightClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_BODY: &str =
        r#"{"numberOfLights":1,"lights":[{"on":1,"brightness":25,"temperature":213}]}"#;

    fn client_for(server: &mockito::ServerGuard) -> (KeylightClient, String) {
        let host_with_port = server.host_with_port();
        let (host, port) = host_with_port.rsplit_once(':').unwrap();
        (
            KeylightClient::with_port(port.parse().unwrap()),
            host.to_string(),
        )
    }

    #[tokio::test]
    async fn fetch_state_returns_first_light() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/elgato/lights")
            .with_status(200)
            .with_body(STATE_BODY)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let state = client.fetch_state(&host).await.unwrap();

        assert_eq!(state.address, host);
        assert!(state.powered);
        assert_eq!(state.brightness, 25);
        assert_eq!(state.temperature, 213);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_state_rejects_empty_lights_array() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/elgato/lights")
            .with_status(200)
            .with_body(r#"{"numberOfLights":0,"lights":[]}"#)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let err = client.fetch_state(&host).await.unwrap_err();
        assert!(matches!(err, KeylightError::Protocol { .. }));
    }

    #[tokio::test]
    async fn fetch_state_surfaces_malformed_body_as_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/elgato/lights")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let err = client.fetch_state(&host).await.unwrap_err();
        assert!(matches!(err, KeylightError::Decode(_)));
    }

    #[tokio::test]
    async fn rejected_command_is_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/elgato/lights")
            .with_status(500)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let err = client.set_power(&host, true).await.unwrap_err();
        assert!(matches!(err, KeylightError::Transport(_)));
    }

    #[tokio::test]
    async fn set_state_sends_only_changed_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/elgato/lights")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "lights": [{"brightness": 40}]
            })))
            .with_status(200)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        client.set_brightness(&host, 40).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_update_is_rejected_before_any_io() {
        let client = KeylightClient::with_port(1);
        let err = client
            .set_state("10.0.0.1", LightUpdate::new())
            .await
            .unwrap_err();
        assert!(matches!(err, KeylightError::Validation(_)));
    }

    #[tokio::test]
    async fn toggle_inverts_reported_power_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/elgato/lights")
            .with_status(200)
            .with_body(STATE_BODY)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/elgato/lights")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "lights": [{"on": 0}]
            })))
            .with_status(200)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let now_on = client.toggle_power(&host).await.unwrap();
        assert!(!now_on);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_all_returns_partial_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/elgato/lights")
            .with_status(200)
            .with_body(STATE_BODY)
            .create_async()
            .await;

        let (client, host) = client_for(&server);
        let results = client.fetch_all(&[host.clone()]).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_ok());

        // A dead port must fail in place rather than poison the batch.
        let unreachable = "127.0.0.1".to_string();
        let results = KeylightClient::with_port(1)
            .fetch_all(&[unreachable.clone()])
            .await;
        assert_eq!(results[0].0, unreachable);
        assert!(results[0].1.is_err());
    }
}
