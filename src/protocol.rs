use serde::{Deserialize, Serialize};

/// State document returned by a device for GET /elgato/lights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightsDocument {
    pub number_of_lights: u32,
    pub lights: Vec<LightStatus>,
}

/// State of a single light within a [`LightsDocument`]
///
/// Power is an integer on the wire (0 = off, 1 = on), not a boolean.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightStatus {
    pub on: u8,
    pub brightness: u32,
    pub temperature: u32,
}

impl LightStatus {
    /// Whether this light is emitting
    pub fn is_on(&self) -> bool {
        self.on != 0
    }
}

/// Partial state update sent to a device via PUT /elgato/lights
///
/// Only the fields being changed are serialized; the device leaves the rest
/// of its state untouched. Values pass through unclamped, out-of-range
/// rejection is the device's job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<u32>,
}

/// Request body wrapping a partial update for PUT /elgato/lights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LightsUpdateRequest {
    pub lights: Vec<LightUpdate>,
}

impl LightUpdate {
    /// Create an update that changes nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the power state (0/1 on the wire)
    pub fn with_power(mut self, on: bool) -> Self {
        self.on = Some(u8::from(on));
        self
    }

    /// Set the brightness
    pub fn with_brightness(mut self, brightness: u32) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Set the color temperature
    pub fn with_temperature(mut self, temperature: u32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Check whether the update carries any field at all
    pub fn is_empty(&self) -> bool {
        self.on.is_none() && self.brightness.is_none() && self.temperature.is_none()
    }
}
