use serde::{Deserialize, Serialize};

/// Device address (IPv4 address or hostname)
pub type DeviceAddress = String;

/// A known device as recorded in the registry
///
/// Records are owned by the [`crate::LightRegistry`]; other components refer
/// to a device by its address and look the record up when they need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Network address of the device, unique within the registry
    pub address: DeviceAddress,

    /// User-facing name for the device
    pub display_name: String,

    /// Whether the device should be polled periodically to keep it from
    /// entering standby
    pub keep_awake: bool,
}

/// A snapshot of a device's lighting state
///
/// Produced fresh by every poll; never cached beyond the call that fetched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// Address the state was fetched from
    pub address: DeviceAddress,

    /// Whether the light is emitting
    pub powered: bool,

    /// Brightness in device units (the device defines the valid range)
    pub brightness: u32,

    /// Color temperature in device units (the device defines the valid range)
    pub temperature: u32,
}
