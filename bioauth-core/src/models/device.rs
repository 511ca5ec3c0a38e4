use serde::{Deserialize, Serialize};

/// Reported health of a discovered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Ok,
    Unknown,
}

/// A classified biometric reader.
///
/// Produced fresh on every discovery call and replaced wholesale on
/// reconnect; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String,
    pub model: String,
    /// How the device was found ("setupapi", "sysfs", ...).
    pub discovery_method: String,
    pub status: DeviceStatus,
}

/// A USB descriptor as reported by the platform discovery provider,
/// before vendor classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUsbDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub description: String,
}
