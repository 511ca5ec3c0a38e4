use parking_lot::RwLock;

use crate::models::device::{DeviceDescriptor, DeviceStatus, RawUsbDevice};
use crate::models::error::BioError;

use super::vendors;

/// Platform USB discovery contract.
///
/// Implementations are swapped per OS (SetupAPI on Windows, sysfs on
/// Linux) and stubbed in tests. Providers report raw descriptors only;
/// classification happens in the registry.
pub trait UsbDeviceProvider: Send + Sync {
    fn list_usb_devices(&self) -> Result<Vec<RawUsbDevice>, BioError>;

    /// Name recorded in `DeviceDescriptor::discovery_method`.
    fn method(&self) -> &'static str;
}

/// Discovers attached biometric readers and tracks the active one.
///
/// The registry owns no hardware resource: it only produces descriptors.
/// Discovery output replaces prior state wholesale, never merging with it.
pub struct DeviceRegistry {
    provider: Box<dyn UsbDeviceProvider>,
    devices: RwLock<Vec<DeviceDescriptor>>,
}

impl DeviceRegistry {
    pub fn new(provider: Box<dyn UsbDeviceProvider>) -> Self {
        Self {
            provider,
            devices: RwLock::new(Vec::new()),
        }
    }

    /// Query the discovery provider and classify every attached descriptor
    /// against the vendor table; unrecognized vendors are dropped.
    ///
    /// The first element of the returned list is the active device. That is
    /// "first found by discovery order", not "best match".
    pub fn discover(&self) -> Result<Vec<DeviceDescriptor>, BioError> {
        let raw = self.provider.list_usb_devices()?;
        let method = self.provider.method();

        let classified: Vec<DeviceDescriptor> = raw
            .into_iter()
            .filter_map(|device| {
                let (manufacturer, model) = vendors::classify(device.vendor_id, device.product_id)?;
                Some(DeviceDescriptor {
                    vendor_id: device.vendor_id,
                    product_id: device.product_id,
                    manufacturer: manufacturer.to_string(),
                    model: model.to_string(),
                    discovery_method: method.to_string(),
                    status: DeviceStatus::Ok,
                })
            })
            .collect();

        match classified.first() {
            Some(active) => log::info!(
                "discovered {} reader(s), active: {} {}",
                classified.len(),
                active.manufacturer,
                active.model
            ),
            None => log::warn!("no supported biometric reader found"),
        }

        *self.devices.write() = classified.clone();
        Ok(classified)
    }

    /// Re-run discovery, wholesale-replacing the active device and its
    /// classification. Returns the new active device, if any.
    pub fn reconnect(&self) -> Result<Option<DeviceDescriptor>, BioError> {
        let devices = self.discover()?;
        Ok(devices.into_iter().next())
    }

    /// The current active device (first found in the last discovery).
    pub fn active_device(&self) -> Option<DeviceDescriptor> {
        self.devices.read().first().cloned()
    }

    /// All devices from the last discovery, in discovery order.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.devices.read().clone()
    }

    /// Vendor names the classification table covers.
    pub fn supported_vendors(&self) -> Vec<&'static str> {
        vendors::supported_vendors()
    }
}
