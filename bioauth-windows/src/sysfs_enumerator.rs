//! USB discovery over Linux sysfs.
//!
//! Walks `/sys/bus/usb/devices`, skipping interface nodes (names with a
//! `:` in them), and reads `idVendor`/`idProduct`/`manufacturer`/`product`
//! attribute files. Useful for development boxes and CI; production
//! capture still runs on Windows.

use std::fs;
use std::path::{Path, PathBuf};

use bioauth_core::models::device::RawUsbDevice;
use bioauth_core::models::error::BioError;
use bioauth_core::UsbDeviceProvider;

/// `UsbDeviceProvider` over the sysfs USB device tree.
pub struct SysfsUsbEnumerator {
    root: PathBuf,
}

impl SysfsUsbEnumerator {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/sys/bus/usb/devices"),
        }
    }

    /// Point the enumerator at an alternate tree (tests).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsUsbEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbDeviceProvider for SysfsUsbEnumerator {
    fn list_usb_devices(&self) -> Result<Vec<RawUsbDevice>, BioError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| BioError::CaptureIo(format!("cannot read {}: {}", self.root.display(), e)))?;

        let mut devices = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            // Interface nodes look like "1-1:1.0"; device nodes have no colon.
            if name.to_string_lossy().contains(':') {
                continue;
            }
            if let Some(device) = read_device(&entry.path()) {
                devices.push(device);
            }
        }

        log::debug!("sysfs enumerated {} USB devices", devices.len());
        Ok(devices)
    }

    fn method(&self) -> &'static str {
        "sysfs"
    }
}

fn read_device(path: &Path) -> Option<RawUsbDevice> {
    let vendor_id = read_hex_attr(path, "idVendor")?;
    let product_id = read_hex_attr(path, "idProduct")?;

    let manufacturer = read_attr(path, "manufacturer").unwrap_or_default();
    let product = read_attr(path, "product").unwrap_or_default();
    let description = [manufacturer.as_str(), product.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    Some(RawUsbDevice {
        vendor_id,
        product_id,
        description,
    })
}

fn read_attr(path: &Path, name: &str) -> Option<String> {
    let text = fs::read_to_string(path.join(name)).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_hex_attr(path: &Path, name: &str) -> Option<u16> {
    u16::from_str_radix(read_attr(path, name)?.as_str(), 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_device(root: &Path, name: &str, attrs: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (attr, value) in attrs {
            fs::write(dir.join(attr), format!("{}\n", value)).unwrap();
        }
    }

    #[test]
    fn lists_devices_and_skips_interface_nodes() {
        let tmp = tempfile::tempdir().unwrap();
        write_device(
            tmp.path(),
            "1-2",
            &[
                ("idVendor", "1491"),
                ("idProduct", "0020"),
                ("manufacturer", "Futronic"),
                ("product", "FS80 USB2.0 Fingerprint Scanner"),
            ],
        );
        write_device(tmp.path(), "1-2:1.0", &[("idVendor", "ffff")]);
        // Hub without string descriptors.
        write_device(tmp.path(), "usb1", &[("idVendor", "1d6b"), ("idProduct", "0002")]);

        let provider = SysfsUsbEnumerator::with_root(tmp.path());
        let mut devices = provider.list_usb_devices().unwrap();
        devices.sort_by_key(|d| d.vendor_id);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].vendor_id, 0x1491);
        assert_eq!(devices[0].product_id, 0x0020);
        assert_eq!(devices[0].description, "Futronic FS80 USB2.0 Fingerprint Scanner");
        assert_eq!(devices[1].vendor_id, 0x1D6B);
        assert_eq!(devices[1].description, "");
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let provider = SysfsUsbEnumerator::with_root("/nonexistent/usb/tree");
        assert!(matches!(
            provider.list_usb_devices(),
            Err(BioError::CaptureIo(_))
        ));
    }

    #[test]
    fn malformed_ids_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_device(tmp.path(), "1-3", &[("idVendor", "zzzz"), ("idProduct", "0001")]);
        let provider = SysfsUsbEnumerator::with_root(tmp.path());
        assert!(provider.list_usb_devices().unwrap().is_empty());
    }
}
