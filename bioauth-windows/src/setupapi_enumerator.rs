//! USB discovery over SetupAPI.
//!
//! Enumerates present devices in the USB enumerator class and parses
//! vendor/product ids out of their device instance ids
//! (`USB\VID_xxxx&PID_xxxx\...`). Friendly descriptions come from the
//! device description registry property when available.

use windows::core::{w, PWSTR};
use windows::Win32::Devices::DeviceAndDriverInstallation::{
    SetupDiDestroyDeviceInfoList, SetupDiEnumDeviceInfo, SetupDiGetClassDevsW,
    SetupDiGetDeviceInstanceIdW, SetupDiGetDeviceRegistryPropertyW, DIGCF_ALLCLASSES,
    DIGCF_PRESENT, HDEVINFO, SPDRP_DEVICEDESC, SP_DEVINFO_DATA,
};

use bioauth_core::models::device::RawUsbDevice;
use bioauth_core::models::error::BioError;
use bioauth_core::UsbDeviceProvider;

use crate::parse_vid_pid;

/// `UsbDeviceProvider` over SetupAPI device instance ids.
pub struct SetupApiUsbEnumerator;

struct DevInfoSet(HDEVINFO);

impl Drop for DevInfoSet {
    fn drop(&mut self) {
        unsafe {
            let _ = SetupDiDestroyDeviceInfoList(self.0);
        }
    }
}

impl SetupApiUsbEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SetupApiUsbEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbDeviceProvider for SetupApiUsbEnumerator {
    fn list_usb_devices(&self) -> Result<Vec<RawUsbDevice>, BioError> {
        let set = DevInfoSet(
            unsafe { SetupDiGetClassDevsW(None, w!("USB"), None, DIGCF_ALLCLASSES | DIGCF_PRESENT) }
                .map_err(|e| BioError::CaptureIo(format!("SetupDiGetClassDevs failed: {}", e)))?,
        );

        let mut devices = Vec::new();
        let mut index = 0u32;
        loop {
            let mut info = SP_DEVINFO_DATA {
                cbSize: std::mem::size_of::<SP_DEVINFO_DATA>() as u32,
                ..Default::default()
            };
            if unsafe { SetupDiEnumDeviceInfo(set.0, index, &mut info) }.is_err() {
                break;
            }
            index += 1;

            let mut id_buf = [0u16; 512];
            let mut required = 0u32;
            if unsafe {
                SetupDiGetDeviceInstanceIdW(
                    set.0,
                    &info,
                    Some(PWSTR(id_buf.as_mut_ptr())),
                    id_buf.len() as u32,
                    Some(&mut required),
                )
            }
            .is_err()
            {
                continue;
            }
            let instance_id = utf16_to_string(&id_buf);
            let Some((vendor_id, product_id)) = parse_vid_pid(&instance_id) else {
                continue;
            };

            let description = device_description(set.0, &info).unwrap_or_default();
            devices.push(RawUsbDevice {
                vendor_id,
                product_id,
                description,
            });
        }

        log::debug!("SetupAPI enumerated {} USB devices", devices.len());
        Ok(devices)
    }

    fn method(&self) -> &'static str {
        "setupapi"
    }
}

fn device_description(set: HDEVINFO, info: &SP_DEVINFO_DATA) -> Option<String> {
    let mut buf = [0u8; 1024];
    let mut required = 0u32;
    unsafe {
        SetupDiGetDeviceRegistryPropertyW(
            set,
            info,
            SPDRP_DEVICEDESC,
            None,
            Some(&mut buf),
            Some(&mut required),
        )
    }
    .ok()?;
    // REG_SZ payload is UTF-16.
    let words: Vec<u16> = buf
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = utf16_to_string(&words);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn utf16_to_string(words: &[u16]) -> String {
    let end = words.iter().position(|&w| w == 0).unwrap_or(words.len());
    String::from_utf16_lossy(&words[..end])
}
