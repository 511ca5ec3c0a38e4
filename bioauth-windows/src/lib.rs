//! # bioauth-windows
//!
//! Platform capture backends for bio-auth-kit.
//!
//! Provides:
//! - `FutronicBackend` — native vendor SDK adapter over a runtime-loaded
//!   `ftrScanAPI.dll` (FS80/FS80H/FS88 family)
//! - `WinBioBackend` — Windows Biometric Framework session adapter for any
//!   reader with a WBF driver (DigitalPersona, ZKTeco, Suprema, ...)
//! - `SetupApiUsbEnumerator` — USB discovery provider over SetupAPI device
//!   instance ids
//! - `SysfsUsbEnumerator` — Linux USB discovery provider over
//!   `/sys/bus/usb/devices`
//!
//! Backend priority is the caller's concern: register the Futronic adapter
//! ahead of the WBF adapter when building the `CaptureOrchestrator`.

#[cfg(target_os = "windows")]
pub mod futronic;
#[cfg(target_os = "windows")]
pub mod setupapi_enumerator;
#[cfg(target_os = "windows")]
pub mod winbio;

#[cfg(target_os = "linux")]
pub mod sysfs_enumerator;

#[cfg(target_os = "windows")]
pub use futronic::FutronicBackend;
#[cfg(target_os = "windows")]
pub use setupapi_enumerator::SetupApiUsbEnumerator;
#[cfg(target_os = "windows")]
pub use winbio::WinBioBackend;

#[cfg(target_os = "linux")]
pub use sysfs_enumerator::SysfsUsbEnumerator;

/// Parse `VID_xxxx` / `PID_xxxx` fragments out of a device instance id
/// such as `USB\VID_1491&PID_0020\FS00000000`.
pub fn parse_vid_pid(instance_id: &str) -> Option<(u16, u16)> {
    let upper = instance_id.to_ascii_uppercase();
    let hex_after = |marker: &str| -> Option<u16> {
        let start = upper.find(marker)? + marker.len();
        let fragment = upper.get(start..start + 4)?;
        u16::from_str_radix(fragment, 16).ok()
    };
    Some((hex_after("VID_")?, hex_after("PID_")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_windows_instance_ids() {
        assert_eq!(
            parse_vid_pid(r"USB\VID_1491&PID_0020\FS00000000"),
            Some((0x1491, 0x0020))
        );
        assert_eq!(
            parse_vid_pid(r"usb\vid_05ba&pid_000a\12345"),
            Some((0x05BA, 0x000A))
        );
    }

    #[test]
    fn rejects_ids_without_vid_pid() {
        assert_eq!(parse_vid_pid(r"HID\GARBAGE\0"), None);
        assert_eq!(parse_vid_pid(r"USB\VID_ZZZZ&PID_0001\x"), None);
        assert_eq!(parse_vid_pid(r"USB\VID_149"), None);
    }
}
