//! Native Futronic SDK backend.
//!
//! Drives FS80/FS80H/FS88-family scanners through `ftrScanAPI.dll`. The
//! vendor library is loaded at runtime with `LoadLibraryW`, so the crate
//! links without the SDK installed and `initialize` reports
//! `BackendUnavailable` on machines that lack it.

use std::ffi::c_void;

use windows::core::{w, PCSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use bioauth_core::models::device::DeviceDescriptor;
use bioauth_core::models::error::BioError;
use bioauth_core::models::sample::BackendKind;
use bioauth_core::ScannerBackend;

/// Fingerprint detection dose used by `ftrScanGetImage`. Dose 4 is the
/// vendor-recommended setting for FS80-family frame acquisition.
const CAPTURE_DOSE: i32 = 4;

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct FtrScanImageSize {
    width: i32,
    height: i32,
    image_size: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
struct FtrScanFrameParameters {
    contrast_on_dose2: i32,
    contrast_on_dose4: i32,
    dose: i32,
    finger_present: i32,
}

type FtrScanOpenDevice = unsafe extern "system" fn() -> *mut c_void;
type FtrScanCloseDevice = unsafe extern "system" fn(*mut c_void) -> i32;
type FtrScanGetImageSize = unsafe extern "system" fn(*mut c_void, *mut FtrScanImageSize) -> i32;
type FtrScanIsFingerPresent =
    unsafe extern "system" fn(*mut c_void, *mut FtrScanFrameParameters) -> i32;
type FtrScanGetImage = unsafe extern "system" fn(*mut c_void, i32, *mut u8) -> i32;

struct FtrScanApi {
    module: HMODULE,
    open_device: FtrScanOpenDevice,
    close_device: FtrScanCloseDevice,
    get_image_size: FtrScanGetImageSize,
    is_finger_present: FtrScanIsFingerPresent,
    get_image: FtrScanGetImage,
}

impl FtrScanApi {
    /// Load `ftrScanAPI.dll` and resolve the five entry points we use.
    fn load() -> Result<Self, BioError> {
        let module = unsafe { LoadLibraryW(w!("ftrScanAPI.dll")) }.map_err(|e| {
            log::warn!("ftrScanAPI.dll not loadable: {}", e);
            BioError::BackendUnavailable
        })?;

        unsafe fn resolve<T>(module: HMODULE, name: PCSTR) -> Result<T, BioError> {
            let raw = unsafe { GetProcAddress(module, name) }.ok_or(BioError::BackendUnavailable)?;
            // All ftrScanAPI entry points are plain function pointers.
            Ok(unsafe { std::mem::transmute_copy(&raw) })
        }

        unsafe {
            Ok(Self {
                module,
                open_device: resolve(module, PCSTR(b"ftrScanOpenDevice\0".as_ptr()))?,
                close_device: resolve(module, PCSTR(b"ftrScanCloseDevice\0".as_ptr()))?,
                get_image_size: resolve(module, PCSTR(b"ftrScanGetImageSize\0".as_ptr()))?,
                is_finger_present: resolve(module, PCSTR(b"ftrScanIsFingerPresent\0".as_ptr()))?,
                get_image: resolve(module, PCSTR(b"ftrScanGetImage\0".as_ptr()))?,
            })
        }
    }
}

impl Drop for FtrScanApi {
    fn drop(&mut self) {
        unsafe {
            let _ = FreeLibrary(self.module);
        }
    }
}

/// `ScannerBackend` over the native Futronic SDK.
///
/// Only claims devices whose manufacturer classifies as Futronic; other
/// readers fall through to the platform-framework backend.
pub struct FutronicBackend {
    api: Option<FtrScanApi>,
    handle: *mut c_void,
}

// The device handle is only touched through &mut self from the capture
// worker thread that owns the backend.
unsafe impl Send for FutronicBackend {}

impl FutronicBackend {
    pub fn new() -> Self {
        Self {
            api: None,
            handle: std::ptr::null_mut(),
        }
    }
}

impl Default for FutronicBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerBackend for FutronicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NativeSdk
    }

    fn supports(&self, device: &DeviceDescriptor) -> bool {
        device.manufacturer == "Futronic"
    }

    fn initialize(&mut self) -> Result<(), BioError> {
        if self.api.is_none() {
            self.api = Some(FtrScanApi::load()?);
        }
        let api = self.api.as_ref().ok_or(BioError::BackendUnavailable)?;

        let handle = unsafe { (api.open_device)() };
        if handle.is_null() {
            log::warn!("ftrScanOpenDevice returned no handle");
            return Err(BioError::CaptureIo("scanner did not open".into()));
        }
        self.handle = handle;
        log::info!("Futronic scanner opened");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        !self.handle.is_null()
    }

    fn poll_presence(&mut self) -> Result<bool, BioError> {
        let api = self.api.as_ref().ok_or(BioError::BackendUnavailable)?;
        let mut params = FtrScanFrameParameters::default();
        let ok = unsafe { (api.is_finger_present)(self.handle, &mut params) };
        // A failed presence probe is treated as "no finger yet"; the poll
        // loop retries until the deadline.
        Ok(ok != 0 && params.finger_present != 0)
    }

    fn capture_frame(&mut self) -> Result<Vec<u8>, BioError> {
        let api = self.api.as_ref().ok_or(BioError::BackendUnavailable)?;

        let mut size = FtrScanImageSize::default();
        if unsafe { (api.get_image_size)(self.handle, &mut size) } == 0 {
            return Err(BioError::CaptureIo("ftrScanGetImageSize failed".into()));
        }
        if size.image_size <= 0 {
            return Err(BioError::CaptureIo(format!(
                "scanner reported invalid frame size {}",
                size.image_size
            )));
        }

        let mut frame = vec![0u8; size.image_size as usize];
        if unsafe { (api.get_image)(self.handle, CAPTURE_DOSE, frame.as_mut_ptr()) } == 0 {
            return Err(BioError::CaptureIo("ftrScanGetImage failed".into()));
        }
        log::debug!(
            "Futronic frame captured: {}x{} ({} bytes)",
            size.width,
            size.height,
            frame.len()
        );
        Ok(frame)
    }

    fn teardown(&mut self) {
        if self.handle.is_null() {
            return;
        }
        if let Some(api) = self.api.as_ref() {
            unsafe {
                (api.close_device)(self.handle);
            }
        }
        self.handle = std::ptr::null_mut();
        log::info!("Futronic scanner closed");
    }

    fn quality_hint(&self) -> u8 {
        85
    }
}

impl Drop for FutronicBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
