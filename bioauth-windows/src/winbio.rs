//! Windows Biometric Framework backend.
//!
//! Fallback capture path for any fingerprint reader with a WBF driver
//! (DigitalPersona, ZKTeco, Suprema, SecuGen, ...). Opens a system-pool
//! fingerprint session and pulls raw sample buffers with
//! `WinBioCaptureSample`.

use std::sync::Arc;

use windows::Win32::Devices::BiometricFramework::{
    WinBioCancel, WinBioCaptureSample, WinBioCloseSession, WinBioFree, WinBioOpenSession,
    WINBIO_BIR, WINBIO_DATA_FLAG_RAW, WINBIO_DB_DEFAULT, WINBIO_FLAG_RAW,
    WINBIO_NO_PURPOSE_AVAILABLE, WINBIO_POOL_SYSTEM, WINBIO_SESSION_HANDLE,
    WINBIO_TYPE_FINGERPRINT,
};

use bioauth_core::capture::backend::CaptureInterrupt;
use bioauth_core::models::device::DeviceDescriptor;
use bioauth_core::models::error::BioError;
use bioauth_core::models::sample::BackendKind;
use bioauth_core::ScannerBackend;

/// `ScannerBackend` over a Windows Biometric Framework session.
///
/// WBF manages finger presence itself: `WinBioCaptureSample` blocks until a
/// finger is placed or the call is cancelled. `poll_presence` therefore
/// reports ready immediately and the wait happens inside `capture_frame`;
/// on deadline expiry the orchestrator fires the interrupter, which calls
/// `WinBioCancel` on the session and unblocks the capture call.
pub struct WinBioBackend {
    session: Option<WINBIO_SESSION_HANDLE>,
}

/// Cancels an in-flight `WinBioCaptureSample` from another thread.
/// `WinBioCancel` is documented as callable on a session with a pending
/// operation.
struct SessionInterrupt(WINBIO_SESSION_HANDLE);

unsafe impl Send for SessionInterrupt {}
unsafe impl Sync for SessionInterrupt {}

impl CaptureInterrupt for SessionInterrupt {
    fn interrupt(&self) {
        unsafe {
            if let Err(e) = WinBioCancel(self.0) {
                log::warn!("WinBioCancel failed: {}", e);
            }
        }
    }
}

impl WinBioBackend {
    pub fn new() -> Self {
        Self { session: None }
    }
}

impl Default for WinBioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerBackend for WinBioBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::PlatformFramework
    }

    fn supports(&self, _device: &DeviceDescriptor) -> bool {
        // Any reader the OS exposes through WBF.
        true
    }

    fn initialize(&mut self) -> Result<(), BioError> {
        if self.session.is_some() {
            return Ok(());
        }
        let mut session = WINBIO_SESSION_HANDLE::default();
        unsafe {
            WinBioOpenSession(
                WINBIO_TYPE_FINGERPRINT,
                WINBIO_POOL_SYSTEM,
                WINBIO_FLAG_RAW,
                None,
                WINBIO_DB_DEFAULT,
                &mut session,
            )
        }
        .map_err(|e| {
            log::warn!("WinBioOpenSession failed: {}", e);
            BioError::BackendUnavailable
        })?;
        self.session = Some(session);
        log::info!("WBF fingerprint session opened");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    fn poll_presence(&mut self) -> Result<bool, BioError> {
        Ok(self.session.is_some())
    }

    fn capture_frame(&mut self) -> Result<Vec<u8>, BioError> {
        let session = self.session.ok_or(BioError::BackendUnavailable)?;

        let mut unit_id = 0u32;
        let mut sample: *mut WINBIO_BIR = std::ptr::null_mut();
        let mut sample_size = 0usize;
        let mut reject_detail = 0u32;
        unsafe {
            WinBioCaptureSample(
                session,
                WINBIO_NO_PURPOSE_AVAILABLE,
                WINBIO_DATA_FLAG_RAW,
                Some(&mut unit_id),
                Some(&mut sample),
                Some(&mut sample_size),
                Some(&mut reject_detail),
            )
        }
        .map_err(|e| {
            log::warn!(
                "WinBioCaptureSample failed (reject detail {}): {}",
                reject_detail,
                e
            );
            BioError::CaptureIo(format!("WinBioCaptureSample failed: {}", e))
        })?;

        if sample.is_null() || sample_size == 0 {
            return Err(BioError::CaptureIo("WBF returned an empty sample".into()));
        }
        let frame =
            unsafe { std::slice::from_raw_parts(sample as *const u8, sample_size) }.to_vec();
        unsafe {
            let _ = WinBioFree(sample as *mut core::ffi::c_void);
        }
        log::debug!("WBF sample captured from unit {} ({} bytes)", unit_id, frame.len());
        Ok(frame)
    }

    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            unsafe {
                let _ = WinBioCloseSession(session);
            }
            log::info!("WBF fingerprint session closed");
        }
    }

    fn quality_hint(&self) -> u8 {
        // WBF normalizes frames across drivers; slightly below the native
        // SDK path.
        80
    }

    fn interrupt_handle(&self) -> Option<Arc<dyn CaptureInterrupt>> {
        self.session
            .map(|session| Arc::new(SessionInterrupt(session)) as Arc<dyn CaptureInterrupt>)
    }
}

impl Drop for WinBioBackend {
    fn drop(&mut self) {
        self.teardown();
    }
}
