use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::CaptureConfig;
use crate::models::device::DeviceDescriptor;
use crate::models::error::BioError;
use crate::models::sample::{BackendKind, CaptureSample};

use super::backend::ScannerBackend;
use super::state::CaptureState;

type SharedBackend = Arc<Mutex<Box<dyn ScannerBackend>>>;

/// Drives one blocking "capture a sample" operation across the registered
/// backends.
///
/// The orchestrator owns the live device handle for the process: all
/// adapter operations happen inside the single active capture call.
/// Backends are tried in registration order (native vendor SDK first, then
/// the platform framework). The blocking poll-then-capture sequence runs on
/// a dedicated worker thread so the request path stays responsive; the
/// caller waits on a channel with the overall deadline.
pub struct CaptureOrchestrator {
    backends: Vec<SharedBackend>,
    state: Mutex<CaptureState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag and parks the state machine back at `Idle`
/// on every exit path of `capture`.
struct FlightGuard<'a> {
    orchestrator: &'a CaptureOrchestrator,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *self.orchestrator.state.lock() = CaptureState::Idle;
        self.orchestrator.in_flight.store(false, Ordering::SeqCst);
    }
}

impl CaptureOrchestrator {
    /// `backends` in priority order: highest priority first.
    pub fn new(backends: Vec<Box<dyn ScannerBackend>>) -> Self {
        Self {
            backends: backends
                .into_iter()
                .map(|b| Arc::new(Mutex::new(b)))
                .collect(),
            state: Mutex::new(CaptureState::Idle),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state.lock().clone()
    }

    /// Capture one sample from the active device.
    ///
    /// Single-flight: a call while another capture is in flight fails
    /// immediately with `CaptureBusy` — blocking hardware calls are never
    /// queued. A device I/O failure tears down the failing backend and
    /// fails over to the next one in priority order, at most once per
    /// call. Timeout is terminal: a cancelled wait never yields a sample.
    pub fn capture(
        &self,
        device: Option<&DeviceDescriptor>,
        config: &CaptureConfig,
    ) -> Result<CaptureSample, BioError> {
        config.validate().map_err(BioError::Validation)?;

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(BioError::CaptureBusy);
        }
        let _guard = FlightGuard { orchestrator: self };

        let device = device.ok_or(BioError::DeviceNotConnected)?;
        *self.state.lock() = CaptureState::SelectingBackend;

        let mut last_error: Option<BioError> = None;
        let mut io_failures = 0u8;

        for backend in &self.backends {
            let kind = {
                let mut adapter = backend.lock();
                if !adapter.supports(device) {
                    log::debug!("{:?} does not support {} {}", adapter.kind(), device.manufacturer, device.model);
                    continue;
                }
                // Exactly one re-initialization attempt per call; failure
                // moves on to the next backend in priority order.
                if !adapter.is_ready() {
                    if let Err(e) = adapter.initialize() {
                        log::warn!("{:?} initialization failed: {}", adapter.kind(), e);
                        last_error = Some(e);
                        continue;
                    }
                }
                adapter.kind()
            };

            *self.state.lock() = CaptureState::AwaitingSample { backend: kind };
            log::info!("awaiting sample via {:?} (deadline {:?})", kind, config.timeout);

            match self.await_sample(backend, config) {
                Ok(sample) => {
                    *self.state.lock() = CaptureState::Captured { backend: kind };
                    log::info!("captured {} bytes via {:?}", sample.data.len(), kind);
                    return Ok(sample);
                }
                Err(BioError::CaptureTimeout) => {
                    *self.state.lock() = CaptureState::TimedOut;
                    return Err(BioError::CaptureTimeout);
                }
                Err(e) => {
                    // Hardware fault mid-capture. The worker already tore
                    // down the handle; go back to backend selection.
                    log::warn!("{:?} capture failed: {}", kind, e);
                    last_error = Some(e);
                    io_failures += 1;
                    if io_failures > 1 {
                        break;
                    }
                    *self.state.lock() = CaptureState::SelectingBackend;
                }
            }
        }

        let error = last_error.unwrap_or(BioError::BackendUnavailable);
        *self.state.lock() = CaptureState::Failed(error.clone());
        Err(error)
    }

    /// Run the blocking poll-then-capture sequence on a worker thread and
    /// wait for it under the wall-clock deadline.
    fn await_sample(
        &self,
        backend: &SharedBackend,
        config: &CaptureConfig,
    ) -> Result<CaptureSample, BioError> {
        let (kind, quality, interrupt) = {
            let adapter = backend.lock();
            (adapter.kind(), adapter.quality_hint(), adapter.interrupt_handle())
        };

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let worker_backend = Arc::clone(backend);
        let worker_cancel = Arc::clone(&cancel);
        let poll_interval = config.poll_interval;

        let handle = thread::Builder::new()
            .name("bio-capture".into())
            .spawn(move || {
                let result = capture_worker(&worker_backend, &worker_cancel, poll_interval);
                // The handle is released on every exit path: success,
                // cancellation, or device error.
                worker_backend.lock().teardown();
                let _ = tx.send(result);
            })
            .map_err(|e| BioError::Internal(format!("failed to spawn capture worker: {}", e)))?;

        match rx.recv_timeout(config.timeout) {
            Ok(result) => {
                let _ = handle.join();
                let data = result?;
                Ok(CaptureSample {
                    data,
                    quality,
                    backend: kind,
                })
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::SeqCst);
                // The worker observes the flag within one poll interval;
                // a backend blocked inside `capture_frame` is unblocked
                // through its interrupter. Either way the join is bounded.
                if let Some(interrupt) = &interrupt {
                    interrupt.interrupt();
                }
                let _ = handle.join();
                Err(BioError::CaptureTimeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(BioError::Internal(
                    "capture worker exited without reporting".into(),
                ))
            }
        }
    }
}

/// Poll for presence until the cancel flag trips, then capture one frame.
fn capture_worker(
    backend: &SharedBackend,
    cancel: &AtomicBool,
    poll_interval: Duration,
) -> Result<Vec<u8>, BioError> {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return Err(BioError::CaptureTimeout);
        }
        if backend.lock().poll_presence()? {
            break;
        }
        thread::sleep(poll_interval);
    }
    // Presence seen after cancellation still yields no sample.
    if cancel.load(Ordering::SeqCst) {
        return Err(BioError::CaptureTimeout);
    }
    backend.lock().capture_frame()
}
