//! Synthetic capture session.
//!
//! Behaves like a single-camera session: enforces the configuration
//! bracket, flips a running flag, and answers capture requests from its
//! own threads with a generated PNG. A [`MockHandle`] stays with the
//! caller after the session is handed to a controller, for inspection
//! and fault injection.

use super::{
    CaptureSession, Device, DeviceInput, DeviceInventory, EncodedPhoto, FaultEvent, FaultSink,
    OutputOptions, PhotoCaptureHandler, SessionError, SessionPreset,
};
use crate::orientation::PreviewRotation;
use crate::pipeline::{PhotoSettings, PixelFormat};
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// What a capture request produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockPayload {
    /// A PNG gradient of the given size.
    Png { width: u32, height: u32 },
    /// Bytes no decoder accepts.
    Corrupt,
    /// The hardware reports an error instead of a buffer.
    Failure(String),
}

impl MockPayload {
    fn render(&self, sequence: u64) -> Result<EncodedPhoto, SessionError> {
        match self {
            MockPayload::Png { width, height } => {
                let shade = (sequence % 256) as u8;
                let image = RgbImage::from_fn(*width, *height, |x, y| {
                    Rgb([(x % 256) as u8, (y % 256) as u8, shade])
                });
                let mut bytes = Vec::new();
                image
                    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                    .map_err(|e| SessionError::CaptureFailed(e.to_string()))?;
                Ok(EncodedPhoto::new(bytes, sequence))
            }
            MockPayload::Corrupt => Ok(EncodedPhoto::new(vec![0xDE, 0xAD, 0xBE, 0xEF], sequence)),
            MockPayload::Failure(reason) => Err(SessionError::CaptureFailed(reason.clone())),
        }
    }
}

/// Knobs controlling the synthetic session.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Devices advertised to the resolver.
    pub inventory: DeviceInventory,
    /// `open_input` fails.
    pub fail_input_creation: bool,
    /// `can_add_input` answers false.
    pub reject_input: bool,
    /// `can_add_photo_output` answers false.
    pub reject_output: bool,
    /// `start_running` leaves the session stopped.
    pub fail_start: bool,
    /// `capture_photo` returns an error.
    pub fail_submission: bool,
    /// Captures are queued until [`MockHandle::release_capture`].
    pub hold_captures: bool,
    /// Delay before capture completions are delivered.
    pub capture_delay: Duration,
    pub payload: MockPayload,
    pub preview_formats: Vec<PixelFormat>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            inventory: DeviceInventory::typical(),
            fail_input_creation: false,
            reject_input: false,
            reject_output: false,
            fail_start: false,
            fail_submission: false,
            hold_captures: false,
            capture_delay: Duration::from_millis(5),
            payload: MockPayload::Png {
                width: 64,
                height: 48,
            },
            preview_formats: vec![PixelFormat::Bgra32, PixelFormat::Yuv420BiPlanarFullRange],
        }
    }
}

/// Calls observed at the hardware boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    /// begin/commit, preset, input and output changes.
    pub configuration_calls: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub rotation_calls: usize,
    pub capture_submissions: usize,
    /// Mutations attempted outside a bracket or while running.
    pub contract_violations: usize,
    pub preset: Option<SessionPreset>,
    pub output_options: Option<OutputOptions>,
    pub last_rotation: Option<PreviewRotation>,
    pub last_settings: Option<PhotoSettings>,
}

impl CallLog {
    /// Total number of session-mutating calls.
    pub fn mutations(&self) -> usize {
        self.configuration_calls
            + self.start_calls
            + self.stop_calls
            + self.rotation_calls
            + self.capture_submissions
    }
}

type HeldCapture = (Arc<dyn PhotoCaptureHandler>, Result<EncodedPhoto, SessionError>);

struct MockState {
    behavior: MockBehavior,
    log: CallLog,
    configuring: bool,
    running: bool,
    input: Option<DeviceInput>,
    output: Option<OutputOptions>,
    fault_sink: Option<FaultSink>,
    held: VecDeque<HeldCapture>,
    sequence: u64,
}

impl MockState {
    fn check_mutable(&mut self, operation: &'static str) -> Result<(), SessionError> {
        if !self.configuring || self.running {
            self.log.contract_violations += 1;
            tracing::warn!(operation, "MockSession mutated outside configuration bracket");
            return Err(SessionError::NotConfiguring(operation));
        }
        self.log.configuration_calls += 1;
        Ok(())
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, MockState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn deliver(
    handler: Arc<dyn PhotoCaptureHandler>,
    result: Result<EncodedPhoto, SessionError>,
    delay: Duration,
) {
    thread::spawn(move || {
        thread::sleep(delay);
        handler.will_begin_capture();
        thread::sleep(delay);
        handler.did_finish_capture(result);
    });
}

/// Synthetic capture session.
pub struct MockSession {
    shared: Shared,
}

impl MockSession {
    pub fn new(behavior: MockBehavior) -> Self {
        let state = MockState {
            behavior,
            log: CallLog::default(),
            configuring: false,
            running: false,
            input: None,
            output: None,
            fault_sink: None,
            held: VecDeque::new(),
            sequence: 0,
        };
        Self {
            shared: Arc::new(Mutex::new(state)),
        }
    }

    /// Returns a handle that outlives moving the session elsewhere.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }

    fn set_running(&mut self, running: bool) {
        let sink = {
            let mut state = self.state();
            if state.running == running {
                return;
            }
            state.running = running;
            state.fault_sink.clone()
        };

        tracing::debug!(running, "MockSession running state changed");
        if let Some(sink) = sink {
            sink(FaultEvent::RunningStateChanged(running));
        }
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new(MockBehavior::default())
    }
}

impl CaptureSession for MockSession {
    fn begin_configuration(&mut self) {
        let mut state = self.state();
        state.configuring = true;
        state.log.configuration_calls += 1;
    }

    fn commit_configuration(&mut self) {
        let mut state = self.state();
        state.configuring = false;
        state.log.configuration_calls += 1;
    }

    fn set_preset(&mut self, preset: SessionPreset) -> Result<(), SessionError> {
        let mut state = self.state();
        state.check_mutable("set_preset")?;
        state.log.preset = Some(preset);
        Ok(())
    }

    fn devices(&self) -> DeviceInventory {
        self.state().behavior.inventory.clone()
    }

    fn open_input(&mut self, device: &Device) -> Result<DeviceInput, SessionError> {
        if self.state().behavior.fail_input_creation {
            return Err(SessionError::DeviceOpenFailed {
                device: device.id.clone(),
                reason: "device busy".to_string(),
            });
        }
        Ok(DeviceInput::new(device.clone()))
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        let state = self.state();
        !state.behavior.reject_input && state.input.is_none()
    }

    fn add_input(&mut self, input: DeviceInput) -> Result<(), SessionError> {
        let mut state = self.state();
        state.check_mutable("add_input")?;
        state.input = Some(input);
        Ok(())
    }

    fn can_add_photo_output(&self) -> bool {
        let state = self.state();
        !state.behavior.reject_output && state.output.is_none()
    }

    fn add_photo_output(&mut self, options: OutputOptions) -> Result<(), SessionError> {
        let mut state = self.state();
        state.check_mutable("add_photo_output")?;
        state.output = Some(options);
        state.log.output_options = Some(options);
        Ok(())
    }

    fn start_running(&mut self) {
        let fail = {
            let mut state = self.state();
            state.log.start_calls += 1;
            state.behavior.fail_start
        };
        if !fail {
            self.set_running(true);
        }
    }

    fn stop_running(&mut self) {
        self.state().log.stop_calls += 1;
        self.set_running(false);
    }

    fn is_running(&self) -> bool {
        self.state().running
    }

    fn available_preview_formats(&self) -> Vec<PixelFormat> {
        self.state().behavior.preview_formats.clone()
    }

    fn set_output_rotation(&mut self, rotation: PreviewRotation) {
        let mut state = self.state();
        state.log.rotation_calls += 1;
        state.log.last_rotation = Some(rotation);
    }

    fn capture_photo(
        &mut self,
        settings: PhotoSettings,
        handler: Arc<dyn PhotoCaptureHandler>,
    ) -> Result<(), SessionError> {
        let mut state = self.state();
        state.log.capture_submissions += 1;
        state.log.last_settings = Some(settings);

        if state.output.is_none() {
            return Err(SessionError::OutputNotConfigured);
        }
        if state.behavior.fail_submission {
            return Err(SessionError::SubmissionFailed("device not ready".to_string()));
        }

        state.sequence += 1;
        let result = state.behavior.payload.render(state.sequence);

        if state.behavior.hold_captures {
            state.held.push_back((handler, result));
        } else {
            deliver(handler, result, state.behavior.capture_delay);
        }
        Ok(())
    }

    fn observe_faults(&mut self, sink: FaultSink) {
        self.state().fault_sink = Some(sink);
    }

    fn stop_observing_faults(&mut self) {
        self.state().fault_sink = None;
    }
}

/// Inspection and fault-injection handle for a [`MockSession`].
#[derive(Clone)]
pub struct MockHandle {
    shared: Shared,
}

impl MockHandle {
    /// Snapshot of the calls observed so far.
    pub fn calls(&self) -> CallLog {
        lock(&self.shared).log.clone()
    }

    pub fn update_behavior(&self, update: impl FnOnce(&mut MockBehavior)) {
        update(&mut lock(&self.shared).behavior);
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).running
    }

    pub fn is_observing(&self) -> bool {
        lock(&self.shared).fault_sink.is_some()
    }

    /// The currently registered fault sink, if any.
    pub fn fault_sink(&self) -> Option<FaultSink> {
        lock(&self.shared).fault_sink.clone()
    }

    /// Delivers `event` to the observer from a separate thread.
    ///
    /// Returns false when nobody is observing.
    pub fn emit(&self, event: FaultEvent) -> bool {
        self.emit_all(vec![event])
    }

    /// Stops the session behind its owner's back, reporting only the
    /// running flag.
    pub fn simulate_stop(&self) -> bool {
        lock(&self.shared).running = false;
        self.emit(FaultEvent::RunningStateChanged(false))
    }

    /// Simulates a media services reset: the session stops, then reports
    /// the reset.
    pub fn simulate_media_reset(&self) -> bool {
        lock(&self.shared).running = false;
        self.emit_all(vec![
            FaultEvent::RunningStateChanged(false),
            FaultEvent::RuntimeMediaReset,
        ])
    }

    fn emit_all(&self, events: Vec<FaultEvent>) -> bool {
        let Some(sink) = self.fault_sink() else {
            return false;
        };
        thread::spawn(move || {
            for event in events {
                sink(event);
            }
        });
        true
    }

    /// Number of captures waiting for release.
    pub fn held_captures(&self) -> usize {
        lock(&self.shared).held.len()
    }

    /// Drops every held capture without completing it. Returns how many
    /// were discarded.
    pub fn discard_captures(&self) -> usize {
        let held = std::mem::take(&mut lock(&self.shared).held);
        let discarded = held.len();
        drop(held);
        discarded
    }

    /// Delivers the oldest held capture. Returns false when none is held.
    pub fn release_capture(&self) -> bool {
        let (held, delay) = {
            let mut state = lock(&self.shared);
            (state.held.pop_front(), state.behavior.capture_delay)
        };
        match held {
            Some((handler, result)) => {
                deliver(handler, result, delay);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::DeviceResolver;
    use std::sync::mpsc;

    struct ChannelHandler(Mutex<mpsc::Sender<&'static str>>);

    impl PhotoCaptureHandler for ChannelHandler {
        fn will_begin_capture(&self) {
            let _ = self.0.lock().unwrap().send("begin");
        }

        fn did_finish_capture(&self, result: Result<EncodedPhoto, SessionError>) {
            let tag = if result.is_ok() { "ok" } else { "error" };
            let _ = self.0.lock().unwrap().send(tag);
        }
    }

    fn configured() -> MockSession {
        let mut session = MockSession::default();
        let device = DeviceResolver::resolve_back_device(&session.devices()).unwrap();
        session.begin_configuration();
        let input = session.open_input(&device).unwrap();
        session.add_input(input).unwrap();
        session.add_photo_output(OutputOptions::default()).unwrap();
        session.commit_configuration();
        session
    }

    #[test]
    fn test_mutation_outside_bracket_rejected() {
        let mut session = MockSession::default();
        let handle = session.handle();

        let result = session.add_photo_output(OutputOptions::default());
        assert!(matches!(result, Err(SessionError::NotConfiguring(_))));
        assert_eq!(handle.calls().contract_violations, 1);
    }

    #[test]
    fn test_running_flag_reported_to_observer() {
        let mut session = configured();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        session.observe_faults(Arc::new(move |event| {
            let _ = tx.lock().unwrap().send(event);
        }));

        session.start_running();
        session.start_running();
        session.stop_running();

        assert_eq!(rx.try_recv().unwrap(), FaultEvent::RunningStateChanged(true));
        assert_eq!(rx.try_recv().unwrap(), FaultEvent::RunningStateChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_capture_delivers_begin_then_finish() {
        let mut session = configured();
        let (tx, rx) = mpsc::channel();

        session
            .capture_photo(
                PhotoSettings::default(),
                Arc::new(ChannelHandler(Mutex::new(tx))),
            )
            .unwrap();

        let timeout = Duration::from_secs(2);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), "begin");
        assert_eq!(rx.recv_timeout(timeout).unwrap(), "ok");
    }

    #[test]
    fn test_held_capture_waits_for_release() {
        let mut session = configured();
        let handle = session.handle();
        handle.update_behavior(|b| b.hold_captures = true);
        let (tx, rx) = mpsc::channel();

        session
            .capture_photo(
                PhotoSettings::default(),
                Arc::new(ChannelHandler(Mutex::new(tx))),
            )
            .unwrap();
        assert_eq!(handle.held_captures(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        assert!(handle.release_capture());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "begin");
        assert!(!handle.release_capture());
    }

    #[test]
    fn test_discarded_capture_never_completes() {
        let mut session = configured();
        let handle = session.handle();
        handle.update_behavior(|b| b.hold_captures = true);
        let (tx, rx) = mpsc::channel();

        session
            .capture_photo(
                PhotoSettings::default(),
                Arc::new(ChannelHandler(Mutex::new(tx))),
            )
            .unwrap();

        assert_eq!(handle.discard_captures(), 1);
        assert_eq!(handle.held_captures(), 0);
        assert!(!handle.release_capture());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_capture_without_output() {
        let mut session = MockSession::default();
        let (tx, _rx) = mpsc::channel();

        let result = session.capture_photo(
            PhotoSettings::default(),
            Arc::new(ChannelHandler(Mutex::new(tx))),
        );
        assert!(matches!(result, Err(SessionError::OutputNotConfigured)));
    }
}
