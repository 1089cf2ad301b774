//! The capture-session orchestrator.

use super::monitor::{InterruptionMonitor, MonitorAction};
use super::permission::PermissionGate;
use super::queue::{UiContext, WorkerQueue};
use super::state::{ControllerStats, RunState, SetupState, StatsSnapshot};
use super::{CameraDelegate, CameraError, ConfigurationFailure, ControllerError, PreviewTarget};
use crate::capture::{
    CaptureSession, ControllerConfig, Device, DeviceResolver, EncodedPhoto, FaultEvent, FaultSink,
    OutputOptions, PhotoCaptureHandler, SessionError, SessionPreset,
};
use crate::orientation::{preview_rotation, DeviceOrientation, OrientationLatch};
use crate::pipeline::{CaptureRequest, CapturedImage, PhotoPipeline};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

/// State only touched from jobs running on the worker queue.
struct WorkerState {
    session: Box<dyn CaptureSession>,
    run_state: RunState,
    /// Last running flag reported to the delegate.
    session_running: bool,
    monitor: InterruptionMonitor,
    configuration_error: Option<String>,
}

impl WorkerState {
    fn configure(&mut self, preset: SessionPreset) -> Result<Device, ConfigurationFailure> {
        self.session.begin_configuration();
        let result = self.configure_io(preset);
        self.session.commit_configuration();
        result
    }

    fn configure_io(&mut self, preset: SessionPreset) -> Result<Device, ConfigurationFailure> {
        self.session.set_preset(preset)?;

        let device = DeviceResolver::resolve_back_device(&self.session.devices())
            .ok_or(ConfigurationFailure::NoDevice)?;

        let input = self
            .session
            .open_input(&device)
            .map_err(ConfigurationFailure::InputCreation)?;
        if !self.session.can_add_input(&input) {
            return Err(ConfigurationFailure::InputRejected);
        }
        self.session.add_input(input)?;

        if !self.session.can_add_photo_output() {
            return Err(ConfigurationFailure::OutputRejected);
        }
        self.session.add_photo_output(OutputOptions::default())?;

        Ok(device)
    }
}

type DelegateRef = Option<Weak<dyn CameraDelegate>>;
type PreviewRef = Option<Weak<dyn PreviewTarget>>;

struct Inner {
    config: ControllerConfig,
    queue: WorkerQueue,
    ui: Arc<dyn UiContext>,
    worker: Mutex<WorkerState>,
    setup_state: RwLock<Option<SetupState>>,
    setup_started: AtomicBool,
    terminal_reported: AtomicBool,
    capture_in_flight: AtomicBool,
    next_request_id: AtomicU64,
    orientation: OrientationLatch,
    delegate: RwLock<DelegateRef>,
    preview: RwLock<PreviewRef>,
    stats: ControllerStats,
}

impl Inner {
    fn worker(&self) -> MutexGuard<'_, WorkerState> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn setup_state(&self) -> Option<SetupState> {
        *self.setup_state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_setup_state(&self, state: SetupState) {
        *self.setup_state.write().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }

    fn delegate_ref(&self) -> DelegateRef {
        self.delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn preview_ref(&self) -> PreviewRef {
        self.preview
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn delegate(&self) -> Option<Arc<dyn CameraDelegate>> {
        self.delegate_ref().and_then(|d| d.upgrade())
    }

    fn preview(&self) -> Option<Arc<dyn PreviewTarget>> {
        self.preview_ref().and_then(|p| p.upgrade())
    }

    /// Runs `callback` against the delegate on the UI context, if the
    /// delegate is still alive by then.
    fn notify(&self, callback: impl FnOnce(&dyn CameraDelegate) + Send + 'static) {
        let delegate = self.delegate_ref();
        self.ui.dispatch(Box::new(move || {
            if let Some(delegate) = delegate.and_then(|d| d.upgrade()) {
                callback(delegate.as_ref());
            }
        }));
    }

    fn with_preview(&self, callback: impl FnOnce(&dyn PreviewTarget) + Send + 'static) {
        let preview = self.preview_ref();
        self.ui.dispatch(Box::new(move || {
            if let Some(preview) = preview.and_then(|p| p.upgrade()) {
                callback(preview.as_ref());
            }
        }));
    }

    fn report(&self, error: CameraError) {
        tracing::warn!(kind = ?error.kind(), %error, "Reporting camera error");
        self.notify(move |delegate| delegate.log_error(&error));
    }

    /// Submits `job` to the worker queue with a weak handle on `self`.
    fn submit(self: &Arc<Self>, job: impl FnOnce(&Arc<Inner>) + Send + 'static) {
        let inner = Arc::downgrade(self);
        self.queue.enqueue(move || {
            if let Some(inner) = inner.upgrade() {
                job(&inner);
            }
        });
    }

    fn reflect_running(&self, worker: &mut WorkerState, running: bool) {
        if worker.session_running == running {
            return;
        }
        worker.session_running = running;
        self.stats.set_running(running);
        self.notify(move |delegate| delegate.running_state_changed(running));
    }

    fn resolve_permission(&self, granted: bool) {
        if granted {
            tracing::info!("Camera access granted");
            self.queue.resume();
            return;
        }

        tracing::info!("Camera access denied");
        self.set_setup_state(SetupState::NotAuthorized);
        if !self.terminal_reported.swap(true, Ordering::SeqCst) {
            self.notify(|delegate| delegate.access_denied());
        }
    }

    fn configure(&self) {
        let result = self.worker().configure(self.config.preset);

        match result {
            Ok(device) => {
                tracing::info!(device = %device.id, kind = ?device.kind, "Capture session configured");
                self.set_setup_state(SetupState::Success);
                self.with_preview(|preview| preview.session_attached());
            }
            Err(failure) => {
                tracing::error!(%failure, "Capture session configuration failed");
                self.worker().configuration_error = Some(failure.to_string());
                self.set_setup_state(SetupState::ConfigurationFailed);
                self.report(failure.into());
            }
        }
    }

    fn report_configuration_failed(&self) {
        let reason = self
            .worker()
            .configuration_error
            .clone()
            .unwrap_or_else(|| "session not configured".to_string());
        self.report(CameraError::Configuration { reason });
        if !self.terminal_reported.swap(true, Ordering::SeqCst) {
            self.notify(|delegate| delegate.configuration_failed());
        }
    }

    /// Checks setup before touching the session. Reports and returns false
    /// unless setup succeeded.
    fn ensure_configured(&self, operation: &'static str) -> bool {
        match self.setup_state() {
            Some(SetupState::Success) => true,
            Some(SetupState::ConfigurationFailed) => {
                self.report_configuration_failed();
                false
            }
            Some(SetupState::NotAuthorized) => {
                self.report(CameraError::PermissionDenied);
                false
            }
            None => {
                tracing::warn!(operation, "Ignoring request made before setup");
                false
            }
        }
    }

    fn fault_sink(self: &Arc<Self>) -> FaultSink {
        let inner = Arc::downgrade(self);
        Arc::new(move |event: FaultEvent| {
            if let Some(inner) = inner.upgrade() {
                inner.submit(move |inner| inner.handle_fault(event));
            }
        })
    }

    fn start_session(self: &Arc<Self>) {
        if !self.ensure_configured("start") {
            return;
        }

        let mut worker = self.worker();
        // The hardware may have stopped on its own since the last start.
        if worker.run_state.is_active() && worker.session.is_running() {
            tracing::debug!(state = ?worker.run_state, "Session already running");
            return;
        }

        worker.run_state = RunState::Starting;
        worker.session.observe_faults(self.fault_sink());
        worker.session.start_running();

        let running = worker.session.is_running();
        worker.run_state = if running {
            RunState::Running
        } else {
            RunState::Stopped
        };
        self.reflect_running(&mut worker, running);
        drop(worker);

        if running {
            tracing::info!("Capture session started");
        } else {
            tracing::warn!("Capture session failed to start");
        }

        self.with_preview(|preview| {
            preview.set_preview_rotation(preview_rotation(preview.interface_orientation()));
        });
    }

    fn stop_session(&self) {
        let mut worker = self.worker();
        if worker.run_state == RunState::Idle {
            tracing::debug!("Session never started, nothing to stop");
            return;
        }

        worker.run_state = RunState::Stopping;
        worker.session.stop_running();
        let running = worker.session.is_running();
        self.reflect_running(&mut worker, running);
        worker.session.stop_observing_faults();
        worker.run_state = RunState::Stopped;

        tracing::info!("Capture session stopped");
    }

    fn handle_fault(&self, event: FaultEvent) {
        let mut worker = self.worker();
        let run_state = worker.run_state;
        let action = worker.monitor.decide(&event, run_state);

        match action {
            MonitorAction::Restart => {
                self.stats.restarted();
                tracing::info!("Restarting session after media services reset");
                worker.session.start_running();

                if worker.session.is_running() {
                    worker.run_state = RunState::Running;
                    self.reflect_running(&mut worker, true);
                } else {
                    tracing::warn!("Session restart failed");
                    worker.run_state = RunState::Stopped;
                    worker.session_running = false;
                    self.stats.set_running(false);
                    self.notify(|delegate| delegate.running_state_changed(false));
                }
            }
            MonitorAction::NotifyInterrupted => {
                self.stats.interrupted();
                self.notify(|delegate| delegate.session_interrupted());
            }
            MonitorAction::NotifyInterruptionEnded => {
                self.notify(|delegate| delegate.session_interruption_ended());
            }
            MonitorAction::ReflectRunning(reported) => {
                // Not forwarded verbatim: the event can trail a later start or
                // stop, so the reported flag is superseded by the session's own.
                let running = worker.session.is_running();
                if running != reported {
                    tracing::debug!(reported, running, "Discarding stale running state event");
                }
                self.reflect_running(&mut worker, running);
            }
            MonitorAction::Report(reason) => self.report(CameraError::RuntimeFault { reason }),
            MonitorAction::Ignore => {}
        }
    }

    fn submit_capture(self: &Arc<Self>, request: CaptureRequest) {
        if !self.ensure_configured("capture") {
            self.capture_in_flight.store(false, Ordering::Release);
            return;
        }

        let mut worker = self.worker();
        worker.session.set_output_rotation(request.output_rotation());
        let settings = PhotoPipeline::build_settings(&worker.session.available_preview_formats());

        tracing::debug!(
            request_id = request.id(),
            orientation = ?request.image_orientation(),
            ?settings,
            "Submitting capture"
        );

        let handler = Arc::new(CaptureHandler {
            inner: Arc::downgrade(self),
            request,
            completed: AtomicBool::new(false),
        });
        let submitted = worker
            .session
            .capture_photo(settings, Arc::clone(&handler) as Arc<dyn PhotoCaptureHandler>);
        drop(worker);

        if let Err(e) = submitted {
            handler.complete(Err(CameraError::capture(e)));
        }
    }

    fn finish_capture(&self, outcome: Result<CapturedImage, CameraError>) {
        self.capture_in_flight.store(false, Ordering::Release);

        match outcome {
            Ok(image) => {
                self.stats.capture_delivered();
                tracing::info!(
                    request_id = image.request_id(),
                    width = image.width(),
                    height = image.height(),
                    "Photo captured"
                );
                self.notify(move |delegate| delegate.did_capture(image));
            }
            Err(error) => {
                self.stats.capture_failed();
                self.report(error);
            }
        }
    }

    /// Stops a running session when the controller goes away.
    fn teardown(&self) {
        let mut worker = self.worker();
        if worker.run_state.is_active() {
            worker.session.stop_running();
            worker.run_state = RunState::Stopped;
        }
        worker.session.stop_observing_faults();
    }
}

/// Completion target for one capture request.
///
/// Completes exactly once. A handler the hardware drops without
/// completing reports the capture as failed.
struct CaptureHandler {
    inner: Weak<Inner>,
    request: CaptureRequest,
    completed: AtomicBool,
}

impl CaptureHandler {
    fn complete(&self, outcome: Result<CapturedImage, CameraError>) {
        if self.completed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.finish_capture(outcome);
        }
    }
}

impl Drop for CaptureHandler {
    fn drop(&mut self) {
        if !*self.completed.get_mut() {
            tracing::warn!(
                request_id = self.request.id(),
                "Capture handler dropped without a result"
            );
            self.complete(Err(CameraError::capture("capture abandoned by hardware")));
        }
    }
}

impl PhotoCaptureHandler for CaptureHandler {
    fn will_begin_capture(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.with_preview(|preview| preview.play_capture_animation());
        }
    }

    fn did_finish_capture(&self, result: Result<EncodedPhoto, SessionError>) {
        let outcome = result.map_err(CameraError::capture).and_then(|photo| {
            PhotoPipeline::decode(&photo, &self.request).map_err(CameraError::capture)
        });
        self.complete(outcome);
    }
}

/// Turns a capture session into an asynchronous photo service.
///
/// All session mutations run on one worker thread in submission order.
/// Results and notifications reach the delegate through the UI context.
/// The preview target and delegate are held weakly; the host owns them.
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Creates a controller with the default configuration.
    pub fn new(
        session: impl CaptureSession + 'static,
        ui: Arc<dyn UiContext>,
    ) -> Result<Self, ControllerError> {
        Self::with_config(session, ui, ControllerConfig::default())
    }

    pub fn with_config(
        session: impl CaptureSession + 'static,
        ui: Arc<dyn UiContext>,
        config: ControllerConfig,
    ) -> Result<Self, ControllerError> {
        config.validate()?;
        let queue = WorkerQueue::new(&config.queue_label)?;

        let worker = WorkerState {
            session: Box::new(session),
            run_state: RunState::Idle,
            session_running: false,
            monitor: InterruptionMonitor::new(config.auto_restart_on_media_reset),
            configuration_error: None,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                queue,
                ui,
                worker: Mutex::new(worker),
                setup_state: RwLock::new(None),
                setup_started: AtomicBool::new(false),
                terminal_reported: AtomicBool::new(false),
                capture_in_flight: AtomicBool::new(false),
                next_request_id: AtomicU64::new(0),
                orientation: OrientationLatch::new(),
                delegate: RwLock::new(None),
                preview: RwLock::new(None),
                stats: ControllerStats::default(),
            }),
        })
    }

    /// Gates configuration on camera access, then configures the session.
    ///
    /// Only the first call has any effect. Work submitted before access is
    /// decided waits behind the decision; after a denial it never runs.
    pub fn setup<P, D>(&self, preview: &Arc<P>, delegate: &Arc<D>)
    where
        P: PreviewTarget + 'static,
        D: CameraDelegate + 'static,
    {
        let preview: Weak<P> = Arc::downgrade(preview);
        let delegate: Weak<D> = Arc::downgrade(delegate);
        let preview: Weak<dyn PreviewTarget> = preview;
        let delegate: Weak<dyn CameraDelegate> = delegate;
        self.setup_with(Some(preview), Some(delegate));
    }

    fn setup_with(&self, preview: PreviewRef, delegate: DelegateRef) {
        let inner = &self.inner;
        if inner.setup_started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Setup already performed, ignoring");
            return;
        }

        *inner.preview.write().unwrap_or_else(PoisonError::into_inner) = preview;
        *inner.delegate.write().unwrap_or_else(PoisonError::into_inner) = delegate;

        inner.queue.suspend();
        inner.submit(|inner| inner.configure());

        let gate = Arc::downgrade(inner);
        PermissionGate::check_access(inner.delegate(), move |granted| {
            if let Some(inner) = gate.upgrade() {
                inner.resolve_permission(granted);
            }
        });
    }

    /// Starts the session. Call when the camera screen becomes visible.
    pub fn start(&self) {
        let inner = &self.inner;
        if inner.setup_state() == Some(SetupState::NotAuthorized) {
            inner.report(CameraError::PermissionDenied);
            return;
        }

        // Seed the latch until the rotation feed delivers a sample.
        if inner.orientation.current().is_none() {
            if let Some(preview) = inner.preview() {
                inner.orientation.update(preview.device_orientation());
            }
        }
        inner.submit(|inner| inner.start_session());
    }

    /// Stops the session. Safe to call when not running.
    pub fn stop(&self) {
        if self.inner.setup_state() == Some(SetupState::NotAuthorized) {
            tracing::debug!("Ignoring stop, camera access denied");
            return;
        }
        self.inner.submit(|inner| inner.stop_session());
    }

    /// Requests a still capture.
    ///
    /// Must be called on the UI context: the preview rotation is read here,
    /// before the request is queued. Only one capture may be outstanding;
    /// the result arrives through `did_capture` or `log_error`.
    pub fn capture_photo(&self) -> Result<(), CameraError> {
        let inner = &self.inner;
        if inner.setup_state() == Some(SetupState::NotAuthorized) {
            inner.report(CameraError::PermissionDenied);
            return Err(CameraError::PermissionDenied);
        }

        if inner
            .capture_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            inner.stats.capture_rejected();
            inner.report(CameraError::CaptureInProgress);
            return Err(CameraError::CaptureInProgress);
        }

        let rotation = inner
            .preview()
            .map(|preview| preview.preview_rotation())
            .unwrap_or_default();
        let id = inner.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let request = CaptureRequest::new(id, inner.orientation.image_orientation(), rotation);

        inner.stats.capture_requested();
        inner.submit(move |inner| inner.submit_capture(request));
        Ok(())
    }

    /// Feeds a rotation sample from the host's orientation sensor.
    ///
    /// Flat readings are ignored and return false.
    pub fn update_device_orientation(&self, orientation: DeviceOrientation) -> bool {
        self.inner.orientation.update(orientation)
    }

    /// Outcome of setup, once decided.
    pub fn setup_state(&self) -> Option<SetupState> {
        self.inner.setup_state()
    }

    pub fn run_state(&self) -> RunState {
        self.inner.worker().run_state
    }

    /// Last running flag reported to the delegate.
    pub fn is_session_running(&self) -> bool {
        self.inner.worker().session_running
    }

    pub fn is_capture_in_progress(&self) -> bool {
        self.inner.capture_in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Waits until work already submitted to the worker queue has run.
    ///
    /// Returns false on timeout, including while access is undecided.
    pub fn sync(&self, timeout: Duration) -> bool {
        self.inner.queue.sync(timeout)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        let inner = Arc::clone(&self.inner);
        self.inner.queue.enqueue(move || inner.teardown());
        self.inner.queue.shutdown();
    }
}
