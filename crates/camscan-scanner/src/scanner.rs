//! The scanner component.
//!
//! [`Scanner`] ties the device inventory, the capture session and the scan
//! result pipeline together behind a small async API.
//!
//! # Concurrency
//!
//! All mutable state lives behind one `std::sync::Mutex` that is never held
//! across an `.await`. Consumer and notification sink calls are made after
//! the lock is released.
//!
//! An epoch counter is bumped by every start, stop and teardown. The async
//! operations capture it before each suspension point and re-check it
//! afterwards, so a stream that arrives after `stop_scanning()` is released
//! on the spot instead of being bound. Decode attempts carry the id of the
//! binding that produced them and are discarded once that binding is gone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use camscan_core::{ScannerConfig, ScannerState};
use camscan_hardware::traits::CameraPlatform;
use camscan_hardware::types::{Capability, DeviceConstraint, DeviceDescriptor};
use camscan_hardware::{AnyCameraPlatform, CaptureError, DecodeAttempt, MediaStream};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::consumer::ScanConsumer;
use crate::error::Result;
use crate::feedback::{Notification, NotificationSink, Tone, TracingNotifier};
use crate::inventory::DeviceInventory;
use crate::pipeline::{PipelineStats, ScanResultPipeline, Verdict};
use crate::session::{CaptureSession, acquire_with_fallback};
use crate::state_machine::{StateMachine, StateTransition};

/// Result of a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The scanner is in `Scanning` with a live stream.
    Started { device_id: String },

    /// The session was stopped while the request was in flight. Anything
    /// acquired late has already been released.
    Cancelled,
}

/// Result of a camera switch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The next camera is now bound.
    Switched { device_id: String },

    /// The next camera could not be opened; the previous one was re-bound.
    Kept { device_id: String },

    /// Not scanning, or fewer than two cameras known.
    Unavailable,

    /// The session was stopped while the switch was in flight.
    Cancelled,
}

enum BindOutcome {
    Bound(String),
    Stale,
    Failed(CaptureError),
}

struct Inner {
    machine: StateMachine,
    session: CaptureSession,
    inventory: DeviceInventory,
    pipeline: ScanResultPipeline,
    epoch: u64,
    teardown: Option<JoinHandle<()>>,
}

struct Shared {
    platform: AnyCameraPlatform,
    config: ScannerConfig,
    consumer: Box<dyn ScanConsumer>,
    notifier: Box<dyn NotificationSink>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    fn tone(&self) -> Tone {
        Tone::new(self.config.tone_frequency_hz, self.config.tone_duration())
    }

    /// Handle one decode attempt from binding `binding_id`.
    fn handle_attempt(self: &Arc<Self>, binding_id: u64, attempt: DecodeAttempt) {
        let accepted = {
            let mut inner = self.lock();
            let state = if inner.session.is_current(binding_id) {
                inner.machine.current_state()
            } else {
                // Stale binding: nothing it produces may be accepted
                ScannerState::Idle
            };

            let value = match inner.pipeline.on_decode_attempt(attempt, state) {
                Verdict::Accepted(value) => value,
                _ => return,
            };

            if let Err(e) = inner.machine.transition_to(ScannerState::Processing) {
                warn!(error = %e, "Accepted value dropped");
                return;
            }
            (value, inner.epoch)
        };
        let (value, epoch) = accepted;

        info!(value = %value, binding_id, "Scan accepted");
        self.notifier.play_tone(self.tone());
        self.consumer.on_scan_accepted(&value);

        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!("Session stopped while delivering scan");
                return;
            }
            if let Err(e) = inner.machine.transition_to(ScannerState::Success) {
                warn!(error = %e, "Could not enter success state");
                return;
            }
        }

        self.notifier.notify(Notification::ScanAccepted {
            value,
            at: Utc::now(),
        });
        self.schedule_teardown(epoch);
    }

    /// Tear the session down once the confirmation delay has elapsed.
    fn schedule_teardown(self: &Arc<Self>, epoch: u64) {
        let shared = Arc::downgrade(self);
        let delay = self.config.confirmation_delay();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.teardown_after_success(epoch);
            }
        });

        let mut inner = self.lock();
        if inner.epoch == epoch {
            if let Some(previous) = inner.teardown.replace(task) {
                previous.abort();
            }
        } else {
            task.abort();
        }
    }

    fn teardown_after_success(&self, epoch: u64) {
        let released = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                trace!("Stale teardown skipped");
                return;
            }
            // This task is the one running; do not abort it.
            inner.teardown = None;
            release(&mut inner)
        };

        debug!("Confirmation delay elapsed, session torn down");
        if released {
            self.notifier
                .notify(Notification::CameraActive { active: false });
        }
    }

    /// Stop everything. Safe to call in any state, any number of times.
    fn stop(&self) {
        let released = release(&mut self.lock());
        if released {
            self.notifier
                .notify(Notification::CameraActive { active: false });
        }
    }

    /// Fail the session of `epoch` with `error`.
    ///
    /// Passes through `Error`, releases everything, returns to `Idle` and
    /// emits one error notification.
    fn fail(&self, epoch: u64, error: CaptureError) -> CaptureError {
        let released = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return error;
            }
            let camera_active = inner.machine.current_state().is_camera_active();
            if let Err(e) = inner.machine.transition_to(ScannerState::Error) {
                warn!(error = %e, "Could not enter error state");
            }
            release(&mut inner) || camera_active
        };

        error!(reason = %error.reason(), error = %error, "Scan session failed");
        if released {
            self.notifier
                .notify(Notification::CameraActive { active: false });
        }
        self.notifier.notify(Notification::Error {
            reason: error.reason(),
            message: error.user_message(),
        });
        error
    }

    /// Release the session of `epoch` after its operation was dropped midway.
    fn abandon(&self, epoch: u64) {
        let released = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return;
            }
            let camera_active = inner.machine.current_state().is_camera_active();
            release(&mut inner) || camera_active
        };

        debug!("Operation cancelled, session released");
        if released {
            self.notifier
                .notify(Notification::CameraActive { active: false });
        }
    }

    /// Bind `stream` to the session of `epoch` and start decoding.
    ///
    /// With `enter_scanning`, also moves `Requesting` to `Scanning`.
    fn bind(self: &Arc<Self>, epoch: u64, stream: MediaStream, enter_scanning: bool) -> BindOutcome {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            drop(inner);
            stream.stop();
            debug!(device_id = %stream.device_id(), "Late stream released");
            return BindOutcome::Stale;
        }

        let (tx, rx) = mpsc::channel(self.config.decode_channel_capacity);
        let subscription = match self.platform.begin_decoding(&stream, tx) {
            Ok(subscription) => subscription,
            Err(e) => {
                drop(inner);
                stream.stop();
                return BindOutcome::Failed(e);
            }
        };

        let device_id = stream.device_id().to_string();
        let binding_id = inner.session.attach(stream, subscription);
        let pump = tokio::spawn(pump(Arc::downgrade(self), binding_id, rx));
        inner.session.set_pump(pump);

        if enter_scanning
            && let Err(e) = inner.machine.transition_to(ScannerState::Scanning)
        {
            warn!(error = %e, "Could not enter scanning state");
        }
        BindOutcome::Bound(device_id)
    }
}

/// Drops the session of `epoch` unless disarmed.
///
/// Held across the suspension points of `start` and `switch_device`, so a
/// caller that drops either future never leaves a session without a stream.
struct CancelGuard<'a> {
    shared: &'a Shared,
    epoch: u64,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    fn new(shared: &'a Shared, epoch: u64) -> Self {
        Self {
            shared,
            epoch,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon(self.epoch);
        }
    }
}

/// Release the binding and return to `Idle`.
///
/// Returns `true` if a live binding was released.
fn release(inner: &mut Inner) -> bool {
    inner.epoch += 1;

    if let Some(task) = inner.teardown.take() {
        task.abort();
    }

    let released = inner.session.release().is_some();
    inner.pipeline.arm_cooldown(Instant::now());

    if inner.machine.current_state() != ScannerState::Idle
        && inner.machine.transition_to(ScannerState::Idle).is_err()
    {
        inner.machine.reset();
    }
    released
}

/// Forward decode attempts of one binding to the scanner.
async fn pump(shared: Weak<Shared>, binding_id: u64, mut rx: mpsc::Receiver<DecodeAttempt>) {
    while let Some(attempt) = rx.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.handle_attempt(binding_id, attempt);
    }
    trace!(binding_id, "Decode pump finished");
}

/// Camera-based serial scanner.
///
/// # Examples
///
/// ```
/// use camscan_core::{ScannerConfig, ScannerState};
/// use camscan_hardware::mock::MockCameraPlatform;
/// use camscan_scanner::{ChannelConsumer, RecordingNotifier, Scanner, StartOutcome};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> camscan_scanner::Result<()> {
///     let (platform, camera) =
///         MockCameraPlatform::with_devices(&[("A", "Front Camera"), ("B", "Back Camera")]);
///     let (consumer, mut values) = ChannelConsumer::new();
///
///     let scanner = Scanner::new(platform, ScannerConfig::default(), consumer, RecordingNotifier::new())?;
///
///     let outcome = scanner.start_scanning().await?;
///     assert_eq!(outcome, StartOutcome::Started { device_id: "B".to_string() });
///
///     camera.present_code("  SN12345 ");
///     assert_eq!(values.recv().await.as_deref(), Some("SN12345"));
///     assert_eq!(scanner.state(), ScannerState::Success);
///
///     scanner.stop_scanning();
///     assert_eq!(camera.live_track_count(), 0);
///     Ok(())
/// }
/// ```
pub struct Scanner {
    shared: Arc<Shared>,
}

impl Scanner {
    /// Create a scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        platform: impl Into<AnyCameraPlatform>,
        config: ScannerConfig,
        consumer: impl ScanConsumer + 'static,
        notifier: impl NotificationSink + 'static,
    ) -> Result<Self> {
        Self::from_parts(
            platform.into(),
            config,
            Box::new(consumer),
            Box::new(notifier),
        )
    }

    /// Create a builder.
    pub fn builder(platform: impl Into<AnyCameraPlatform>) -> ScannerBuilder {
        ScannerBuilder::new(platform)
    }

    fn from_parts(
        platform: AnyCameraPlatform,
        config: ScannerConfig,
        consumer: Box<dyn ScanConsumer>,
        notifier: Box<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;

        let inner = Inner {
            machine: StateMachine::new(),
            session: CaptureSession::new(),
            inventory: DeviceInventory::default(),
            pipeline: ScanResultPipeline::new(config.cooldown()),
            epoch: 0,
            teardown: None,
        };

        info!(platform = platform.name(), "Scanner created");
        Ok(Self {
            shared: Arc::new(Shared {
                platform,
                config,
                consumer,
                notifier,
                inner: Mutex::new(inner),
            }),
        })
    }

    /// Check whether scanning can be offered at all.
    ///
    /// Synchronous, so callers can hide the scan affordance up front.
    pub fn probe_capability(&self) -> Capability {
        self.shared.platform.capability()
    }

    /// Start scanning with the configured preferred camera, or the default
    /// selection when none is configured.
    ///
    /// An active session is stopped first.
    ///
    /// # Errors
    ///
    /// Returns the capture error if no stream could be acquired or decoding
    /// could not start. The scanner is back in `Idle` when this returns.
    pub async fn start_scanning(&self) -> Result<StartOutcome> {
        let preferred = self.shared.config.preferred_device_id.clone();
        self.start(preferred).await
    }

    /// Start scanning with a specific camera.
    ///
    /// # Errors
    ///
    /// See [`start_scanning`](Self::start_scanning).
    pub async fn start_scanning_with(&self, device_id: impl Into<String>) -> Result<StartOutcome> {
        self.start(Some(device_id.into())).await
    }

    async fn start(&self, requested: Option<String>) -> Result<StartOutcome> {
        let shared = &self.shared;

        let (epoch, restarted) = {
            let mut inner = shared.lock();
            let restarted = inner.machine.current_state().is_active() && release(&mut inner);
            inner.epoch += 1;
            inner.machine.transition_to(ScannerState::Requesting)?;
            (inner.epoch, restarted)
        };
        if restarted {
            shared
                .notifier
                .notify(Notification::CameraActive { active: false });
        }
        let guard = CancelGuard::new(shared, epoch);

        if let Some(e) = shared.platform.capability().to_error() {
            return Err(shared.fail(epoch, e).into());
        }

        let inventory = DeviceInventory::enumerate(&shared.platform).await;
        let target = {
            let mut inner = shared.lock();
            if inner.epoch != epoch {
                return Ok(StartOutcome::Cancelled);
            }
            let target = requested
                .or_else(|| inventory.default_device().map(|d| d.device_id.clone()));
            inner.inventory = inventory;
            target
        };

        info!(device_id = ?target, "Requesting camera stream");
        let stream = match acquire_with_fallback(
            &shared.platform,
            target.as_deref(),
            shared.config.fallback_to_any_device,
        )
        .await
        {
            Ok(stream) => stream,
            Err(e) if shared.is_current(epoch) => return Err(shared.fail(epoch, e).into()),
            Err(e) => {
                debug!(error = %e, "Acquisition failed after stop");
                return Ok(StartOutcome::Cancelled);
            }
        };

        if !shared.is_current(epoch) {
            stream.stop();
            debug!(device_id = %stream.device_id(), "Late stream released");
            return Ok(StartOutcome::Cancelled);
        }

        self.refresh_labels_if_needed().await;

        match shared.bind(epoch, stream, true) {
            BindOutcome::Bound(device_id) => {
                guard.disarm();
                info!(device_id = %device_id, "Scanning");
                shared
                    .notifier
                    .notify(Notification::CameraActive { active: true });
                Ok(StartOutcome::Started { device_id })
            }
            BindOutcome::Stale => Ok(StartOutcome::Cancelled),
            BindOutcome::Failed(e) => Err(shared.fail(epoch, e).into()),
        }
    }

    /// Re-enumerate once permission has revealed the device labels.
    async fn refresh_labels_if_needed(&self) {
        let needs_labels = self.shared.lock().inventory.needs_labels();
        if !needs_labels {
            return;
        }

        let refreshed = DeviceInventory::enumerate(&self.shared.platform).await;
        if !refreshed.is_empty() {
            debug!(devices = refreshed.len(), "Device labels refreshed");
            self.shared.lock().inventory = refreshed;
        }
    }

    /// Stop scanning and release every hardware handle.
    ///
    /// Works in any state and is idempotent.
    pub fn stop_scanning(&self) {
        self.shared.stop();
    }

    /// Switch to the next camera in the inventory.
    ///
    /// The scanner stays in `Scanning` throughout. The current camera is
    /// released before the next one is tried. If the next camera cannot be
    /// opened, the previous one is acquired again and [`SwitchOutcome::Kept`]
    /// is returned.
    ///
    /// Dropping the future before it completes ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error only if the previous camera cannot be re-bound
    /// either, in which case the session ends through the error path.
    pub async fn switch_device(&self) -> Result<SwitchOutcome> {
        let shared = &self.shared;

        let (epoch, current, next) = {
            let mut inner = shared.lock();
            if inner.machine.current_state() != ScannerState::Scanning || inner.inventory.len() < 2
            {
                return Ok(SwitchOutcome::Unavailable);
            }
            let Some(current) = inner.session.device_id().map(str::to_string) else {
                return Ok(SwitchOutcome::Unavailable);
            };
            let Some(next) = inner
                .inventory
                .next_after(&current)
                .map(|d| d.device_id.clone())
                .filter(|next| *next != current)
            else {
                return Ok(SwitchOutcome::Unavailable);
            };

            inner.session.release();
            (inner.epoch, current, next)
        };
        let guard = CancelGuard::new(shared, epoch);

        info!(from = %current, to = %next, "Switching camera");
        match shared
            .platform
            .acquire_stream(&DeviceConstraint::Exact(next.clone()))
            .await
        {
            Ok(stream) => match shared.bind(epoch, stream, false) {
                BindOutcome::Bound(device_id) => {
                    guard.disarm();
                    return Ok(SwitchOutcome::Switched { device_id });
                }
                BindOutcome::Stale => return Ok(SwitchOutcome::Cancelled),
                BindOutcome::Failed(e) => {
                    warn!(device_id = %next, error = %e, "Could not decode from next camera")
                }
            },
            Err(e) => warn!(device_id = %next, error = %e, "Could not open next camera"),
        }

        if !shared.is_current(epoch) {
            return Ok(SwitchOutcome::Cancelled);
        }

        let result = match shared
            .platform
            .acquire_stream(&DeviceConstraint::Exact(current.clone()))
            .await
        {
            Ok(stream) => match shared.bind(epoch, stream, false) {
                BindOutcome::Bound(device_id) => {
                    guard.disarm();
                    Ok(SwitchOutcome::Kept { device_id })
                }
                BindOutcome::Stale => Ok(SwitchOutcome::Cancelled),
                BindOutcome::Failed(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if shared.is_current(epoch) => Err(shared.fail(epoch, e).into()),
            Err(_) => Ok(SwitchOutcome::Cancelled),
        }
    }

    /// Re-enumerate the cameras without starting a session.
    pub async fn refresh_devices(&self) -> Vec<DeviceDescriptor> {
        let inventory = DeviceInventory::enumerate(&self.shared.platform).await;
        let devices = inventory.devices().to_vec();
        self.shared.lock().inventory = inventory;
        devices
    }

    /// Get the current state.
    pub fn state(&self) -> ScannerState {
        self.shared.lock().machine.current_state()
    }

    /// Subscribe to state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ScannerState> {
        self.shared.lock().machine.subscribe()
    }

    /// Get the transition history, oldest first.
    pub fn history(&self) -> Vec<StateTransition> {
        self.shared.lock().machine.history().iter().cloned().collect()
    }

    /// Get the known cameras, in enumeration order.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        self.shared.lock().inventory.devices().to_vec()
    }

    /// Get the camera currently bound, if any.
    pub fn active_device_id(&self) -> Option<String> {
        self.shared.lock().session.device_id().map(str::to_string)
    }

    /// Get the last accepted value, unless its cooldown has passed.
    pub fn last_accepted(&self) -> Option<String> {
        self.shared
            .lock()
            .pipeline
            .last_accepted()
            .map(|last| last.value.clone())
    }

    /// Get the pipeline counters.
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.shared.lock().pipeline.stats()
    }

    /// Get the configuration.
    pub fn config(&self) -> &ScannerConfig {
        &self.shared.config
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("platform", &self.shared.platform.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Scanner`].
///
/// Defaults: [`ScannerConfig::default`], a consumer that drops values, and
/// [`TracingNotifier`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use camscan_core::ScannerConfig;
/// use camscan_hardware::mock::MockCameraPlatform;
/// use camscan_scanner::Scanner;
///
/// let (platform, _camera) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
/// let scanner = Scanner::builder(platform)
///     .config(ScannerConfig::default().with_cooldown(Duration::from_secs(5)))
///     .consumer(|value: &str| println!("scanned {value}"))
///     .build()
///     .unwrap();
///
/// assert!(scanner.probe_capability().is_supported());
/// ```
pub struct ScannerBuilder {
    platform: AnyCameraPlatform,
    config: ScannerConfig,
    consumer: Box<dyn ScanConsumer>,
    notifier: Box<dyn NotificationSink>,
}

impl ScannerBuilder {
    /// Create a builder for a platform.
    pub fn new(platform: impl Into<AnyCameraPlatform>) -> Self {
        Self {
            platform: platform.into(),
            config: ScannerConfig::default(),
            consumer: Box::new(|_: &str| {}),
            notifier: Box::new(TracingNotifier),
        }
    }

    /// Set the configuration.
    pub fn config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the consumer of accepted values.
    pub fn consumer(mut self, consumer: impl ScanConsumer + 'static) -> Self {
        self.consumer = Box::new(consumer);
        self
    }

    /// Set the notification sink.
    pub fn notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Build the scanner.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Scanner> {
        Scanner::from_parts(self.platform, self.config, self.consumer, self.notifier)
    }
}
