//! Mock camera platform for testing and development.
//!
//! This module provides a simulated camera platform whose devices,
//! permission state, failures and presented codes are all controlled through
//! a [`MockCameraHandle`]. The handle also reports how many tracks and
//! decode loops are live, which is what resource-release tests assert on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{CaptureError, Result};
use crate::stream::{DecodeAttempt, DecodeSubscription, MediaStream, MediaTrack};
use crate::traits::CameraPlatform;
use crate::types::{Capability, DeviceConstraint, MediaDeviceInfo};

/// Capacity of the presented-frame broadcast channel.
const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Permission state of the mock platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// The user has not been asked yet.
    Prompt,

    /// Access granted. Set by the first successful acquisition.
    Granted,

    /// Access refused. Every acquisition fails.
    Denied,
}

#[derive(Debug)]
struct MockState {
    devices: Vec<MediaDeviceInfo>,
    capability: Capability,
    permission: PermissionState,
    hide_labels_until_granted: bool,
    enumeration_error: Option<CaptureError>,
    device_failures: HashMap<String, CaptureError>,
    unconstrained_failure: Option<CaptureError>,
    decoder_failure: Option<CaptureError>,
    acquisitions: Vec<DeviceConstraint>,
    decoders: Vec<CancellationToken>,
}

#[derive(Debug, Default)]
struct MockCounters {
    live_tracks: AtomicUsize,
    streams_opened: AtomicUsize,
    pending_acquisitions: AtomicUsize,
}

#[derive(Debug, Clone)]
struct Shared {
    state: Arc<Mutex<MockState>>,
    counters: Arc<MockCounters>,
    frames: broadcast::Sender<DecodeAttempt>,
    gate: Arc<watch::Sender<bool>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.gate.subscribe();
        if *gate.borrow_and_update() {
            return;
        }

        let _pending = PendingAcquisition::new(Arc::clone(&self.counters));
        let _ = gate.wait_for(|open| *open).await.map(|_| ());
    }

    fn resolve_acquisition(&self, constraint: &DeviceConstraint) -> Result<MediaDeviceInfo> {
        let mut state = self.lock();

        if let Some(err) = state.capability.to_error() {
            return Err(err);
        }
        if state.permission == PermissionState::Denied {
            return Err(CaptureError::permission_denied(
                "Permission denied by mock platform",
            ));
        }

        let device = match constraint {
            DeviceConstraint::Exact(id) => {
                if let Some(err) = state.device_failures.get(id) {
                    return Err(err.clone());
                }
                state
                    .devices
                    .iter()
                    .find(|d| d.is_video_input() && d.device_id == *id)
                    .cloned()
                    .ok_or_else(|| CaptureError::device_not_found(id.clone()))?
            }
            DeviceConstraint::Any => {
                if let Some(err) = &state.unconstrained_failure {
                    return Err(err.clone());
                }
                state
                    .devices
                    .iter()
                    .find(|d| d.is_video_input())
                    .cloned()
                    .ok_or_else(|| CaptureError::device_not_found("any"))?
            }
        };

        state.permission = PermissionState::Granted;
        Ok(device)
    }
}

/// Decrements the pending acquisition counter when the waiting future ends
/// or is dropped.
struct PendingAcquisition(Arc<MockCounters>);

impl PendingAcquisition {
    fn new(counters: Arc<MockCounters>) -> Self {
        counters.pending_acquisitions.fetch_add(1, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for PendingAcquisition {
    fn drop(&mut self) {
        self.0.pending_acquisitions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Track produced by the mock platform.
#[derive(Debug)]
struct MockTrack {
    id: String,
    label: String,
    live: AtomicBool,
    counters: Arc<MockCounters>,
}

impl MockTrack {
    fn new(device: &MediaDeviceInfo, counters: Arc<MockCounters>) -> Self {
        counters.live_tracks.fetch_add(1, Ordering::SeqCst);
        Self {
            id: format!("{}-video-{}", device.device_id, uuid::Uuid::new_v4()),
            label: device.label.clone(),
            live: AtomicBool::new(true),
            counters,
        }
    }
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.counters.live_tracks.fetch_sub(1, Ordering::SeqCst);
            trace!(track_id = %self.id, "Mock track stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// Mock camera platform for testing and development.
///
/// # Examples
///
/// ```
/// use camscan_hardware::mock::MockCameraPlatform;
/// use camscan_hardware::traits::CameraPlatform;
/// use camscan_hardware::types::DeviceConstraint;
///
/// #[tokio::main]
/// async fn main() -> camscan_hardware::Result<()> {
///     let (platform, handle) =
///         MockCameraPlatform::with_devices(&[("A", "Front Camera"), ("B", "Back Camera")]);
///
///     let stream = platform.acquire_stream(&DeviceConstraint::Exact("B".into())).await?;
///     assert_eq!(stream.device_id(), "B");
///     assert_eq!(handle.live_track_count(), 1);
///
///     stream.stop();
///     assert_eq!(handle.live_track_count(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCameraPlatform {
    name: String,
    shared: Shared,
}

impl MockCameraPlatform {
    /// Create a mock platform with no devices.
    ///
    /// Returns the platform and a handle that controls it.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_name("Mock Camera Platform")
    }

    /// Create a mock platform with a custom name and no devices.
    pub fn with_name(name: impl Into<String>) -> (Self, MockCameraHandle) {
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        let (gate, _) = watch::channel(true);

        let shared = Shared {
            state: Arc::new(Mutex::new(MockState {
                devices: Vec::new(),
                capability: Capability::Supported,
                permission: PermissionState::Prompt,
                hide_labels_until_granted: false,
                enumeration_error: None,
                device_failures: HashMap::new(),
                unconstrained_failure: None,
                decoder_failure: None,
                acquisitions: Vec::new(),
                decoders: Vec::new(),
            })),
            counters: Arc::new(MockCounters::default()),
            frames,
            gate: Arc::new(gate),
        };

        let platform = Self {
            name: name.into(),
            shared: shared.clone(),
        };

        (platform, MockCameraHandle { shared })
    }

    /// Create a mock platform with the given `(device_id, label)` cameras.
    pub fn with_devices(devices: &[(&str, &str)]) -> (Self, MockCameraHandle) {
        let (platform, handle) = Self::new();
        handle.set_devices(devices);
        (platform, handle)
    }
}

impl Default for MockCameraPlatform {
    fn default() -> Self {
        Self::new().0
    }
}

impl CameraPlatform for MockCameraPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.shared.lock().capability
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        let state = self.shared.lock();
        if let Some(err) = &state.enumeration_error {
            return Err(err.clone());
        }

        let hide = state.hide_labels_until_granted && state.permission != PermissionState::Granted;
        Ok(state
            .devices
            .iter()
            .cloned()
            .map(|mut device| {
                if hide {
                    device.label.clear();
                }
                device
            })
            .collect())
    }

    async fn acquire_stream(&self, constraint: &DeviceConstraint) -> Result<MediaStream> {
        self.shared.lock().acquisitions.push(constraint.clone());
        self.shared.wait_for_gate().await;

        let device = self.shared.resolve_acquisition(constraint)?;
        let track = MockTrack::new(&device, Arc::clone(&self.shared.counters));
        self.shared
            .counters
            .streams_opened
            .fetch_add(1, Ordering::SeqCst);

        debug!(device_id = %device.device_id, constraint = %constraint, "Mock stream acquired");
        Ok(MediaStream::new(device.device_id, vec![Box::new(track)]))
    }

    fn begin_decoding(
        &self,
        stream: &MediaStream,
        sink: mpsc::Sender<DecodeAttempt>,
    ) -> Result<DecodeSubscription> {
        if !stream.is_live() {
            return Err(CaptureError::unknown("Cannot decode a stopped stream"));
        }

        let token = CancellationToken::new();
        {
            let mut state = self.shared.lock();
            if let Some(err) = &state.decoder_failure {
                return Err(err.clone());
            }
            state.decoders.retain(|t| !t.is_cancelled());
            state.decoders.push(token.clone());
        }

        let frames = self.shared.frames.subscribe();
        let task = tokio::spawn(decode_loop(frames, sink, token.clone()));

        debug!(stream_id = %stream.id(), "Mock decode loop started");
        Ok(DecodeSubscription::new(token, Some(task)))
    }
}

/// Forward presented frames to the sink until cancelled.
async fn decode_loop(
    mut frames: broadcast::Receiver<DecodeAttempt>,
    sink: mpsc::Sender<DecodeAttempt>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            frame = frames.recv() => match frame {
                Ok(attempt) => {
                    if sink.send(attempt).await.is_err() {
                        break; // Receiver dropped
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Mock decode loop lagged behind presented frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    token.cancel();
}

/// Handle for controlling a mock camera platform.
///
/// Clones share the same platform state.
///
/// # Examples
///
/// ```
/// use camscan_hardware::CaptureError;
/// use camscan_hardware::mock::MockCameraPlatform;
///
/// let (_platform, handle) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
///
/// handle.fail_device("A", CaptureError::device_busy("A"));
/// handle.deny_permission();
/// assert_eq!(handle.live_track_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    shared: Shared,
}

impl MockCameraHandle {
    /// Replace the camera list with `(device_id, label)` pairs.
    pub fn set_devices(&self, devices: &[(&str, &str)]) {
        self.shared.lock().devices = devices
            .iter()
            .map(|(id, label)| MediaDeviceInfo::video_input(*id, *label))
            .collect();
    }

    /// Append a device record of any kind.
    pub fn add_device(&self, device: MediaDeviceInfo) {
        self.shared.lock().devices.push(device);
    }

    /// Set the capability probe result.
    pub fn set_capability(&self, capability: Capability) {
        self.shared.lock().capability = capability;
    }

    /// Refuse every future acquisition with a permission error.
    pub fn deny_permission(&self) {
        self.shared.lock().permission = PermissionState::Denied;
    }

    /// Grant permission without an acquisition.
    pub fn grant_permission(&self) {
        self.shared.lock().permission = PermissionState::Granted;
    }

    /// Get the current permission state.
    pub fn permission(&self) -> PermissionState {
        self.shared.lock().permission
    }

    /// Report empty labels until permission has been granted.
    pub fn hide_labels_until_granted(&self, hide: bool) {
        self.shared.lock().hide_labels_until_granted = hide;
    }

    /// Make acquisitions of a specific device fail.
    pub fn fail_device(&self, device_id: impl Into<String>, error: CaptureError) {
        self.shared
            .lock()
            .device_failures
            .insert(device_id.into(), error);
    }

    /// Stop failing acquisitions of a device.
    pub fn clear_device_failure(&self, device_id: &str) {
        self.shared.lock().device_failures.remove(device_id);
    }

    /// Make unconstrained acquisitions fail.
    pub fn fail_unconstrained(&self, error: CaptureError) {
        self.shared.lock().unconstrained_failure = Some(error);
    }

    /// Stop failing unconstrained acquisitions.
    pub fn clear_unconstrained_failure(&self) {
        self.shared.lock().unconstrained_failure = None;
    }

    /// Make device enumeration fail.
    pub fn fail_enumeration(&self, error: CaptureError) {
        self.shared.lock().enumeration_error = Some(error);
    }

    /// Make decoder attachment fail.
    pub fn fail_decoder(&self, error: CaptureError) {
        self.shared.lock().decoder_failure = Some(error);
    }

    /// Stop failing decoder attachment.
    pub fn clear_decoder_failure(&self) {
        self.shared.lock().decoder_failure = None;
    }

    /// Keep every acquisition pending until [`release_acquisitions`](Self::release_acquisitions).
    ///
    /// Simulates an unanswered permission prompt.
    pub fn hold_acquisitions(&self) {
        self.shared.gate.send_replace(false);
    }

    /// Let pending and future acquisitions proceed.
    pub fn release_acquisitions(&self) {
        self.shared.gate.send_replace(true);
    }

    /// Number of acquisitions currently waiting on the gate.
    pub fn pending_acquisitions(&self) -> usize {
        self.shared
            .counters
            .pending_acquisitions
            .load(Ordering::SeqCst)
    }

    /// Present a decodable code to every running decode loop.
    ///
    /// Returns the number of decode loops that saw the frame.
    pub fn present_code(&self, text: impl Into<String>) -> usize {
        self.present(DecodeAttempt::decoded(text))
    }

    /// Present the same code for several consecutive frames.
    pub fn present_code_frames(&self, text: &str, frames: usize) -> usize {
        (0..frames).map(|_| self.present_code(text)).sum()
    }

    /// Present a frame with no code in it.
    pub fn present_miss(&self) -> usize {
        self.present(DecodeAttempt::Miss)
    }

    /// Present a frame on which the decoder fails.
    pub fn present_decode_error(&self, message: impl Into<String>) -> usize {
        self.present(DecodeAttempt::failed(message))
    }

    /// Present an arbitrary decode attempt.
    pub fn present(&self, attempt: DecodeAttempt) -> usize {
        self.shared.frames.send(attempt).unwrap_or(0)
    }

    /// Constraints of every acquisition attempted so far, in order.
    pub fn acquisition_log(&self) -> Vec<DeviceConstraint> {
        self.shared.lock().acquisitions.clone()
    }

    /// Number of acquisitions attempted so far.
    pub fn acquisition_count(&self) -> usize {
        self.shared.lock().acquisitions.len()
    }

    /// Forget the acquisition log.
    pub fn clear_acquisition_log(&self) {
        self.shared.lock().acquisitions.clear();
    }

    /// Number of tracks that are still capturing.
    pub fn live_track_count(&self) -> usize {
        self.shared.counters.live_tracks.load(Ordering::SeqCst)
    }

    /// Number of decode loops that have not been cancelled.
    pub fn active_decoder_count(&self) -> usize {
        self.shared
            .lock()
            .decoders
            .iter()
            .filter(|t| !t.is_cancelled())
            .count()
    }

    /// Number of streams successfully opened since creation.
    pub fn streams_opened(&self) -> usize {
        self.shared.counters.streams_opened.load(Ordering::SeqCst)
    }
}
