//! Capture session.
//!
//! A [`CaptureSession`] owns at most one binding: a live [`MediaStream`],
//! the [`DecodeSubscription`] running over it, and the task pumping decode
//! attempts to the scanner. Releasing a binding is synchronous and never
//! fails, so every exit path can share it.

use camscan_hardware::traits::CameraPlatform;
use camscan_hardware::types::DeviceConstraint;
use camscan_hardware::{CaptureError, DecodeSubscription, MediaStream};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Acquire a stream, retrying once unconstrained when allowed.
///
/// The retry only happens when a device was named, `allow_fallback` is set
/// and the error is one an unconstrained request could get past
/// ([`CaptureError::allows_unconstrained_retry`]).
pub async fn acquire_with_fallback<P: CameraPlatform>(
    platform: &P,
    device_id: Option<&str>,
    allow_fallback: bool,
) -> Result<MediaStream, CaptureError> {
    let constraint = DeviceConstraint::from_device(device_id);

    match platform.acquire_stream(&constraint).await {
        Ok(stream) => Ok(stream),
        Err(e) if allow_fallback && constraint.is_exact() && e.allows_unconstrained_retry() => {
            warn!(
                device_id = %constraint,
                error = %e,
                "Preferred camera unavailable, retrying with any camera"
            );
            platform.acquire_stream(&DeviceConstraint::Any).await
        }
        Err(e) => Err(e),
    }
}

/// One live stream with its decode loop.
#[derive(Debug)]
struct Binding {
    id: u64,
    stream: MediaStream,
    subscription: DecodeSubscription,
    pump: Option<JoinHandle<()>>,
}

impl Binding {
    fn release(mut self) -> usize {
        self.subscription.cancel();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.stream.stop()
    }
}

/// Owner of the current binding.
#[derive(Debug, Default)]
pub struct CaptureSession {
    binding: Option<Binding>,
    next_binding_id: u64,
}

impl CaptureSession {
    /// Create a session with nothing bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a stream and its decode subscription.
    ///
    /// Any previous binding is released first. Returns the new binding id.
    pub fn attach(&mut self, stream: MediaStream, subscription: DecodeSubscription) -> u64 {
        self.release();

        self.next_binding_id += 1;
        let id = self.next_binding_id;
        debug!(binding_id = id, device_id = %stream.device_id(), "Capture bound");

        self.binding = Some(Binding {
            id,
            stream,
            subscription,
            pump: None,
        });
        id
    }

    /// Attach the pump task of the current binding.
    ///
    /// Aborts the task if nothing is bound.
    pub fn set_pump(&mut self, pump: JoinHandle<()>) {
        match self.binding.as_mut() {
            Some(binding) => binding.pump = Some(pump),
            None => pump.abort(),
        }
    }

    /// Release the current binding, if any.
    ///
    /// Cancels the decode loop, then stops every track. Returns the id of the
    /// released device. Idempotent.
    pub fn release(&mut self) -> Option<String> {
        let binding = self.binding.take()?;
        let id = binding.id;
        let device_id = binding.stream.device_id().to_string();
        let stopped = binding.release();

        info!(binding_id = id, device_id = %device_id, tracks = stopped, "Capture released");
        Some(device_id)
    }

    /// Check if a stream is bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Check if `binding_id` is the current binding.
    pub fn is_current(&self, binding_id: u64) -> bool {
        self.binding.as_ref().is_some_and(|b| b.id == binding_id)
    }

    /// Get the id of the current binding.
    pub fn binding_id(&self) -> Option<u64> {
        self.binding.as_ref().map(|b| b.id)
    }

    /// Get the device of the current binding.
    pub fn device_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.stream.device_id())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}
