//! Camera platform trait definition.
//!
//! [`CameraPlatform`] is the contract between the scanner and whatever
//! exposes cameras on the host: device inventory, stream acquisition and the
//! black-box decoder that turns frames into [`DecodeAttempt`]s.
//!
//! The trait uses native `async fn` methods (Rust 1.90 + Edition 2024
//! RPITIT), so it is not object-safe. Use the enum wrapper in
//! [`devices`](crate::devices) for dispatch.

#![allow(async_fn_in_trait)]

use tokio::sync::mpsc;

use crate::error::Result;
use crate::stream::{DecodeAttempt, DecodeSubscription, MediaStream};
use crate::types::{Capability, DeviceConstraint, MediaDeviceInfo};

/// Camera platform abstraction.
///
/// # Examples
///
/// ```no_run
/// use camscan_hardware::traits::CameraPlatform;
/// use camscan_hardware::types::DeviceConstraint;
/// use camscan_hardware::error::Result;
///
/// async fn open_first_camera<P: CameraPlatform>(platform: &P) -> Result<String> {
///     let stream = platform.acquire_stream(&DeviceConstraint::Any).await?;
///     let device = stream.device_id().to_string();
///     stream.stop();
///     Ok(device)
/// }
/// ```
pub trait CameraPlatform: Send + Sync {
    /// Platform name, for diagnostics.
    fn name(&self) -> &str;

    /// Check whether a camera API is available.
    ///
    /// This is synchronous so callers can hide the scan affordance before
    /// any UI is shown.
    fn capability(&self) -> Capability;

    /// List every media device the platform knows about.
    ///
    /// Labels may be empty until the first permission grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to enumerate. Callers treat
    /// this as "no devices known yet", not as a session failure.
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>>;

    /// Acquire a live stream bound to a device.
    ///
    /// May suspend for an unbounded time while a permission prompt is open.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`CaptureError`](crate::CaptureError) when the
    /// platform refuses or fails to open the device.
    async fn acquire_stream(&self, constraint: &DeviceConstraint) -> Result<MediaStream>;

    /// Start the decode loop over a stream.
    ///
    /// The platform pushes one [`DecodeAttempt`] per frame into `sink` until
    /// the returned subscription is cancelled or the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the decoder cannot be attached to the stream.
    fn begin_decoding(
        &self,
        stream: &MediaStream,
        sink: mpsc::Sender<DecodeAttempt>,
    ) -> Result<DecodeSubscription>;
}
