//! Camera platform abstraction layer for the camscan serial scanner.
//!
//! This crate defines what the scanner needs from a host camera stack:
//! enumerating devices, acquiring a live stream bound to one device, and
//! running a black-box decoder over that stream. The scanner only talks to
//! the [`CameraPlatform`] trait, so real backends and the mock used in tests
//! are interchangeable.
//!
//! # Design Philosophy
//!
//! - **Async-first**: acquisition and enumeration are native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT). Acquisition may suspend for
//!   as long as a permission prompt stays open.
//! - **Explicit release**: [`MediaStream::stop`] and
//!   [`DecodeSubscription::cancel`] are the only sanctioned ways to release
//!   hardware. Their `Drop` impls report leaks with a warning.
//! - **Thread-safe**: platforms are `Send + Sync` for use with Tokio.
//! - **Mapped errors**: platform failures are normalized to a small
//!   [`CaptureError`] taxonomy via [`CaptureError::from_platform`].
//!
//! # Acquiring a Stream
//!
//! ```no_run
//! use camscan_hardware::traits::CameraPlatform;
//! use camscan_hardware::types::DeviceConstraint;
//! use camscan_hardware::{DecodeAttempt, Result};
//! use tokio::sync::mpsc;
//!
//! async fn first_code<P: CameraPlatform>(platform: &P) -> Result<Option<String>> {
//!     let stream = platform.acquire_stream(&DeviceConstraint::Any).await?;
//!     let (tx, mut rx) = mpsc::channel(16);
//!     let mut subscription = platform.begin_decoding(&stream, tx)?;
//!
//!     let mut code = None;
//!     while let Some(attempt) = rx.recv().await {
//!         if let DecodeAttempt::Decoded(text) = attempt {
//!             code = Some(text);
//!             break;
//!         }
//!     }
//!
//!     subscription.cancel();
//!     stream.stop();
//!     Ok(code)
//! }
//! ```
//!
//! # Mock Platform
//!
//! [`mock::MockCameraPlatform`] simulates devices, permission prompts,
//! hidden labels, busy cameras and decoded frames. Its handle reports live
//! track and decoder counts so tests can assert that nothing leaks.

pub mod devices;
pub mod error;
pub mod mock;
pub mod stream;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyCameraPlatform;
pub use error::{CaptureError, ErrorReason, Result};
pub use stream::{DecodeAttempt, DecodeSubscription, MediaStream, MediaTrack};
pub use traits::CameraPlatform;
pub use types::{
    CameraFacing, Capability, DeviceConstraint, DeviceDescriptor, MediaDeviceInfo, MediaDeviceKind,
};
