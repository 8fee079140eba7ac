//! Enum wrapper for camera platform dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the scanner cannot hold
//! a `Box<dyn CameraPlatform>`. [`AnyCameraPlatform`] gives it one concrete
//! type to hold while still dispatching to whichever backend was configured.
//!
//! # Examples
//!
//! ```
//! use camscan_hardware::devices::AnyCameraPlatform;
//! use camscan_hardware::mock::MockCameraPlatform;
//! use camscan_hardware::traits::CameraPlatform;
//!
//! let (platform, _handle) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
//! let any_platform = AnyCameraPlatform::from(platform);
//!
//! assert!(any_platform.capability().is_supported());
//! ```

use tokio::sync::mpsc;

use crate::Result;
use crate::mock::MockCameraPlatform;
use crate::stream::{DecodeAttempt, DecodeSubscription, MediaStream};
use crate::traits::CameraPlatform;
use crate::types::{Capability, DeviceConstraint, MediaDeviceInfo};

/// Enum wrapper for camera platform dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyCameraPlatform {
    /// Mock platform for development and testing.
    Mock(MockCameraPlatform),
}

impl From<MockCameraPlatform> for AnyCameraPlatform {
    fn from(platform: MockCameraPlatform) -> Self {
        Self::Mock(platform)
    }
}

impl CameraPlatform for AnyCameraPlatform {
    fn name(&self) -> &str {
        match self {
            Self::Mock(platform) => platform.name(),
        }
    }

    fn capability(&self) -> Capability {
        match self {
            Self::Mock(platform) => platform.capability(),
        }
    }

    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>> {
        match self {
            Self::Mock(platform) => platform.enumerate_devices().await,
        }
    }

    async fn acquire_stream(&self, constraint: &DeviceConstraint) -> Result<MediaStream> {
        match self {
            Self::Mock(platform) => platform.acquire_stream(constraint).await,
        }
    }

    fn begin_decoding(
        &self,
        stream: &MediaStream,
        sink: mpsc::Sender<DecodeAttempt>,
    ) -> Result<DecodeSubscription> {
        match self {
            Self::Mock(platform) => platform.begin_decoding(stream, sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_platform_dispatch() {
        let (platform, handle) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
        let platform = AnyCameraPlatform::from(platform);

        assert_eq!(platform.name(), "Mock Camera Platform");
        assert_eq!(platform.enumerate_devices().await.unwrap().len(), 1);

        let stream = platform.acquire_stream(&DeviceConstraint::Any).await.unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let mut subscription = platform.begin_decoding(&stream, tx).unwrap();

        handle.present_code("SN42");
        assert_eq!(rx.recv().await, Some(DecodeAttempt::decoded("SN42")));

        subscription.cancel();
        stream.stop();
        assert_eq!(handle.live_track_count(), 0);
    }
}
