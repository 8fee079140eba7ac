//! Device inventory.
//!
//! Discovers the cameras a platform exposes and picks the one most likely to
//! be useful for scanning a printed serial: the back-facing camera.

use camscan_hardware::traits::CameraPlatform;
use camscan_hardware::types::{CameraFacing, DeviceDescriptor};
use tracing::{debug, warn};

/// Ordered list of selectable cameras.
///
/// Order is the platform's enumeration order. The list is replaced wholesale
/// on every enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInventory {
    devices: Vec<DeviceDescriptor>,
}

impl DeviceInventory {
    /// Build an inventory from descriptors, keeping their order.
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self { devices }
    }

    /// Enumerate the video inputs of a platform.
    ///
    /// Enumeration failures are logged and yield an empty inventory. An
    /// empty inventory is not an error: acquisition then falls back to
    /// whatever device the platform picks.
    pub async fn enumerate<P: CameraPlatform>(platform: &P) -> Self {
        match platform.enumerate_devices().await {
            Ok(devices) => {
                let inventory = Self::new(
                    devices
                        .iter()
                        .filter(|d| d.is_video_input())
                        .map(DeviceDescriptor::from)
                        .collect(),
                );
                debug!(
                    platform = platform.name(),
                    devices = inventory.len(),
                    "Enumerated camera devices"
                );
                inventory
            }
            Err(e) => {
                warn!(platform = platform.name(), error = %e, "Camera enumeration failed");
                Self::default()
            }
        }
    }

    /// Pick the default device.
    ///
    /// 1. The first device whose label looks back-facing.
    /// 2. Otherwise the first device whose label does not look front-facing
    ///    (empty labels count as not front-facing).
    /// 3. Otherwise the last device.
    ///
    /// Returns `None` only for an empty inventory.
    ///
    /// # Examples
    ///
    /// ```
    /// use camscan_hardware::DeviceDescriptor;
    /// use camscan_scanner::DeviceInventory;
    ///
    /// let inventory = DeviceInventory::new(vec![
    ///     DeviceDescriptor::new("A", "Front Camera"),
    ///     DeviceDescriptor::new("B", "Back Camera"),
    /// ]);
    /// assert_eq!(inventory.default_device().unwrap().device_id, "B");
    /// ```
    pub fn default_device(&self) -> Option<&DeviceDescriptor> {
        self.devices
            .iter()
            .find(|d| d.facing() == CameraFacing::Back)
            .or_else(|| {
                self.devices
                    .iter()
                    .find(|d| d.facing() != CameraFacing::Front)
            })
            .or_else(|| self.devices.last())
    }

    /// Get the device after `device_id` in enumeration order, wrapping.
    ///
    /// An unknown id yields the first device.
    pub fn next_after(&self, device_id: &str) -> Option<&DeviceDescriptor> {
        if self.devices.is_empty() {
            return None;
        }

        let next = self
            .devices
            .iter()
            .position(|d| d.device_id == device_id)
            .map_or(0, |i| (i + 1) % self.devices.len());
        self.devices.get(next)
    }

    /// Look up a device by id.
    pub fn get(&self, device_id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    /// Check if a device id is known.
    pub fn contains(&self, device_id: &str) -> bool {
        self.get(device_id).is_some()
    }

    /// Check if any device still has an empty label.
    ///
    /// Labels are commonly hidden until the first permission grant.
    pub fn needs_labels(&self) -> bool {
        self.devices.iter().any(|d| !d.has_label())
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if no device is known.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Get every device, in enumeration order.
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camscan_hardware::CaptureError;
    use camscan_hardware::mock::MockCameraPlatform;
    use camscan_hardware::types::MediaDeviceInfo;
    use rstest::rstest;

    fn inventory(labels: &[&str]) -> DeviceInventory {
        DeviceInventory::new(
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| DeviceDescriptor::new(format!("cam-{i}"), *label))
                .collect(),
        )
    }

    #[rstest]
    #[case(&["Front Camera", "Back Camera"], "cam-1")]
    #[case(&["Back Camera", "Rear Wide"], "cam-0")]
    #[case(&["camera2 1, facing front", "camera2 0, facing back"], "cam-1")]
    #[case(&["Front Camera", "HD Webcam"], "cam-1")]
    #[case(&["Front Camera", ""], "cam-1")]
    #[case(&["Front Camera", "User Facing"], "cam-1")]
    #[case(&["HD Webcam"], "cam-0")]
    #[case(&["", ""], "cam-0")]
    fn test_default_device(#[case] labels: &[&str], #[case] expected: &str) {
        assert_eq!(
            inventory(labels).default_device().unwrap().device_id,
            expected
        );
    }

    #[test]
    fn test_default_device_empty() {
        assert!(DeviceInventory::default().default_device().is_none());
    }

    #[test]
    fn test_next_after_wraps() {
        let inventory = inventory(&["a", "b", "c"]);

        assert_eq!(inventory.next_after("cam-0").unwrap().device_id, "cam-1");
        assert_eq!(inventory.next_after("cam-2").unwrap().device_id, "cam-0");
        assert_eq!(inventory.next_after("missing").unwrap().device_id, "cam-0");
        assert!(DeviceInventory::default().next_after("cam-0").is_none());
    }

    #[test]
    fn test_lookup_helpers() {
        let inventory = inventory(&["Back Camera", ""]);

        assert!(inventory.contains("cam-1"));
        assert!(!inventory.contains("cam-9"));
        assert_eq!(inventory.get("cam-0").unwrap().label, "Back Camera");
        assert!(inventory.needs_labels());
        assert_eq!(inventory.len(), 2);
        assert!(!inventory.is_empty());
    }

    #[tokio::test]
    async fn test_enumerate_filters_video_inputs() {
        let (platform, handle) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
        handle.add_device(MediaDeviceInfo::audio_input("mic", "Microphone"));

        let inventory = DeviceInventory::enumerate(&platform).await;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.devices()[0].device_id, "A");
    }

    #[tokio::test]
    async fn test_enumerate_failure_is_empty() {
        let (platform, handle) = MockCameraPlatform::with_devices(&[("A", "Back Camera")]);
        handle.fail_enumeration(CaptureError::unknown("enumeration refused"));

        let inventory = DeviceInventory::enumerate(&platform).await;
        assert!(inventory.is_empty());
    }
}
