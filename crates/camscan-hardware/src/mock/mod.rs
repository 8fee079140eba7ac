//! Mock platform implementations for testing and development.
//!
//! This module provides a simulated camera platform that can be controlled
//! programmatically without requiring a physical camera.

pub mod camera;

pub use camera::{MockCameraHandle, MockCameraPlatform, PermissionState};
