//! Camera-based serial scanning component.
//!
//! A [`Scanner`] discovers the cameras a platform exposes, acquires a live
//! stream from the most suitable one, feeds every decoded frame through a
//! deduplicating pipeline, and hands each new value to a [`ScanConsumer`]
//! exactly once. It then shows a short confirmation and releases the camera.
//!
//! # Components
//!
//! - [`DeviceInventory`]: camera discovery and the back-camera heuristic.
//! - [`CaptureSession`]: owns the live stream and decode loop, with a single
//!   synchronous release routine shared by every exit path.
//! - [`ScanResultPipeline`]: trimming, duplicate suppression and cooldown.
//! - [`StateMachine`]: the scanner state with history and a `watch`
//!   channel for observers.
//! - [`NotificationSink`]: tones and user notifications.
//!
//! # State Flow
//!
//! ```text
//! Idle → Requesting → Scanning → Processing → Success → Idle
//!             ↘           ↘            ↘
//!              Error ──────────────────────→ Idle
//! ```
//!
//! `stop_scanning()` returns to `Idle` from any state and releases every
//! track and decoder. Dropping a [`Scanner`] does the same.

pub mod consumer;
pub mod error;
pub mod feedback;
pub mod inventory;
pub mod pipeline;
pub mod scanner;
pub mod session;
pub mod state_machine;

pub use consumer::{ChannelConsumer, ScanConsumer};
pub use error::{Result, ScanError};
pub use feedback::{Notification, NotificationSink, RecordingNotifier, Tone, TracingNotifier};
pub use inventory::DeviceInventory;
pub use pipeline::{LastAcceptedValue, PipelineStats, ScanResultPipeline, Verdict};
pub use scanner::{Scanner, ScannerBuilder, StartOutcome, SwitchOutcome};
pub use session::{CaptureSession, acquire_with_fallback};
pub use state_machine::{StateMachine, StateTransition};
