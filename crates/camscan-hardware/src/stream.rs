//! Live stream and decode loop handles.
//!
//! A [`MediaStream`] owns the tracks of one acquired camera stream. A
//! [`DecodeSubscription`] owns one running decode loop. Both expose an
//! explicit release method ([`MediaStream::stop`],
//! [`DecodeSubscription::cancel`]); releasing hardware is always an explicit
//! call, and the `Drop` impls only exist to catch and report leaks.

use std::fmt;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Outcome of one pass of the decoder over a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeAttempt {
    /// No code in this frame. By far the most common outcome.
    Miss,

    /// A code was read. The text is untrimmed.
    Decoded(String),

    /// The decoder or platform failed on this frame.
    Failed(String),
}

impl DecodeAttempt {
    /// Create a successful decode attempt.
    pub fn decoded(text: impl Into<String>) -> Self {
        Self::Decoded(text.into())
    }

    /// Create a failed decode attempt.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Check if this attempt found nothing.
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// One track of a live camera stream.
///
/// Implementations release the underlying hardware in [`stop`](Self::stop).
/// `stop` must be idempotent and must not block on I/O.
pub trait MediaTrack: Send + Sync + fmt::Debug {
    /// Track identifier.
    fn id(&self) -> &str;

    /// Track label (usually the device label).
    fn label(&self) -> &str;

    /// Stop the track and release the hardware behind it.
    fn stop(&self);

    /// Check if the track is still capturing.
    fn is_live(&self) -> bool;
}

/// An acquired camera stream bound to one device.
#[derive(Debug)]
pub struct MediaStream {
    /// Stream identifier.
    id: String,

    /// Device the platform bound the stream to.
    device_id: String,

    /// Tracks owned by this stream.
    tracks: Vec<Box<dyn MediaTrack>>,
}

impl MediaStream {
    /// Create a stream from its tracks.
    pub fn new(device_id: impl Into<String>, tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            tracks,
        }
    }

    /// Get the stream identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the device this stream is bound to.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Get the tracks of this stream.
    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    /// Count tracks that are still capturing.
    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    /// Check if any track is still capturing.
    pub fn is_live(&self) -> bool {
        self.live_track_count() > 0
    }

    /// Stop every track. Returns how many tracks were live.
    ///
    /// Calling this on an already stopped stream is a no-op.
    pub fn stop(&self) -> usize {
        let mut stopped = 0;
        for track in &self.tracks {
            if track.is_live() {
                track.stop();
                stopped += 1;
            }
        }
        stopped
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        let leaked = self.stop();
        if leaked > 0 {
            warn!(
                stream_id = %self.id,
                device_id = %self.device_id,
                tracks = leaked,
                "Media stream dropped with live tracks"
            );
        }
    }
}

/// Handle to a running decode loop.
///
/// Returned by [`CameraPlatform::begin_decoding`](crate::traits::CameraPlatform::begin_decoding).
/// Cancelling it is the only sanctioned way to end the loop.
#[derive(Debug)]
pub struct DecodeSubscription {
    /// Cancellation token observed by the decode loop.
    token: CancellationToken,

    /// Task driving the loop, if the platform runs one.
    task: Option<JoinHandle<()>>,
}

impl DecodeSubscription {
    /// Create a subscription from the loop's token and task.
    pub fn new(token: CancellationToken, task: Option<JoinHandle<()>>) -> Self {
        Self { token, task }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the decode loop. Idempotent.
    pub fn cancel(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Check if the loop has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for DecodeSubscription {
    fn drop(&mut self) {
        if !self.is_cancelled() {
            warn!("Decode subscription dropped while active");
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CountingTrack {
        live: AtomicBool,
        stops: Arc<AtomicUsize>,
    }

    impl CountingTrack {
        fn boxed(stops: &Arc<AtomicUsize>) -> Box<dyn MediaTrack> {
            Box::new(Self {
                live: AtomicBool::new(true),
                stops: Arc::clone(stops),
            })
        }
    }

    impl MediaTrack for CountingTrack {
        fn id(&self) -> &str {
            "track"
        }

        fn label(&self) -> &str {
            "Counting Track"
        }

        fn stop(&self) {
            if self.live.swap(false, Ordering::SeqCst) {
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_stream_stop_is_idempotent() {
        let stops = Arc::new(AtomicUsize::new(0));
        let stream = MediaStream::new(
            "cam-1",
            vec![CountingTrack::boxed(&stops), CountingTrack::boxed(&stops)],
        );

        assert_eq!(stream.live_track_count(), 2);
        assert_eq!(stream.stop(), 2);
        assert_eq!(stream.stop(), 0);
        assert!(!stream.is_live());
        assert_eq!(stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stream_drop_stops_leaked_tracks() {
        let stops = Arc::new(AtomicUsize::new(0));
        {
            let _stream = MediaStream::new("cam-1", vec![CountingTrack::boxed(&stops)]);
        }
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stream_ids_unique() {
        let a = MediaStream::new("cam-1", Vec::new());
        let b = MediaStream::new("cam-1", Vec::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.device_id(), "cam-1");
    }

    #[tokio::test]
    async fn test_subscription_cancel() {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            loop_token.cancelled().await;
        });

        let mut subscription = DecodeSubscription::new(token, Some(task));
        assert!(!subscription.is_cancelled());

        subscription.cancel();
        assert!(subscription.is_cancelled());

        // Second cancel is a no-op
        subscription.cancel();
    }

    #[test]
    fn test_decode_attempt_helpers() {
        assert!(DecodeAttempt::Miss.is_miss());
        assert_eq!(
            DecodeAttempt::decoded("SN1"),
            DecodeAttempt::Decoded("SN1".to_string())
        );
        assert!(!DecodeAttempt::failed("boom").is_miss());
    }
}
