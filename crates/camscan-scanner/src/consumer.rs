//! Decode callback consumer.
//!
//! A [`ScanConsumer`] receives each accepted value exactly once. Closures
//! taking `&str` implement the trait, and [`ChannelConsumer`] forwards values
//! into a Tokio channel for async callers.

use tokio::sync::mpsc;
use tracing::warn;

/// Receives accepted scan values.
///
/// Called synchronously from the scanner, outside its internal lock.
pub trait ScanConsumer: Send + Sync {
    /// Handle one accepted, trimmed value.
    fn on_scan_accepted(&self, value: &str);
}

impl<F> ScanConsumer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_scan_accepted(&self, value: &str) {
        self(value)
    }
}

/// Consumer that forwards accepted values into an unbounded channel.
///
/// # Examples
///
/// ```
/// use camscan_scanner::{ChannelConsumer, ScanConsumer};
///
/// let (consumer, mut values) = ChannelConsumer::new();
/// consumer.on_scan_accepted("SN12345");
///
/// assert_eq!(values.try_recv().unwrap(), "SN12345");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiver of its values.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScanConsumer for ChannelConsumer {
    fn on_scan_accepted(&self, value: &str) {
        if self.tx.send(value.to_string()).is_err() {
            warn!(value, "Scan consumer receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_consumer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let consumer = move |value: &str| sink.lock().unwrap().push(value.to_string());

        consumer.on_scan_accepted("SN1");
        consumer.on_scan_accepted("SN2");

        assert_eq!(*seen.lock().unwrap(), vec!["SN1", "SN2"]);
    }

    #[test]
    fn test_channel_consumer_dropped_receiver() {
        let (consumer, values) = ChannelConsumer::new();
        drop(values);

        // Must not panic
        consumer.on_scan_accepted("SN1");
    }
}
