//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`HostKey`]s without a terminal.

use std::sync::{Arc, Mutex};

use c64kb_core::HostKey;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{CaptureError, InputSource};

/// A mock implementation of [`InputSource`] that allows tests to inject keys.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<HostKey>>>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Injects a synthetic key press, as if typed by the operator.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_key(&self, key: HostKey) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(key)
                .expect("receiver has been dropped; call start() first"),
            None => panic!("MockInputSource::inject_key called before start()"),
        }
    }

    /// Injects every character of `text` as a key press.
    pub fn type_text(&self, text: &str) {
        for c in text.chars() {
            self.inject_key(HostKey::from(c));
        }
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<UnboundedReceiver<HostKey>, CaptureError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_input_source_starts_and_receives_keys() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.inject_key(HostKey::F12);

        // Assert
        assert_eq!(rx.recv().await, Some(HostKey::F12));
    }

    #[tokio::test]
    async fn test_mock_input_source_stop_closes_channel() {
        // Arrange
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert – channel should be closed after stop()
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_type_text_maps_newline_to_enter() {
        let source = MockInputSource::new();
        let mut rx = source.start().expect("start should succeed");

        source.type_text("a \n");

        assert_eq!(rx.recv().await, Some(HostKey::Char('a')));
        assert_eq!(rx.recv().await, Some(HostKey::Space));
        assert_eq!(rx.recv().await, Some(HostKey::Enter));
    }
}
