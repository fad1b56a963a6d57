//! Keyboard capture for the host application.
//!
//! The production source reads key events from the controlling terminal on a
//! dedicated thread (crossterm's event reader blocks) and forwards them as
//! [`HostKey`]s through a tokio channel to the async dispatch loop.
//!
//! # Focus
//!
//! Keys are only forwarded while the terminal has focus.  Terminals that
//! support focus reporting tell us when the window is left and re-entered;
//! the [`FocusGate`] records that and the capture thread drops key events
//! while it is closed.  Terminals without focus reporting never close it.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows tests to inject synthetic keys through
//! [`mock::MockInputSource`] without a terminal.

use std::sync::atomic::{AtomicBool, Ordering};

use c64kb_core::HostKey;
use tokio::sync::mpsc::UnboundedReceiver;

pub mod mock;
pub mod terminal;

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("capture has already been started")]
    AlreadyStarted,
}

/// Trait abstracting key event production.
pub trait InputSource: Send + Sync {
    /// Starts the source and returns the receiving end of the key stream.
    ///
    /// The stream closes when the source stops or the operator quits.
    fn start(&self) -> Result<UnboundedReceiver<HostKey>, CaptureError>;

    /// Asks the source to stop producing keys.
    fn stop(&self);
}

/// Whether the terminal window currently has focus.
#[derive(Debug)]
pub struct FocusGate {
    focused: AtomicBool,
}

impl FocusGate {
    /// A gate that starts open.  The operator launched us from this window.
    pub fn new() -> Self {
        Self {
            focused: AtomicBool::new(true),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::Relaxed);
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Relaxed)
    }
}

impl Default for FocusGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_gate_starts_open() {
        assert!(FocusGate::new().is_focused());
    }

    #[test]
    fn test_focus_gate_follows_focus_changes() {
        let gate = FocusGate::new();

        gate.set_focused(false);
        assert!(!gate.is_focused());

        gate.set_focused(true);
        assert!(gate.is_focused());
    }
}
