//! The link to the peripheral, as seen by the use cases.
//!
//! Every exchange is one synchronous round trip: write a frame, then read the
//! characteristic back.  The value read is the peripheral's acknowledgment.
//! It is logged but never interpreted; there is no retry and no pipelining.

use async_trait::async_trait;
use c64kb_core::protocol::{encode, frame_to_hex, Command};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Errors raised by a [`FrameTransport`].
///
/// All of them are fatal for the session: the protocol has no resynchronisation
/// step, so a failed round trip leaves the peripheral in an unknown state.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter available")]
    NoAdapter,

    #[error("invalid peripheral address {0:?}")]
    InvalidAddress(String),

    #[error("peripheral {0} not found while scanning")]
    PeripheralNotFound(String),

    #[error("characteristic {0} not found on peripheral")]
    CharacteristicNotFound(Uuid),

    /// Any failure reported by the underlying Bluetooth stack.
    #[error("link failure: {0}")]
    Link(String),
}

/// One write/read endpoint on the peripheral.
///
/// The production implementation talks GATT over Bluetooth LE; the dry-run
/// implementation logs frames; tests use a recording double.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    /// Writes `frame` (with response) and returns the value read back.
    async fn round_trip(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Encodes `command`, performs one round trip and returns the acknowledgment.
///
/// # Errors
///
/// Propagates the transport's [`TransportError`] unchanged.
pub async fn send_command(
    transport: &dyn FrameTransport,
    command: &Command,
) -> Result<Vec<u8>, TransportError> {
    let frame = encode(command);
    debug!(frame = %frame_to_hex(&frame), "write");
    let ack = transport.round_trip(&frame).await?;
    debug!(ack = %frame_to_hex(&ack), "read");
    Ok(ack)
}
