//! Program upload: loads an image and pushes it to C64 memory chunk by chunk.
//!
//! The chunk plan comes from [`c64kb_core::protocol::transfer`]; this module
//! drives it against a [`FrameTransport`].  Each chunk is one round trip, and
//! the upload ends with the finalize frame, which makes the peripheral fix up
//! the BASIC pointers so the program can be `RUN`.
//!
//! A failed round trip aborts the upload where it stands.  Nothing is
//! retried and nothing is rolled back; the operator repeats the whole upload.

use std::path::PathBuf;

use c64kb_core::protocol::{frame_to_hex, Command, TransferError, TransferJob};
use thiserror::Error;
use tracing::info;

use super::link::{send_command, FrameTransport, TransportError};

/// Errors from resolving and reading a program file.
#[derive(Debug, Error)]
pub enum ProgramLoadError {
    /// The name was empty after trimming whitespace and control characters.
    #[error("no file name given")]
    EmptyName,

    #[error("file '{}' not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("error reading file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of program images, keyed by the name the operator typed.
pub trait ProgramLoader: Send + Sync {
    /// Reads the whole image for `name`.
    fn load(&self, name: &str) -> Result<Vec<u8>, ProgramLoadError>;
}

/// Errors from a program upload.
#[derive(Debug, Error)]
pub enum SendProgramError {
    /// The image was rejected before anything was sent.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A round trip failed part-way through the upload.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Summary of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub load_address: u16,
    /// Address one past the last byte written.
    pub end_address: u32,
    pub bytes: usize,
    pub chunks: usize,
    /// Value read back after the finalize frame.
    pub final_ack: Vec<u8>,
}

/// Uploads `image` (load address + body) to the peripheral.
///
/// # Errors
///
/// - [`SendProgramError::Transfer`] when the image is too short or does not
///   fit in memory.  Nothing has been sent in that case.
/// - [`SendProgramError::Transport`] when a round trip fails.
pub async fn send_program(
    transport: &dyn FrameTransport,
    image: &[u8],
) -> Result<TransferReport, SendProgramError> {
    let job = TransferJob::new(image)?;
    let load_address = job.load_address();
    let bytes = job.total_bytes();
    let chunks = job.chunk_count();

    info!(
        "sending {bytes} bytes to 0x{load_address:04X} in {chunks} chunk(s)"
    );

    for (index, chunk) in job.enumerate() {
        let ack = send_command(transport, &chunk.to_command()).await?;
        info!(
            "chunk {}/{chunks} at 0x{:04X} ({} bytes), return value: {}",
            index + 1,
            chunk.address,
            chunk.data.len(),
            frame_to_hex(&ack)
        );
    }

    let final_ack = send_command(transport, &Command::Finalize).await?;
    info!("return value from finalize: {}", frame_to_hex(&final_ack));

    Ok(TransferReport {
        load_address,
        end_address: u32::from(load_address) + bytes as u32,
        bytes,
        chunks,
        final_ack,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Records every frame and fails on the `fail_at`-th round trip (0-based).
    #[derive(Default)]
    struct RecordingTransport {
        frames: Mutex<Vec<Vec<u8>>>,
        fail_at: Option<usize>,
    }

    #[async_trait]
    impl FrameTransport for RecordingTransport {
        async fn round_trip(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
            let mut frames = self.frames.lock().unwrap();
            if self.fail_at == Some(frames.len()) {
                return Err(TransportError::Link("injected failure".to_string()));
            }
            frames.push(frame.to_vec());
            Ok(vec![0x00])
        }
    }

    fn image(load_address: u16, body_len: usize) -> Vec<u8> {
        let mut v = load_address.to_le_bytes().to_vec();
        v.extend((0..body_len).map(|i| i as u8));
        v
    }

    #[tokio::test]
    async fn test_send_program_writes_chunks_then_finalize() {
        // Arrange
        let transport = RecordingTransport::default();
        let data = image(0x0801, 300);

        // Act
        let report = send_program(&transport, &data).await.unwrap();

        // Assert
        let frames = transport.frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0][..6], &[0x0C, 0x00, 0x80, 248, 0x01, 0x08]);
        assert_eq!(&frames[1][..3], &[52, 0xF9, 0x08]);
        assert_eq!(frames[2], vec![0xFF]);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.bytes, 300);
        assert_eq!(report.end_address, 0x0801 + 300);
    }

    #[tokio::test]
    async fn test_send_program_rejects_short_image_without_sending() {
        let transport = RecordingTransport::default();

        let result = send_program(&transport, &[0x01, 0x08]).await;

        assert!(matches!(
            result,
            Err(SendProgramError::Transfer(TransferError::InsufficientData { .. }))
        ));
        assert!(transport.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_program_stops_at_first_transport_failure() {
        // Arrange – second chunk fails
        let transport = RecordingTransport {
            fail_at: Some(1),
            ..Default::default()
        };
        let data = image(0x0801, 600);

        // Act
        let result = send_program(&transport, &data).await;

        // Assert – no retry, no finalize
        assert!(matches!(result, Err(SendProgramError::Transport(_))));
        let frames = transport.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0][0], 0x0C);
    }

    #[tokio::test]
    async fn test_send_program_failure_on_finalize_is_reported() {
        let transport = RecordingTransport {
            fail_at: Some(1),
            ..Default::default()
        };

        let result = send_program(&transport, &image(0xC000, 10)).await;

        assert!(matches!(result, Err(SendProgramError::Transport(_))));
    }
}
