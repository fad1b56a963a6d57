//! Segmented transfer planning for program uploads.
//!
//! # How does a program reach the C64? (for beginners)
//!
//! A C64 program file (`.prg`) starts with a two-byte little-endian load
//! address followed by the bytes that belong at that address.  The BLE link
//! only accepts short writes, so the body is cut into chunks of at most
//! [`MAX_CHUNK_PAYLOAD`] bytes.  Each chunk carries its own target address,
//! which lets the peripheral copy it straight into memory:
//!
//! ```text
//! file:   [01 08] [b0 b1 b2 ... b599]           load address 0x0801, 600 bytes
//!
//! frame 1: 0C 00 80 | F8 01 08 | b0   .. b247   header + first 248 bytes
//! frame 2:            F8 F9 08 | b248 .. b495
//! frame 3:            68 F1 09 | b496 .. b599   remaining 104 bytes
//! frame 4: FF                                   finalize
//! ```
//!
//! This module only plans the frames; sending them and waiting for each
//! acknowledgment is the caller's job.

use thiserror::Error;
use tracing::trace;

use crate::protocol::command::{Command, MAX_CHUNK_PAYLOAD};

/// Size of the load-address prefix of a program image.
pub const LOAD_ADDRESS_SIZE: usize = 2;

/// Smallest image accepted: a load address plus at least one body byte.
pub const MIN_IMAGE_SIZE: usize = LOAD_ADDRESS_SIZE + 1;

/// Errors detected while planning a transfer.
#[derive(Debug, Error, PartialEq)]
pub enum TransferError {
    /// The image has no body after the load address.
    #[error("insufficient data: a program needs at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The body would run past the end of the 64 KiB address space.
    #[error("program of {length} bytes does not fit at load address 0x{load_address:04X}")]
    AddressOverflow { load_address: u16, length: usize },
}

/// One planned chunk of a transfer, borrowing its bytes from the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Set on the first chunk, which carries the receive-data header.
    pub first: bool,
    /// Target address of `data[0]` in C64 memory.
    pub address: u16,
    pub data: &'a [u8],
}

impl Chunk<'_> {
    /// Builds the [`Command::TransferChunk`] for this chunk.
    pub fn to_command(&self) -> Command {
        Command::TransferChunk {
            with_header: self.first,
            address: self.address,
            payload: self.data.to_vec(),
        }
    }
}

/// A validated program image and the chunks it will be sent as.
///
/// `TransferJob` is an [`Iterator`] over [`Chunk`]s.  Chunks are yielded in
/// order with strictly increasing addresses; their lengths sum to the body
/// length.  The finalize frame is not part of the iteration.
///
/// # Examples
///
/// ```rust
/// use c64kb_core::protocol::transfer::TransferJob;
///
/// let mut image = vec![0x01, 0x08];
/// image.extend(std::iter::repeat(0xEA).take(300));
///
/// let job = TransferJob::new(&image).unwrap();
/// assert_eq!(job.load_address(), 0x0801);
/// assert_eq!(job.chunk_count(), 2);
///
/// let chunks: Vec<_> = job.collect();
/// assert_eq!(chunks[0].data.len(), 248);
/// assert_eq!(chunks[1].address, 0x0801 + 248);
/// assert!(chunks[0].first && !chunks[1].first);
/// ```
#[derive(Debug, Clone)]
pub struct TransferJob<'a> {
    load_address: u16,
    body: &'a [u8],
    /// Offset into `body` of the next chunk to yield.
    offset: usize,
}

impl<'a> TransferJob<'a> {
    /// Validates `image` and prepares it for chunking.
    ///
    /// # Errors
    ///
    /// - [`TransferError::InsufficientData`] if `image` is shorter than
    ///   [`MIN_IMAGE_SIZE`].
    /// - [`TransferError::AddressOverflow`] if the body would extend past
    ///   address `0xFFFF`.
    pub fn new(image: &'a [u8]) -> Result<Self, TransferError> {
        if image.len() < MIN_IMAGE_SIZE {
            return Err(TransferError::InsufficientData {
                needed: MIN_IMAGE_SIZE,
                available: image.len(),
            });
        }

        let load_address = u16::from_le_bytes([image[0], image[1]]);
        let body = &image[LOAD_ADDRESS_SIZE..];

        if usize::from(load_address) + body.len() > 0x1_0000 {
            return Err(TransferError::AddressOverflow {
                load_address,
                length: body.len(),
            });
        }

        trace!(load_address, bytes = body.len(), "planned program transfer");

        Ok(Self {
            load_address,
            body,
            offset: 0,
        })
    }

    /// Address the first body byte is written to.
    pub fn load_address(&self) -> u16 {
        self.load_address
    }

    /// Number of body bytes (the image without its load address).
    pub fn total_bytes(&self) -> usize {
        self.body.len()
    }

    /// Number of body bytes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.body.len() - self.offset
    }

    /// Total number of chunks the whole body is split into.
    pub fn chunk_count(&self) -> usize {
        self.body.len().div_ceil(MAX_CHUNK_PAYLOAD)
    }
}

impl<'a> Iterator for TransferJob<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.offset >= self.body.len() {
            return None;
        }

        let end = (self.offset + MAX_CHUNK_PAYLOAD).min(self.body.len());
        // Validated in `new`: load_address + body.len() <= 0x10000, so any
        // offset strictly inside the body still fits in 16 bits.
        let address = (usize::from(self.load_address) + self.offset) as u16;
        let chunk = Chunk {
            first: self.offset == 0,
            address,
            data: &self.body[self.offset..end],
        };
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining().div_ceil(MAX_CHUNK_PAYLOAD);
        (n, Some(n))
    }
}

impl ExactSizeIterator for TransferJob<'_> {}
