//! Protocol module containing command types, the frame codec and transfer planning.

pub mod codec;
pub mod command;
pub mod transfer;

pub use codec::{classify_frame, encode, frame_to_hex, FrameKind, ProtocolError};
pub use command::*;
pub use transfer::{Chunk, TransferError, TransferJob};
