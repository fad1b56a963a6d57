//! Storage infrastructure: everything the host reads from disk.
//!
//! - `config`  – The TOML configuration file, with defaults when it does not
//!   exist yet (first run).
//! - `program` – Program images for the send-program operation.

pub mod config;
pub mod program;
