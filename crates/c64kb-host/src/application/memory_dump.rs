//! Parsing of the operator's answers for a memory dump request.
//!
//! The operator types a hex start address and a decimal byte count.  The
//! count is clamped to the peripheral's maximum; anything that does not parse
//! aborts the request instead of sending a guess.

use c64kb_core::protocol::Command;
use thiserror::Error;

/// An answer to a memory dump prompt that could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidInput {
    #[error("not a 16-bit hex address: {0:?}")]
    Address(String),

    #[error("not a byte count: {0:?}")]
    Count(String),
}

/// Parses a hex address such as `0400`, `$D000` or `0xc000`.
pub fn parse_address(answer: &str) -> Result<u16, InvalidInput> {
    let trimmed = answer.trim();
    let digits = trimmed
        .strip_prefix('$')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| InvalidInput::Address(answer.to_string()))
}

/// Parses a decimal byte count.  Values above the dump limit are accepted
/// here and clamped by [`Command::show_memory`]; counts too large for a
/// `u32` saturate.
pub fn parse_count(answer: &str) -> Result<u32, InvalidInput> {
    let digits = answer.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidInput::Count(answer.to_string()));
    }
    Ok(digits.parse::<u32>().unwrap_or(u32::MAX))
}

/// Builds the show-memory command from the two raw answers.
pub fn build_request(address: &str, count: &str) -> Result<Command, InvalidInput> {
    Ok(Command::show_memory(parse_address(address)?, parse_count(count)?))
}
