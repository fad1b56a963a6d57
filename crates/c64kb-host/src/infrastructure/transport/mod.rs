//! [`FrameTransport`] implementations.
//!
//! - [`dry_run::DryRunTransport`] logs every frame and answers with an empty
//!   acknowledgment.  Always available.
//! - `ble::BleTransport` talks GATT to the peripheral.  Compiled only with
//!   the `ble` cargo feature because it needs the platform Bluetooth stack.
//!
//! [`FrameTransport`]: crate::application::link::FrameTransport

pub mod dry_run;

#[cfg(feature = "ble")]
pub mod ble;
