//! Bluetooth LE transport built on `btleplug`.
//!
//! # How a round trip works (for beginners)
//!
//! The peripheral exposes a single GATT *characteristic*: a small value that a
//! central (us) can write and read.  Every frame is written *with response*,
//! so the write call only returns once the peripheral has accepted it.  We
//! then read the characteristic back; the peripheral leaves its answer there.
//!
//! Connection set-up is:
//!
//! 1. Take the first Bluetooth adapter the OS reports.
//! 2. Scan until a peripheral with the configured MAC address shows up, or
//!    give up after the scan timeout.
//! 3. Connect, discover services and find the characteristic by UUID.
//!
//! There is no reconnect.  A dropped link surfaces as a
//! [`TransportError::Link`] on the next round trip and ends the session.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Manager, Peripheral};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::link::{FrameTransport, TransportError};

const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A connected peripheral plus the characteristic used for every exchange.
pub struct BleTransport {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

impl BleTransport {
    /// Scans for `address`, connects and resolves `characteristic`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidAddress`] if `address` is not a MAC address.
    /// - [`TransportError::NoAdapter`] if the OS reports no adapter.
    /// - [`TransportError::PeripheralNotFound`] if the scan times out.
    /// - [`TransportError::CharacteristicNotFound`] if the peripheral does
    ///   not expose `characteristic`.
    /// - [`TransportError::Link`] for any Bluetooth stack failure.
    pub async fn connect(
        address: &str,
        characteristic: Uuid,
        scan_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let target =
            BDAddr::from_str(address).map_err(|_| TransportError::InvalidAddress(address.to_string()))?;

        let manager = Manager::new().await.map_err(link)?;
        let adapter = manager
            .adapters()
            .await
            .map_err(link)?
            .into_iter()
            .next()
            .ok_or(TransportError::NoAdapter)?;

        info!("scanning for {target} (timeout {}s)", scan_timeout.as_secs());
        adapter.start_scan(ScanFilter::default()).await.map_err(link)?;

        let deadline = Instant::now() + scan_timeout;
        let peripheral = loop {
            let found = adapter
                .peripherals()
                .await
                .map_err(link)?
                .into_iter()
                .find(|p| p.address() == target);
            if let Some(p) = found {
                break p;
            }
            if Instant::now() >= deadline {
                let _ = adapter.stop_scan().await;
                return Err(TransportError::PeripheralNotFound(address.to_string()));
            }
            sleep(SCAN_POLL_INTERVAL).await;
        };
        adapter.stop_scan().await.map_err(link)?;

        peripheral.connect().await.map_err(link)?;
        peripheral.discover_services().await.map_err(link)?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic)
            .ok_or(TransportError::CharacteristicNotFound(characteristic))?;

        info!("connected to {target}, characteristic {}", characteristic.uuid);
        Ok(Self {
            peripheral,
            characteristic,
        })
    }

    /// Closes the link.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        debug!("disconnecting");
        self.peripheral.disconnect().await.map_err(link)
    }
}

#[async_trait]
impl FrameTransport for BleTransport {
    async fn round_trip(&self, frame: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.peripheral
            .write(&self.characteristic, frame, WriteType::WithResponse)
            .await
            .map_err(link)?;
        self.peripheral.read(&self.characteristic).await.map_err(link)
    }
}

fn link(e: btleplug::Error) -> TransportError {
    TransportError::Link(e.to_string())
}
