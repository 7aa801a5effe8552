use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::BDAddr;
use btleplug::api::Central;
use btleplug::api::Characteristic;
use btleplug::api::Manager as _;
use btleplug::api::Peripheral as _;
use btleplug::api::ScanFilter;
use btleplug::api::WriteType;
use btleplug::api::bleuuid::uuid_from_u16;
use btleplug::platform::Adapter;
use btleplug::platform::Manager;
use btleplug::platform::Peripheral;
use futures::StreamExt;
use tokio::time::Instant;
use tracing::debug;

use super::Error;
use super::bulb::Bulb;
use super::bulb::BulbStatus;
use super::protocol;
use crate::color::Rgb;

/// How long to scan for a bulb before giving up
const SCAN_WINDOW: Duration = Duration::from_secs(10);

/// Delay between peripheral list checks while scanning
const SCAN_POLL: Duration = Duration::from_millis(500);

/// Real bulb implementation using btleplug
pub struct MagicLightBle {
    address: BDAddr,
    peripheral: Peripheral,

    /// Command and status characteristics (resolved in connect())
    write_char: Option<Characteristic>,
    notify_char: Option<Characteristic>,

    status: BulbStatus,
}

impl MagicLightBle {
    /// Find the bulb with the given address on the first Bluetooth adapter.
    pub async fn open(address: BDAddr) -> Result<Self, Error> {
        let manager = Manager::new().await?;
        let central = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoAdapter)?;

        debug!("Scanning for {}", address);
        central.start_scan(ScanFilter::default()).await?;
        let found = Self::scan_for(&central, address).await;
        central.stop_scan().await?;

        let peripheral = found?.ok_or(Error::NotFound(address))?;
        debug!("Found {}", address);

        Ok(Self {
            address,
            peripheral,
            write_char: None,
            notify_char: None,
            status: BulbStatus::default(),
        })
    }

    async fn scan_for(central: &Adapter, address: BDAddr) -> Result<Option<Peripheral>, Error> {
        let deadline = Instant::now() + SCAN_WINDOW;
        loop {
            let peripherals = central.peripherals().await?;
            if let Some(p) = peripherals.into_iter().find(|p| p.address() == address) {
                return Ok(Some(p));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(SCAN_POLL).await;
        }
    }

    async fn send(&self, frame: &[u8]) -> Result<(), Error> {
        let write_char = self.write_char.as_ref().ok_or(Error::NotConnected)?;
        debug!("{} <- {:02x?}", self.address, frame);
        self.peripheral
            .write(write_char, frame, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    fn find_characteristic(&self, uuid16: u16) -> Result<Characteristic, Error> {
        let uuid = uuid_from_u16(uuid16);
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or_else(|| Error::CharacteristicNotFound(uuid.to_string()))
    }
}

#[async_trait]
impl Bulb for MagicLightBle {
    async fn connect(&mut self) -> Result<(), Error> {
        self.peripheral.connect().await?;
        self.peripheral.discover_services().await?;

        self.write_char = Some(self.find_characteristic(protocol::WRITE_CHARACTERISTIC)?);
        self.notify_char = Some(self.find_characteristic(protocol::NOTIFY_CHARACTERISTIC)?);

        debug!("Connected to {}", self.address);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.write_char = None;
        self.notify_char = None;
        self.peripheral.disconnect().await?;

        debug!("Disconnected from {}", self.address);
        Ok(())
    }

    async fn turn_on(&mut self) -> Result<(), Error> {
        self.send(&protocol::POWER_ON).await
    }

    async fn turn_off(&mut self) -> Result<(), Error> {
        self.send(&protocol::POWER_OFF).await
    }

    async fn set_color(&mut self, rgb: Rgb) -> Result<(), Error> {
        self.send(&protocol::set_color(rgb)).await
    }

    async fn set_white(&mut self, level: u8) -> Result<(), Error> {
        self.send(&protocol::set_white(level)).await
    }

    async fn get_status(&mut self) -> Result<(), Error> {
        let notify_char = self.notify_char.clone().ok_or(Error::NotConnected)?;

        // Subscribe before querying so the reply cannot be missed
        self.peripheral.subscribe(&notify_char).await?;
        let mut notifications = self.peripheral.notifications().await?;
        self.send(&protocol::STATUS_QUERY).await?;

        while let Some(notification) = notifications.next().await {
            if notification.uuid != notify_char.uuid {
                continue;
            }
            debug!("{} -> {:02x?}", self.address, notification.value);
            self.status = protocol::parse_status(&notification.value)?;
            return Ok(());
        }

        Err(Error::StatusStreamClosed)
    }

    fn status(&self) -> &BulbStatus {
        &self.status
    }
}
