//! MagicLight Bluetooth LE bulbs.

mod btle;
mod bulb;
mod light;
mod protocol;

use std::future::Future;

use async_trait::async_trait;
use btleplug::api::BDAddr;
use linkme::distributed_slice;
use tracing::error;
use tracing::info;

pub use btle::MagicLightBle;
pub use bulb::Bulb;
pub use bulb::BulbStatus;
pub use light::MagicLight;

use crate::config::MagicLightBleConfig;
use crate::config::MagicLightDeviceConfig;
use crate::engine;
use crate::engine::Light;
use crate::engine::Platform;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No Bluetooth adapters found")]
    NoAdapter,

    #[error("Invalid Bluetooth address: {0}")]
    InvalidAddress(String),

    #[error("Bulb {0} not found")]
    NotFound(BDAddr),

    #[error("Could not find required BLE characteristic: {0}")]
    CharacteristicNotFound(String),

    #[error("Bulb is not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Malformed status frame: {0:02x?}")]
    MalformedStatus(Vec<u8>),

    #[error("Notification stream closed before a status reply arrived")]
    StatusStreamClosed,

    #[error(transparent)]
    Btle(#[from] btleplug::Error),
}

#[distributed_slice(engine::PLATFORM_REGISTRY)]
fn init_magiclight_ble(ctx: &engine::PlatformContext) -> engine::PlatformFactoryResult {
    let Some(config) = &ctx.config.integrations.magiclight_ble else {
        return Ok(Vec::new());
    };

    Ok(vec![Box::new(MagicLightBlePlatform::new(config))])
}

/// Platform owning every configured MagicLight bulb
pub struct MagicLightBlePlatform {
    /// (address, device) pairs, sorted by address
    devices: Vec<(String, MagicLightDeviceConfig)>,
}

impl MagicLightBlePlatform {
    pub fn new(config: &MagicLightBleConfig) -> Self {
        let mut devices: Vec<_> = config
            .devices
            .iter()
            .map(|(address, device)| (address.clone(), device.clone()))
            .collect();
        devices.sort_by(|a, b| a.0.cmp(&b.0));
        Self { devices }
    }

    /// Construct a light for every device, using `open` to obtain a handle
    /// for each address. Devices that fail are logged and left out.
    async fn setup_with<B, F, Fut>(&self, open: F) -> Vec<Box<dyn Light>>
    where
        B: Bulb + 'static,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<B, Error>>,
    {
        let mut lights: Vec<Box<dyn Light>> = Vec::new();
        for (address, device) in &self.devices {
            let light = match open(address.clone()).await {
                Ok(bulb) => MagicLight::new(address, device, bulb).await,
                Err(e) => Err(e),
            };

            match light {
                Ok(light) => {
                    info!("Initialized {} ({})", address, device.id);
                    lights.push(Box::new(light));
                }
                Err(e) => error!("Failed to initialize {}, {}: {}", address, device.id, e),
            }
        }
        lights
    }
}

async fn open_bulb(address: String) -> Result<MagicLightBle, Error> {
    let address: BDAddr = address
        .parse()
        .map_err(|e| Error::InvalidAddress(format!("{address}: {e}")))?;
    MagicLightBle::open(address).await
}

#[async_trait]
impl Platform for MagicLightBlePlatform {
    fn name(&self) -> &str {
        "magiclight_ble"
    }

    async fn setup(&self) -> anyhow::Result<Vec<Box<dyn Light>>> {
        Ok(self.setup_with(open_bulb).await)
    }
}
