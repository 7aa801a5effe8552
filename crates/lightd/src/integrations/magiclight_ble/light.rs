use async_trait::async_trait;
use tracing::debug;

use super::Error;
use super::bulb::Bulb;
use crate::color;
use crate::color::Rgb;
use crate::config::MagicLightDeviceConfig;
use crate::engine;
use crate::engine::Feature;
use crate::engine::Light;
use crate::engine::LightResult;
use crate::engine::TurnOn;

const SUPPORTED_FEATURES: &[Feature] = &[Feature::Brightness, Feature::RgbColor, Feature::WhiteValue];

/// A MagicLight bulb driven over Bluetooth LE.
///
/// Every operation opens a connection, does its work, re-reads the bulb
/// status and disconnects. Power, color and white are read straight from the
/// bulb handle's cached status.
pub struct MagicLight<B: Bulb> {
    id: String,
    name: String,
    address: String,
    bulb: B,
    /// HSV value of the last reported color
    brightness: f64,
}

impl<B: Bulb> MagicLight<B> {
    /// Construct the light and read its initial state.
    pub async fn new(address: &str, device: &MagicLightDeviceConfig, bulb: B) -> Result<Self, Error> {
        let mut light = Self {
            id: device.id.clone(),
            name: device.name.clone(),
            address: address.to_string(),
            bulb,
            brightness: 0.0,
        };
        light.sync().await?;
        Ok(light)
    }

    async fn sync(&mut self) -> Result<(), Error> {
        self.bulb.connect().await?;
        let result = self.refresh().await;
        self.close(result).await
    }

    /// Disconnect after an operation, keeping the operation's error if it failed.
    async fn close(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Ok(()) => self.bulb.disconnect().await,
            Err(e) => {
                if let Err(disconnect_err) = self.bulb.disconnect().await {
                    debug!("{} disconnect failed: {}", self.address, disconnect_err);
                }
                Err(e)
            }
        }
    }

    /// Re-read the bulb status over an open connection.
    async fn refresh(&mut self) -> Result<(), Error> {
        self.bulb.get_status().await?;
        self.brightness = color::brightness_of(self.bulb.status().rgb);
        debug!("{} status: {:?}", self.address, self.bulb.status());
        Ok(())
    }

    async fn power_on(&mut self, overrides: TurnOn) -> Result<(), Error> {
        self.bulb.connect().await?;
        let result = self.apply_on(overrides).await;
        self.close(result).await
    }

    async fn apply_on(&mut self, overrides: TurnOn) -> Result<(), Error> {
        // Checked against the status cached before this call
        if !self.bulb.status().power_on {
            self.bulb.turn_on().await?;
        }

        let status = *self.bulb.status();
        let target = overrides.resolve(status.rgb, self.brightness, status.white);
        if target.white_requested {
            self.bulb.set_white(target.white).await?;
        } else {
            let rgb = color::normalize(target.rgb, target.brightness);
            self.bulb.set_color(rgb).await?;
        }

        self.refresh().await
    }

    async fn power_off(&mut self) -> Result<(), Error> {
        self.bulb.connect().await?;
        let result = self.apply_off().await;
        self.close(result).await
    }

    async fn apply_off(&mut self) -> Result<(), Error> {
        if self.bulb.status().power_on {
            self.bulb.turn_off().await?;
        }

        self.refresh().await
    }

    #[cfg(test)]
    pub(crate) fn bulb(&self) -> &B {
        &self.bulb
    }
}

#[async_trait]
impl<B: Bulb + 'static> Light for MagicLight<B> {
    fn unique_id(&self) -> Option<String> {
        Some(format!("magiclight_ble.{}", self.address))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn object_id(&self) -> String {
        engine::slugify(&self.id)
    }

    fn is_on(&self) -> bool {
        self.bulb.status().power_on
    }

    fn brightness(&self) -> f64 {
        self.brightness
    }

    fn rgb_color(&self) -> Rgb {
        self.bulb.status().rgb
    }

    fn white_value(&self) -> u8 {
        self.bulb.status().white
    }

    fn supported_features(&self) -> &'static [Feature] {
        SUPPORTED_FEATURES
    }

    async fn update(&mut self) -> LightResult<()> {
        Ok(self.sync().await?)
    }

    async fn turn_on(&mut self, overrides: TurnOn) -> LightResult<()> {
        Ok(self.power_on(overrides).await?)
    }

    async fn turn_off(&mut self, _overrides: TurnOn) -> LightResult<()> {
        Ok(self.power_off().await?)
    }
}
