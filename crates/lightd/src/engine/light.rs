use std::error::Error;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::color::Rgb;

/// Error type returned by light operations
pub type LightError = Box<dyn Error + Send + Sync>;

/// Result type returned by light operations
pub type LightResult<T> = Result<T, LightError>;

/// Capabilities a light can advertise to the host.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    Brightness,
    RgbColor,
    WhiteValue,
}

/// Optional attribute overrides for a turn-on command.
///
/// Anything left out is taken from the light's current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurnOn {
    /// Brightness level (0-255)
    #[serde(default)]
    pub brightness: Option<u8>,

    #[serde(default)]
    pub rgb_color: Option<Rgb>,

    /// White channel level (0-255). Takes precedence over color and brightness.
    #[serde(default)]
    pub white_value: Option<u8>,
}

/// A controllable light.
///
/// Implementations hold the last known device state; property getters never
/// touch the device. Operations on one light are never run concurrently.
#[async_trait]
pub trait Light: Send + Sync {
    /// Stable identifier, if the integration has one
    fn unique_id(&self) -> Option<String>;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Object id used to build the entity id (`light.<object_id>`)
    fn object_id(&self) -> String;

    fn is_on(&self) -> bool;

    /// Brightness as a fraction of full output
    fn brightness(&self) -> f64;

    fn rgb_color(&self) -> Rgb;

    fn white_value(&self) -> u8;

    fn supported_features(&self) -> &'static [Feature];

    /// Refresh state from the device
    async fn update(&mut self) -> LightResult<()>;

    async fn turn_on(&mut self, overrides: TurnOn) -> LightResult<()>;

    async fn turn_off(&mut self, overrides: TurnOn) -> LightResult<()>;
}

/// Overrides layered onto the current state of a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Resolved {
    pub rgb: Rgb,
    pub brightness: f64,
    pub white: u8,
    /// Set when the command carried an explicit white value
    pub white_requested: bool,
}

impl TurnOn {
    pub(crate) fn resolve(&self, rgb: Rgb, brightness: f64, white: u8) -> Resolved {
        Resolved {
            rgb: self.rgb_color.unwrap_or(rgb),
            brightness: self
                .brightness
                .map(crate::color::brightness_from_level)
                .unwrap_or(brightness),
            white: self.white_value.unwrap_or(white),
            white_requested: self.white_value.is_some(),
        }
    }
}
