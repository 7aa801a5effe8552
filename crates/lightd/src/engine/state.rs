use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::light::Feature;
use super::light::Light;
use crate::color;
use crate::color::Rgb;

/// State of a light entity, as rendered by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub name: String,

    pub unique_id: Option<String>,

    /// Whether the light is on or off.
    pub on: bool,

    /// Brightness level (0-255).
    pub brightness: u8,

    pub rgb_color: Rgb,

    pub white_value: u8,

    pub supported_features: Vec<Feature>,
}

impl LightState {
    pub fn read(light: &dyn Light) -> Self {
        Self {
            name: light.name().to_string(),
            unique_id: light.unique_id(),
            on: light.is_on(),
            brightness: color::level_from_brightness(light.brightness()),
            rgb_color: light.rgb_color(),
            white_value: light.white_value(),
            supported_features: light.supported_features().to_vec(),
        }
    }
}

/// Snapshot of every light the engine manages, keyed by entity id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct State {
    pub lights: BTreeMap<String, LightState>,
}
