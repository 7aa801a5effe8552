use serde::Deserialize;
use serde::Serialize;

use crate::color::Rgb;

pub const LIGHT_OFF: u8 = 0;
pub const LIGHT_ON: u8 = 1;

/// Which channel set a command drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Mode {
    #[default]
    Color,
    White,
}

impl TryFrom<u8> for Mode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Color),
            1 => Ok(Mode::White),
            other => Err(format!("unknown light mode {}", other)),
        }
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Color => 0,
            Mode::White => 1,
        }
    }
}

/// Body of both the GET response and the POST command
///
/// e.g. {"state": 1, "mode": 0, "color": {"red": 255, "green": 0, "blue": 0}, "whitelevel": 0}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightPayload {
    pub state: u8,
    pub mode: Mode,
    pub color: Rgb,
    pub whitelevel: u8,
}

impl LightPayload {
    pub fn is_on(&self) -> bool {
        self.state != LIGHT_OFF
    }
}
