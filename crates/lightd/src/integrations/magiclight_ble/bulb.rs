use async_trait::async_trait;

use super::Error;
use crate::color::Rgb;

/// Last status reported by a bulb
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulbStatus {
    pub power_on: bool,
    pub rgb: Rgb,
    pub white: u8,
}

/// Trait for MagicLight bulb operations
///
/// This trait allows for mocking the Bluetooth transport for testing
/// purposes. Commands require an open connection; `status()` returns the
/// fields cached by the most recent `get_status()`.
#[async_trait]
pub trait Bulb: Send + Sync {
    async fn connect(&mut self) -> Result<(), Error>;

    async fn disconnect(&mut self) -> Result<(), Error>;

    async fn turn_on(&mut self) -> Result<(), Error>;

    async fn turn_off(&mut self) -> Result<(), Error>;

    async fn set_color(&mut self, rgb: Rgb) -> Result<(), Error>;

    async fn set_white(&mut self, level: u8) -> Result<(), Error>;

    /// Query the bulb and refresh the cached status
    async fn get_status(&mut self) -> Result<(), Error>;

    fn status(&self) -> &BulbStatus;
}

/// Command issued to a mock bulb
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulbCommand {
    Connect,
    Disconnect,
    TurnOn,
    TurnOff,
    SetColor(Rgb),
    SetWhite(u8),
    GetStatus,
}

/// Mock bulb for testing
///
/// `device` is the state of the simulated hardware; `cached` only catches up
/// when `get_status()` is called, like the real transport.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockBulb {
    pub device: BulbStatus,
    pub cached: BulbStatus,
    pub commands: Vec<BulbCommand>,
    pub connected: bool,
    pub fail_connect: bool,
    /// Power and color commands fail after connecting
    pub fail_writes: bool,
}

#[cfg(test)]
impl MockBulb {
    /// Create a mock whose hardware is in the given state
    pub fn new(device: BulbStatus) -> Self {
        Self {
            device,
            ..Self::default()
        }
    }

    /// Create a mock that cannot be reached
    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    fn require_connection(&self) -> Result<(), Error> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn write(&mut self, command: BulbCommand) -> Result<(), Error> {
        self.require_connection()?;
        if self.fail_writes {
            return Err(Error::ConnectionFailed("mock bulb rejected the write".to_string()));
        }
        self.commands.push(command);
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl Bulb for MockBulb {
    async fn connect(&mut self) -> Result<(), Error> {
        self.commands.push(BulbCommand::Connect);
        if self.fail_connect {
            return Err(Error::ConnectionFailed("mock bulb is unreachable".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.commands.push(BulbCommand::Disconnect);
        self.connected = false;
        Ok(())
    }

    async fn turn_on(&mut self) -> Result<(), Error> {
        self.write(BulbCommand::TurnOn)?;
        self.device.power_on = true;
        Ok(())
    }

    async fn turn_off(&mut self) -> Result<(), Error> {
        self.write(BulbCommand::TurnOff)?;
        self.device.power_on = false;
        Ok(())
    }

    async fn set_color(&mut self, rgb: Rgb) -> Result<(), Error> {
        self.write(BulbCommand::SetColor(rgb))?;
        self.device.rgb = rgb;
        Ok(())
    }

    async fn set_white(&mut self, level: u8) -> Result<(), Error> {
        self.write(BulbCommand::SetWhite(level))?;
        self.device.white = level;
        Ok(())
    }

    async fn get_status(&mut self) -> Result<(), Error> {
        self.require_connection()?;
        self.commands.push(BulbCommand::GetStatus);
        self.cached = self.device;
        Ok(())
    }

    fn status(&self) -> &BulbStatus {
        &self.cached
    }
}
