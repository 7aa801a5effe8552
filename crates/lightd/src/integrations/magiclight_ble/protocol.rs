//! MagicLight BLE command and status frames.
//!
//! Commands are written to characteristic `0xFFE9`; status replies arrive as
//! notifications on `0xFFE4`.

use super::Error;
use super::bulb::BulbStatus;
use crate::color::Rgb;

/// 16-bit UUID of the command characteristic
pub const WRITE_CHARACTERISTIC: u16 = 0xFFE9;

/// 16-bit UUID of the status notification characteristic
pub const NOTIFY_CHARACTERISTIC: u16 = 0xFFE4;

pub const POWER_ON: [u8; 3] = [0xCC, 0x23, 0x33];
pub const POWER_OFF: [u8; 3] = [0xCC, 0x24, 0x33];
pub const STATUS_QUERY: [u8; 3] = [0xEF, 0x01, 0x77];

const STATUS_LEN: usize = 12;
const STATUS_HEADER: u8 = 0x66;
const STATUS_TRAILER: u8 = 0x99;
const STATUS_POWER_ON: u8 = 0x23;

pub fn set_color(rgb: Rgb) -> [u8; 7] {
    [0x56, rgb.red, rgb.green, rgb.blue, 0x00, 0xF0, 0xAA]
}

pub fn set_white(level: u8) -> [u8; 7] {
    [0x56, 0x00, 0x00, 0x00, level, 0x0F, 0xAA]
}

/// Decode a status reply.
///
/// Layout: `66 <type> <power> <mode> <xx> <speed> RR GG BB WW <version> 99`
pub fn parse_status(frame: &[u8]) -> Result<BulbStatus, Error> {
    if frame.len() != STATUS_LEN
        || frame[0] != STATUS_HEADER
        || frame[STATUS_LEN - 1] != STATUS_TRAILER
    {
        return Err(Error::MalformedStatus(frame.to_vec()));
    }

    Ok(BulbStatus {
        power_on: frame[2] == STATUS_POWER_ON,
        rgb: Rgb::new(frame[6], frame[7], frame[8]),
        white: frame[9],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_on() {
        let frame = [
            0x66, 0x15, 0x23, 0x41, 0x20, 0x00, 0x10, 0x20, 0x30, 0x05, 0x03, 0x99,
        ];
        let status = parse_status(&frame).unwrap();
        assert!(status.power_on);
        assert_eq!(status.rgb, Rgb::new(0x10, 0x20, 0x30));
        assert_eq!(status.white, 5);
    }

    #[test]
    fn test_parse_status_off() {
        let frame = [
            0x66, 0x15, 0x24, 0x41, 0x20, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x03, 0x99,
        ];
        let status = parse_status(&frame).unwrap();
        assert!(!status.power_on);
        assert_eq!(status.rgb, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_parse_status_rejects_bad_frames() {
        assert!(matches!(
            parse_status(&[0x66, 0x99]),
            Err(Error::MalformedStatus(_))
        ));

        let mut frame = [0u8; 12];
        frame[0] = 0x66;
        assert!(parse_status(&frame).is_err());

        frame[11] = 0x99;
        assert!(parse_status(&frame).is_ok());
    }

    #[test]
    fn test_command_frames() {
        assert_eq!(
            set_color(Rgb::new(1, 2, 3)),
            [0x56, 1, 2, 3, 0x00, 0xF0, 0xAA]
        );
        assert_eq!(set_white(200), [0x56, 0, 0, 0, 200, 0x0F, 0xAA]);
    }
}
