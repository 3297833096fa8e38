//! Persisted face settings.
//!
//! The only user setting is the colour scheme. It is stored in the RTC's
//! single RAM byte so it survives deep sleep and brown-outs as long as the
//! backup supply holds.

use core::fmt;

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};
use embedded_hal::i2c::I2c;

use crate::rtc_pcf85063::Pcf85063;

// High nibble of the stored byte; the low nibble carries the style id.
const SETTINGS_TAG: u8 = 0xA0;
// RAM byte value after a cold start of the RTC.
const RAM_CLEARED: u8 = 0x00;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FaceStyle {
    /// White on black.
    #[default]
    Classic,
    /// Black on white.
    Inverted,
}

impl FaceStyle {
    pub const ALL: [FaceStyle; 2] = [FaceStyle::Classic, FaceStyle::Inverted];

    pub fn toggled(self) -> Self {
        match self {
            FaceStyle::Classic => FaceStyle::Inverted,
            FaceStyle::Inverted => FaceStyle::Classic,
        }
    }

    /// `(foreground, background)`
    pub fn colors(self) -> (Rgb565, Rgb565) {
        match self {
            FaceStyle::Classic => (Rgb565::WHITE, Rgb565::BLACK),
            FaceStyle::Inverted => (Rgb565::BLACK, Rgb565::WHITE),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FaceStyle::Classic => 0,
            FaceStyle::Inverted => 1,
        }
    }

    pub fn from_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(FaceStyle::Classic),
            1 => Some(FaceStyle::Inverted),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub style: FaceStyle,
}

impl Settings {
    pub fn encode(&self) -> u8 {
        SETTINGS_TAG | self.style.as_u8()
    }

    /// `Ok(None)` for a cleared RAM byte, `Err(byte)` for anything unrecognised.
    pub fn decode(byte: u8) -> Result<Option<Self>, u8> {
        if byte == RAM_CLEARED {
            return Ok(None);
        }
        if byte & 0xF0 != SETTINGS_TAG {
            return Err(byte);
        }
        FaceStyle::from_u8(byte & 0x0F)
            .map(|style| Some(Settings { style }))
            .ok_or(byte)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SettingsError<E> {
    Bus(E),
    Corrupt(u8),
}

impl<E: fmt::Debug> fmt::Display for SettingsError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Bus(e) => write!(f, "settings bus error: {:?}", e),
            SettingsError::Corrupt(byte) => write!(f, "unrecognised settings byte 0x{:02X}", byte),
        }
    }
}

/// Abstract settings persistence backend.
pub trait SettingsStore {
    type Error;

    fn load(&mut self) -> Result<Option<Settings>, Self::Error>;
    fn save(&mut self, settings: &Settings) -> Result<(), Self::Error>;
}

impl<I2C: I2c> SettingsStore for Pcf85063<I2C> {
    type Error = SettingsError<I2C::Error>;

    fn load(&mut self) -> Result<Option<Settings>, Self::Error> {
        let byte = self.read_ram().map_err(SettingsError::Bus)?;
        Settings::decode(byte).map_err(SettingsError::Corrupt)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), Self::Error> {
        self.write_ram(settings.encode()).map_err(SettingsError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtc_pcf85063::tests::FakeBus;

    #[test]
    fn toggling_twice_returns_to_start() {
        for style in FaceStyle::ALL {
            assert_ne!(style.toggled(), style);
            assert_eq!(style.toggled().toggled(), style);
        }
    }

    #[test]
    fn styles_swap_colours() {
        let (fg, bg) = FaceStyle::Classic.colors();
        assert_eq!(FaceStyle::Inverted.colors(), (bg, fg));
    }

    #[test]
    fn cleared_ram_means_nothing_stored() {
        assert_eq!(Settings::decode(0x00), Ok(None));
    }

    #[test]
    fn garbage_is_reported() {
        assert_eq!(Settings::decode(0xFF), Err(0xFF));
        assert_eq!(Settings::decode(0xA7), Err(0xA7));
        assert_eq!(Settings::decode(0x01), Err(0x01));
    }

    #[test]
    fn rtc_ram_keeps_the_style() {
        let mut rtc = Pcf85063::new(FakeBus::default());
        assert_eq!(rtc.load(), Ok(None));

        let settings = Settings {
            style: FaceStyle::Inverted,
        };
        rtc.save(&settings).unwrap();
        assert_eq!(rtc.load(), Ok(Some(settings)));
        assert_eq!(rtc.into_inner().regs[0x03], 0xA1);
    }

    #[test]
    fn corrupt_ram_surfaces_as_error() {
        let mut bus = FakeBus::default();
        bus.regs[0x03] = 0x5A;
        let mut rtc = Pcf85063::new(bus);
        assert_eq!(rtc.load(), Err(SettingsError::Corrupt(0x5A)));
        assert_eq!(
            SettingsError::<()>::Corrupt(0x5A).to_string(),
            "unrecognised settings byte 0x5A"
        );
    }
}
