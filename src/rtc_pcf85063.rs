// RTC driver for PCF85063A/PCF85063TP real-time clock chips.
// Datasheet: https://files.waveshare.com/wiki/common/Pcf85063atl1118-NdPQpTGE-loeW7GbZ7.pdf

use embedded_hal::i2c::I2c;
use log::warn;

use crate::clock::ClockTime;

pub const PCF85063_ADDR: u8 = 0x51;

const REG_RAM_BYTE: u8 = 0x03;
const REG_SECONDS: u8 = 0x04;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,  // full year, e.g., 2024
    pub month: u8,  // 1-12
    pub day: u8,    // 1-31
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

impl DateTime {
    /// Time-of-day part, if the fields are in range.
    pub fn clock_time(&self) -> Option<ClockTime> {
        ClockTime::new(self.hour, self.minute, self.second)
    }
}

pub struct Pcf85063<I2C> {
    i2c: I2C,
}

impl<I2C, E> Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }

    // Read datetime. Returns (dt, vl_flag) where vl_flag == true means time is unreliable (power loss).
    pub fn read_datetime(&mut self) -> Result<(DateTime, bool), E> {
        let mut buf = [0u8; 7];
        // Time registers start at 0x04: sec, min, hour, day, weekday, month, year
        self.i2c.write_read(PCF85063_ADDR, &[REG_SECONDS], &mut buf)?;
        let vl = (buf[0] & 0x80) != 0;
        let month_raw = buf[5];
        let year = if (month_raw & 0x80) != 0 {
            1900u16 + bcd_decode(buf[6]) as u16
        } else {
            2000u16 + bcd_decode(buf[6]) as u16
        };
        Ok((
            DateTime {
                year,
                month: bcd_decode(month_raw & 0x1F),
                day: bcd_decode(buf[3] & 0x3F),
                hour: bcd_decode(buf[2] & 0x3F),
                minute: bcd_decode(buf[1] & 0x7F),
                second: bcd_decode(buf[0] & 0x7F),
            },
            vl,
        ))
    }

    /// Current time of day for the face.
    ///
    /// An unreliable (voltage-low) reading is still shown, with a warning;
    /// out-of-range fields give `None`.
    pub fn read_clock(&mut self) -> Result<Option<ClockTime>, E> {
        let (dt, vl) = self.read_datetime()?;
        if vl {
            warn!(
                "[RTC] VL=1 {:02}:{:02}:{:02} may be stale",
                dt.hour, dt.minute, dt.second
            );
        }
        if !datetime_is_valid(&dt) {
            warn!("[RTC] invalid fields {:?}", dt);
        }
        Ok(dt.clock_time())
    }

    // Set datetime. Ignores weekday field. Writing seconds clears VL.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), E> {
        let yr = (dt.year % 100) as u8;
        let data = [
            REG_SECONDS,
            bcd_encode(dt.second),
            bcd_encode(dt.minute),
            bcd_encode(dt.hour),
            bcd_encode(dt.day),
            0, // weekday not used
            bcd_encode(dt.month),
            bcd_encode(yr),
        ];
        self.i2c.write(PCF85063_ADDR, &data)
    }

    // The one general-purpose RAM byte, battery backed.
    pub fn read_ram(&mut self) -> Result<u8, E> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(PCF85063_ADDR, &[REG_RAM_BYTE], &mut buf)?;
        Ok(buf[0])
    }

    pub fn write_ram(&mut self, value: u8) -> Result<(), E> {
        self.i2c.write(PCF85063_ADDR, &[REG_RAM_BYTE, value])
    }
}

// BCD decode
fn bcd_decode(v: u8) -> u8 {
    (v & 0x0F) + ((v >> 4) * 10)
}

// BCD encode
fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

// Basic sanity check on decoded RTC time.
pub fn datetime_is_valid(dt: &DateTime) -> bool {
    (2020..=2099).contains(&dt.year)
        && (1..=12).contains(&dt.month)
        && (1..=31).contains(&dt.day)
        && dt.clock_time().is_some()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    // Register file behind a register-pointer, like the real chip.
    #[derive(Default)]
    pub(crate) struct FakeBus {
        pub(crate) regs: [u8; 0x12],
        pointer: usize,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if address != PCF85063_ADDR {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        let Some((&reg, data)) = bytes.split_first() else {
                            continue;
                        };
                        self.pointer = reg as usize;
                        for &b in data {
                            self.regs[self.pointer] = b;
                            self.pointer += 1;
                        }
                    }
                    Operation::Read(buf) => {
                        for b in buf.iter_mut() {
                            *b = self.regs[self.pointer];
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn sample_datetime() -> DateTime {
        DateTime {
            year: 2026,
            month: 10,
            day: 19,
            hour: 23,
            minute: 59,
            second: 58,
        }
    }

    #[test]
    fn bcd_helpers_agree() {
        for v in 0..100 {
            assert_eq!(bcd_decode(bcd_encode(v)), v);
        }
        assert_eq!(bcd_encode(59), 0x59);
    }

    #[test]
    fn set_then_read_datetime() {
        let mut rtc = Pcf85063::new(FakeBus::default());
        rtc.set_datetime(&sample_datetime()).unwrap();

        let (dt, vl) = rtc.read_datetime().unwrap();
        assert_eq!(dt, sample_datetime());
        assert!(!vl);
        assert_eq!(rtc.into_inner().regs[0x04], 0x58);
    }

    #[test]
    fn voltage_low_flag_is_reported() {
        let mut bus = FakeBus::default();
        bus.regs[0x04] = 0x80 | 0x12;
        bus.regs[0x05] = 0x34;
        bus.regs[0x06] = 0x05;
        let mut rtc = Pcf85063::new(bus);

        let (dt, vl) = rtc.read_datetime().unwrap();
        assert!(vl);
        assert_eq!((dt.hour, dt.minute, dt.second), (5, 34, 12));
        assert_eq!(rtc.read_clock().unwrap(), ClockTime::new(5, 34, 12));
    }

    #[test]
    fn invalid_fields_give_no_clock_time() {
        let mut bus = FakeBus::default();
        bus.regs[0x06] = 0x25; // 25h
        let mut rtc = Pcf85063::new(bus);
        assert_eq!(rtc.read_clock().unwrap(), None);
    }

    #[test]
    fn validity_check() {
        assert!(datetime_is_valid(&sample_datetime()));
        let mut dt = sample_datetime();
        dt.month = 13;
        assert!(!datetime_is_valid(&dt));
        dt = sample_datetime();
        dt.year = 1999;
        assert!(!datetime_is_valid(&dt));
    }

    #[test]
    fn ram_byte_round_trips() {
        let mut rtc = Pcf85063::new(FakeBus::default());
        rtc.write_ram(0xA1).unwrap();
        assert_eq!(rtc.read_ram().unwrap(), 0xA1);
    }
}
