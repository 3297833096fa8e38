// CO5300 panel driver (Standard SPI mode, no D/C pin).
// Works with esp-hal (no_std); pixels live in a `FrameBuffer` and only its
// dirty rectangle is pushed to the panel.
//
// Wiring on Waveshare ESP32-S3 Touch AMOLED 1.43" (CO5300):
//   CS  = GPIO9
//   SCK = GPIO10
//   IO0/MOSI = GPIO11
//   (IO1..IO3 unused in Standard SPI mode)
//   RST = GPIO21
//
// Protocol (Standard SPI):
//   Every write begins with 0x02, 0x00, then one byte CMD, 0x00, then N data bytes.
//   Example: [0x02, 0x00, 0x11, 0x00] -> Sleep Out
//            [0x02, 0x00, 0x3A, 0x00, 0x55] -> Pixel Format = 16bpp (RGB565)
// Geometry: panel is 466 x 466 logical pixels (square).

use core::fmt;

use embedded_graphics::primitives::Rectangle;
use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{Operation, SpiDevice},
};

use crate::framebuffer::FrameBuffer;

extern crate alloc;
use alloc::{boxed::Box, vec};

pub const CO5300_WIDTH: u16 = 466;
pub const CO5300_HEIGHT: u16 = 466;

// Column offset of the visible area inside panel RAM.
const X_OFFSET: u16 = 0x0006;

const CMD_SWRESET: u8 = 0x01;
const CMD_SLPOUT: u8 = 0x11;
const CMD_NORON: u8 = 0x13;
const CMD_DISPON: u8 = 0x29;
const CMD_CASET: u8 = 0x2A;
const CMD_RASET: u8 = 0x2B;
const CMD_RAMWR: u8 = 0x2C;
const CMD_MADCTL: u8 = 0x36;
const CMD_COLMOD: u8 = 0x3A;
const CMD_RAMWRC: u8 = 0x3C;
const CMD_WRDISBV: u8 = 0x51;
const CMD_WRCTRLD: u8 = 0x53;

// 32736 = 32 * 1023, largest single DMA transfer
pub const DMA_CHUNK: usize = 32 * 1023;

/// Error type that wraps SPI and GPIO errors.
#[derive(Debug)]
pub enum Co5300Error<SpiE, GpioE> {
    Spi(SpiE),
    Gpio(GpioE),
    OutOfBounds,
}

impl<SpiE: fmt::Debug, GpioE: fmt::Debug> fmt::Display for Co5300Error<SpiE, GpioE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Co5300Error::Spi(e) => write!(f, "spi: {:?}", e),
            Co5300Error::Gpio(e) => write!(f, "gpio: {:?}", e),
            Co5300Error::OutOfBounds => write!(f, "window out of bounds"),
        }
    }
}

/// CO5300 panel speaking the "0x02 + CMD + DATA" SPI framing.
/// CS is handled by the `SpiDevice` implementation.
pub struct Co5300Display<SPI, RST> {
    spi: SPI,
    rst: Option<RST>,
    w: u16,
    h: u16,
    // staging buffer for RAMWR payloads
    stage: Box<[u8]>,
}

impl<SPI, RST> Co5300Display<SPI, RST>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    /// Create + init the panel. Call once at startup.
    pub fn new(
        spi: SPI,
        rst: Option<RST>,
        delay: &mut impl DelayNs,
        width: u16,
        height: u16,
    ) -> Result<Self, Co5300Error<SPI::Error, RST::Error>> {
        let mut this = Self {
            spi,
            rst,
            w: width,
            h: height,
            stage: vec![0u8; DMA_CHUNK].into_boxed_slice(),
        };

        // Hard reset sequence
        if let Some(r) = this.rst.as_mut() {
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(2);
            r.set_low().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(80);
            r.set_high().map_err(Co5300Error::Gpio)?;
            delay.delay_ms(200);
        }

        this.cmd(CMD_SWRESET, &[])?;
        delay.delay_ms(150);
        this.cmd(CMD_SLPOUT, &[])?;
        delay.delay_ms(180);

        this.cmd(CMD_COLMOD, &[0x55])?; // RGB565
        delay.delay_ms(2);
        this.cmd(0xC4, &[0x80])?; // SPI mode control
        this.cmd(CMD_NORON, &[])?;
        this.cmd(CMD_WRCTRLD, &[0x20])?; // brightness control on
        delay.delay_ms(1);
        this.cmd(0x63, &[0xFF])?; // HBM brightness ceiling
        delay.delay_ms(1);
        this.cmd(CMD_WRDISBV, &[0x00])?;
        delay.delay_ms(1);

        this.cmd(CMD_DISPON, &[])?;
        delay.delay_ms(200);

        this.cmd(CMD_WRDISBV, &[0xFF])?;
        this.cmd(CMD_MADCTL, &[0x00])?;
        this.set_window(0, 0, width - 1, height - 1)?;
        Ok(this)
    }

    /// Panel brightness, 0 = off, 255 = full.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        self.cmd(CMD_WRDISBV, &[level])
    }

    /// Push whatever changed in `fb` since the last flush.
    #[esp_hal::ram]
    pub fn flush(&mut self, fb: &mut FrameBuffer<'_>) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        if fb.width() != self.w || fb.height() != self.h {
            return Err(Co5300Error::OutOfBounds);
        }
        // the region only counts as shown once the panel accepted it
        fb.flush_with(|fb, rect| self.flush_rect(fb, &rect))
    }

    // Even start/end on both axes; the panel drops odd-aligned windows.
    #[esp_hal::ram]
    fn flush_rect(
        &mut self,
        fb: &FrameBuffer<'_>,
        rect: &Rectangle,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        let Some(br) = rect.bottom_right() else {
            return Ok(());
        };
        let x0 = (rect.top_left.x.max(0) as u16) & !1;
        let y0 = (rect.top_left.y.max(0) as u16) & !1;
        let x1 = ((br.x.max(0) as u16) | 1).min(self.w - 1);
        let y1 = ((br.y.max(0) as u16) | 1).min(self.h - 1);

        self.set_window(x0, y0, x1, y1)?;

        let mut first = true;
        let mut filled = 0usize;
        for y in y0..=y1 {
            for &px in fb.row(y, x0, x1) {
                if filled + 2 > self.stage.len() {
                    self.write_stage(filled, first)?;
                    first = false;
                    filled = 0;
                }
                self.stage[filled..filled + 2].copy_from_slice(&px.to_be_bytes());
                filled += 2;
            }
        }
        self.write_stage(filled, first)
    }

    fn write_stage(&mut self, len: usize, first: bool) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        if len == 0 {
            return Ok(());
        }
        // RAMWR starts at the window origin, RAMWRC continues where it left off
        let cmd = if first { CMD_RAMWR } else { CMD_RAMWRC };
        let hdr: [u8; 4] = [0x02, 0x00, cmd, 0x00];
        self.spi
            .transaction(&mut [Operation::Write(&hdr), Operation::Write(&self.stage[..len])])
            .map_err(Co5300Error::Spi)
    }

    fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        if x0 > x1 || y0 > y1 || x1 >= self.w || y1 >= self.h {
            return Err(Co5300Error::OutOfBounds);
        }
        let (x0, x1) = (x0 + X_OFFSET, x1 + X_OFFSET);
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.cmd(CMD_CASET, &[x0h, x0l, x1h, x1l])?;
        self.cmd(CMD_RASET, &[y0h, y0l, y1h, y1l])
    }

    fn cmd(&mut self, cmd: u8, data: &[u8]) -> Result<(), Co5300Error<SPI::Error, RST::Error>> {
        let hdr: [u8; 4] = [0x02, 0x00, cmd, 0x00];
        if data.is_empty() {
            self.spi.write(&hdr).map_err(Co5300Error::Spi)
        } else {
            self.spi
                .transaction(&mut [Operation::Write(&hdr), Operation::Write(data)])
                .map_err(Co5300Error::Spi)
        }
    }
}

// Panel at its native 466x466.
pub fn new_with_defaults<SPI, RST>(
    spi: SPI,
    rst: Option<RST>,
    delay: &mut impl DelayNs,
) -> Result<Co5300Display<SPI, RST>, Co5300Error<SPI::Error, RST::Error>>
where
    SPI: SpiDevice<u8>,
    RST: OutputPin,
{
    Co5300Display::new(spi, rst, delay, CO5300_WIDTH, CO5300_HEIGHT)
}
