//! Display bring-up for the CO5300 466x466 AMOLED.
//
// - `setup_display` powers the panel, builds the SPI DMA bus and runs the
//   panel init sequence.
// - Drawing goes to a `FrameBuffer`; `Co5300Display::flush` sends the dirty part.

use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::{
    dma::{DmaRxBuf, DmaTxBuf},
    dma_buffers,
    gpio::Output,
    spi::master::{Config, Spi, SpiDmaBus},
    spi::Mode,
    time::Rate,
    Blocking,
};

use crate::co5300::{self, Co5300Display};
use crate::wiring::DisplayPins;

// A tiny busy-wait delay that satisfies embedded-hal 1.0 DelayNs.
pub struct SpinDelay;

impl DelayNs for SpinDelay {
    #[inline]
    fn delay_ns(&mut self, ns: u32) {
        let mut n = ns / 50 + 1;
        while n != 0 {
            core::hint::spin_loop();
            n -= 1;
        }
    }
    #[inline]
    fn delay_us(&mut self, us: u32) {
        for _ in 0..us {
            self.delay_ns(1_000);
        }
    }
    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}

pub type DisplayType<'a> =
    Co5300Display<ExclusiveDevice<SpiDmaBus<'a, Blocking>, Output<'a>, NoDelay>, Output<'a>>;

pub fn setup_display<'a>(display_pins: DisplayPins<'a>) -> DisplayType<'a> {
    let DisplayPins {
        spi2,
        cs,
        clk,
        do0,
        rst,
        mut en,
        dma_ch0,
    } = display_pins;

    let mut delay = SpinDelay;

    // Power cycle the panel rails
    en.set_low();
    delay.delay_ms(10);
    en.set_high();
    delay.delay_ms(100);

    // 60 MHz is stable in standard SPI mode
    let spi = Spi::new(
        spi2,
        Config::default()
            .with_frequency(Rate::from_hz(60_000_000))
            .with_mode(Mode::_0),
    )
    .expect("SPI2 config rejected")
    .with_sck(clk)
    .with_mosi(do0)
    .with_dma(dma_ch0);

    let (rx_buf, rx_desc, tx_buf, tx_desc) = dma_buffers!(4096, co5300::DMA_CHUNK);
    let rx = DmaRxBuf::new(rx_desc, rx_buf).expect("DMA rx buffer");
    let tx = DmaTxBuf::new(tx_desc, tx_buf).expect("DMA tx buffer");

    let spi_bus: SpiDmaBus<'_, Blocking> = spi.with_buffers(rx, tx);
    let spi_dev = ExclusiveDevice::new(spi_bus, cs, NoDelay).expect("SPI device");

    co5300::new_with_defaults(spi_dev, Some(rst), &mut delay).expect("CO5300 init failed")
}
