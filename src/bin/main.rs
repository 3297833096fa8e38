//! Gravity watch face firmware
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! ========================================
//!
//! Draws the offset-pivot face on the CO5300 AMOLED, keeps time from the
//! PCF85063 and flips the colour scheme on each BOOT button press.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

esp_bootloader_esp_idf::esp_app_desc!();

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_graphics::geometry::Dimensions;
use embedded_hal::delay::DelayNs;
use esp_backtrace as _;
use esp_hal::{
    delay::Delay,
    handler,
    i2c::master::{Config as I2cConfig, I2c},
    main, psram, ram,
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Blocking, Config,
};
use log::{error, info, warn, LevelFilter};

use gravity_face::{
    clock::{ClockTime, SecondTicker},
    co5300::{CO5300_HEIGHT, CO5300_WIDTH},
    display::setup_display,
    face::{FaceConfig, WatchFace},
    framebuffer::FrameBuffer,
    input::{handle_button_generic, ButtonState},
    rtc_pcf85063::Pcf85063,
    settings::{FaceStyle, Settings, SettingsStore},
    wiring::{init_board_pins, BoardPins, RtcPins},
};

extern crate alloc;
use alloc::{boxed::Box, vec};

const DEBOUNCE_MS: u64 = 240;
// RTC poll period; the ticker filters repeats within one second
const POLL_MS: u32 = 100;
// AMOLED level for an always-on face (0-255)
const PANEL_BRIGHTNESS: u8 = 0xB0;

static BUTTON_PRESSED: AtomicBool = AtomicBool::new(false);
static STYLE_BUTTON: ButtonState<'static> = ButtonState::new(DEBOUNCE_MS);

fn now_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

// Fallback when the RTC has lost its time: count from midnight at boot.
fn uptime_clock(ms: u64) -> ClockTime {
    let secs = ms / 1000;
    ClockTime {
        hour: ((secs / 3600) % 24) as u8,
        minute: ((secs / 60) % 60) as u8,
        second: (secs % 60) as u8,
    }
}

#[handler]
#[ram]
fn handler() {
    handle_button_generic(&STYLE_BUTTON, now_ms(), || {
        BUTTON_PRESSED.store(true, Ordering::Relaxed);
    });
}

fn read_time<S>(rtc: &mut Pcf85063<S>) -> ClockTime
where
    S: embedded_hal::i2c::I2c,
{
    match rtc.read_clock() {
        Ok(Some(time)) => time,
        Ok(None) => uptime_clock(now_ms()),
        Err(e) => {
            warn!("rtc read failed: {:?}", e);
            uptime_clock(now_ms())
        }
    }
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);

    let peripherals = esp_hal::init(Config::default());
    esp_alloc::psram_allocator!(&peripherals.PSRAM, psram);

    let (mut io, pins) = init_board_pins(peripherals);
    let BoardPins {
        btn,
        display_pins,
        rtc_pins,
    } = pins;

    critical_section::with(|cs| {
        STYLE_BUTTON.input.borrow_ref_mut(cs).replace(btn);
    });
    io.set_interrupt_handler(handler);

    let mut display = setup_display(display_pins);
    if let Err(e) = display.set_brightness(PANEL_BRIGHTNESS) {
        warn!("brightness: {}", e);
    }

    // working frame plus a copy of what the panel shows, both in PSRAM
    const PIXELS: usize = CO5300_WIDTH as usize * CO5300_HEIGHT as usize;
    let pixels: &'static mut [u16] = Box::leak(vec![0u16; PIXELS].into_boxed_slice());
    let shown: &'static mut [u16] = Box::leak(vec![0u16; PIXELS].into_boxed_slice());
    let Some(mut fb) = FrameBuffer::new(pixels, shown, CO5300_WIDTH, CO5300_HEIGHT) else {
        panic!("framebuffer size mismatch");
    };

    let RtcPins { i2c0, sda, scl } = rtc_pins;
    let i2c: I2c<'static, Blocking> =
        match I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400))) {
            Ok(i2c) => i2c.with_sda(sda).with_scl(scl),
            Err(e) => panic!("I2C0 config rejected: {:?}", e),
        };
    let mut rtc = Pcf85063::new(i2c);

    let style = match rtc.load() {
        Ok(Some(settings)) => settings.style,
        Ok(None) => FaceStyle::default(),
        Err(e) => {
            warn!("{}; using default style", e);
            FaceStyle::default()
        }
    };

    let mut face = match WatchFace::new(FaceConfig::AMOLED_466, fb.bounding_box(), style) {
        Ok(face) => face,
        Err(e) => panic!("face geometry: {}", e),
    };

    let mut ticker = SecondTicker::new();
    let mut delay = Delay::new();
    let mut time = read_time(&mut rtc);
    info!(
        "gravity face up at {:02}:{:02}:{:02}",
        time.hour, time.minute, time.second
    );

    loop {
        if let Some(now) = ticker.poll(read_time(&mut rtc)) {
            time = now;
            face.tick(now);
        }

        if BUTTON_PRESSED.swap(false, Ordering::Acquire) {
            let style = face.style().toggled();
            face.set_style(style);
            if let Err(e) = rtc.save(&Settings { style }) {
                warn!("{}", e);
            }
        }

        if face.needs_redraw() {
            let Ok(()) = face.draw(&mut fb, time);
            if let Err(e) = display.flush(&mut fb) {
                error!("flush failed: {}", e);
            }
        }

        delay.delay_ms(POLL_MS);
    }
}
