#![cfg_attr(not(test), no_std)]

pub mod cache;
pub mod clock;
pub mod face;
pub mod framebuffer;
pub mod geometry;
pub mod input;
pub mod rtc_pcf85063;
pub mod settings;

#[cfg(feature = "esp32s3-disp143Oled")]
pub mod co5300;
#[cfg(feature = "esp32s3-disp143Oled")]
pub mod display;
#[cfg(feature = "esp32s3-disp143Oled")]
pub mod wiring;
