//! Button input handling.
//!
//! This module provides:
//! - `Debouncer`, a falling-edge debounce that works on plain level/time
//!   samples (host-testable)
//! - `ButtonState` and `handle_button_generic` to run it from the GPIO
//!   interrupt on the watch
//!
//! The face has a single button; a press toggles the colour scheme.

/// Falling-edge detector with a minimum gap between accepted presses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Debouncer {
    last_high: bool,
    last_press_ms: u64,
    debounce_ms: u64,
}

impl Debouncer {
    /// Starts released (pull-up idles high).
    pub const fn new(debounce_ms: u64) -> Self {
        Self {
            last_high: true,
            last_press_ms: 0,
            debounce_ms,
        }
    }

    /// Feeds one level sample; returns `true` for an accepted press.
    pub fn update(&mut self, level_is_low: bool, now_ms: u64) -> bool {
        let was_high = self.last_high;
        self.last_high = !level_is_low;

        if was_high
            && level_is_low
            && now_ms.saturating_sub(self.last_press_ms) > self.debounce_ms
        {
            self.last_press_ms = now_ms;
            return true;
        }
        false
    }
}

#[cfg(feature = "esp32s3-disp143Oled")]
pub use isr::{handle_button_generic, ButtonState};

#[cfg(feature = "esp32s3-disp143Oled")]
mod isr {
    use core::cell::{Cell, RefCell};

    use critical_section::Mutex;
    use esp_hal::gpio::Input;

    use super::Debouncer;

    // Button state shared between the interrupt and the main loop
    pub struct ButtonState<'a> {
        pub input: Mutex<RefCell<Option<Input<'a>>>>,
        pub debouncer: Mutex<Cell<Debouncer>>,
    }

    impl ButtonState<'_> {
        pub const fn new(debounce_ms: u64) -> Self {
            Self {
                input: Mutex::new(RefCell::new(None)),
                debouncer: Mutex::new(Cell::new(Debouncer::new(debounce_ms))),
            }
        }
    }

    // Handle button press events
    pub fn handle_button_generic(btn: &ButtonState, now_ms: u64, on_press: impl Fn()) {
        critical_section::with(|cs| {
            let mut btn_binding = btn.input.borrow_ref_mut(cs);
            let Some(input) = btn_binding.as_mut() else {
                return;
            };

            // Check if interrupt is actually pending
            if !input.is_interrupt_set() {
                return;
            }
            input.clear_interrupt();

            let cell = btn.debouncer.borrow(cs);
            let mut debouncer = cell.get();
            let pressed = debouncer.update(input.is_low(), now_ms);
            cell.set(debouncer);

            if pressed {
                on_press();
            }
        });
    }
}
