//! Wall-clock fields to hand positions, and the per-second redraw schedule.

use crate::geometry::AngleSample;

/// Steps per turn of the second hand.
pub const SECOND_DIVISIONS: u16 = 60;
/// Steps per turn of the hour and minute hands.
pub const HAND_DIVISIONS: u16 = 360;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u8,   // 0-23
    pub minute: u8, // 0-59
    pub second: u8, // 0-59
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime {
        hour: 0,
        minute: 0,
        second: 0,
    };

    pub const fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour < 24 && minute < 60 && second < 60 {
            Some(Self {
                hour,
                minute,
                second,
            })
        } else {
            None
        }
    }
}

/// Second hand: one step per second.
pub const fn second_sample(time: ClockTime) -> AngleSample {
    AngleSample::wrapping(SECOND_DIVISIONS, time.second as u16)
}

/// Minute hand: six steps per minute, one every ten seconds.
pub const fn minute_sample(time: ClockTime) -> AngleSample {
    let minute = (time.minute % 60) as u16;
    let second = (time.second % 60) as u16;
    AngleSample::wrapping(HAND_DIVISIONS, minute * 6 + second / 10)
}

/// Hour hand: thirty steps per hour, one every two minutes. 0h and 12h share a position.
pub const fn hour_sample(time: ClockTime) -> AngleSample {
    let hour = (time.hour % 12) as u16;
    let minute = (time.minute % 60) as u16;
    AngleSample::wrapping(HAND_DIVISIONS, hour * 30 + minute / 2)
}

/// Which layers changed since the last redraw.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub dial: bool,
    pub hour: bool,
    pub minute: bool,
    pub second: bool,
}

impl Invalidation {
    pub const NONE: Invalidation = Invalidation {
        dial: false,
        hour: false,
        minute: false,
        second: false,
    };

    pub const ALL: Invalidation = Invalidation {
        dial: true,
        hour: true,
        minute: true,
        second: true,
    };

    /// Layers whose hand moved on this tick. The minute hand only steps on
    /// multiples of ten seconds, the hour hand on even minutes.
    pub const fn for_tick(time: ClockTime) -> Self {
        Self {
            dial: false,
            hour: time.second == 0 && time.minute % 2 == 0,
            minute: time.second % 10 == 0,
            second: true,
        }
    }

    pub const fn any(self) -> bool {
        self.dial || self.hour || self.minute || self.second
    }

    pub const fn merge(self, other: Invalidation) -> Self {
        Self {
            dial: self.dial || other.dial,
            hour: self.hour || other.hour,
            minute: self.minute || other.minute,
            second: self.second || other.second,
        }
    }
}

/// Turns a polled time source into at most one tick per wall-clock second.
#[derive(Clone, Debug, Default)]
pub struct SecondTicker {
    last: Option<ClockTime>,
}

impl SecondTicker {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub fn poll(&mut self, now: ClockTime) -> Option<ClockTime> {
        if self.last == Some(now) {
            return None;
        }
        self.last = Some(now);
        Some(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u8, minute: u8, second: u8) -> ClockTime {
        ClockTime::new(hour, minute, second).unwrap()
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(ClockTime::new(24, 0, 0).is_none());
        assert!(ClockTime::new(0, 60, 0).is_none());
        assert!(ClockTime::new(0, 0, 60).is_none());
        assert_eq!(ClockTime::new(0, 0, 0), Some(ClockTime::MIDNIGHT));
    }

    #[test]
    fn second_hand_uses_sixty_steps() {
        let sample = second_sample(at(3, 4, 59));
        assert_eq!((sample.divisions(), sample.count()), (60, 59));
    }

    #[test]
    fn minute_hand_steps_every_ten_seconds() {
        assert_eq!(minute_sample(at(0, 5, 23)).count(), 32);
        assert_eq!(minute_sample(at(0, 5, 29)).count(), 32);
        assert_eq!(minute_sample(at(0, 5, 30)).count(), 33);
        assert_eq!(minute_sample(at(0, 59, 59)).count(), 359);
        assert_eq!(minute_sample(at(0, 0, 0)).divisions(), 360);
    }

    #[test]
    fn hour_hand_steps_every_two_minutes() {
        assert_eq!(hour_sample(at(3, 0, 0)).count(), 90);
        assert_eq!(hour_sample(at(3, 1, 0)).count(), 90);
        assert_eq!(hour_sample(at(3, 2, 0)).count(), 91);
        assert_eq!(hour_sample(at(11, 59, 59)).count(), 359);
    }

    #[test]
    fn midnight_and_noon_share_a_position() {
        for minute in 0..60 {
            assert_eq!(hour_sample(at(0, minute, 0)), hour_sample(at(12, minute, 0)));
        }
        assert_eq!(hour_sample(at(23, 30, 0)), hour_sample(at(11, 30, 0)));
    }

    #[test]
    fn every_sample_fits_the_angle_table() {
        for minute in 0..60 {
            for second in 0..60 {
                let time = at(17, minute, second);
                for sample in [second_sample(time), minute_sample(time), hour_sample(time)] {
                    assert!(sample.degree_index().unwrap() < 360);
                }
            }
        }
    }

    #[test]
    fn tick_marks_minute_every_ten_seconds() {
        let marked: Vec<u8> = (0..60)
            .filter(|&s| Invalidation::for_tick(at(1, 1, s)).minute)
            .collect();
        assert_eq!(marked, [0, 10, 20, 30, 40, 50]);
        assert!((0..60).all(|s| Invalidation::for_tick(at(1, 1, s)).second));
    }

    #[test]
    fn tick_marks_hour_on_even_minutes() {
        assert!(Invalidation::for_tick(at(1, 2, 0)).hour);
        assert!(!Invalidation::for_tick(at(1, 3, 0)).hour);
        assert!(!Invalidation::for_tick(at(1, 2, 1)).hour);
        assert!(!Invalidation::for_tick(at(1, 2, 0)).dial);
    }

    #[test]
    fn merge_keeps_pending_layers() {
        let pending = Invalidation::NONE.merge(Invalidation::for_tick(at(0, 0, 10)));
        assert!(pending.minute && pending.second && !pending.hour);
        assert!(!Invalidation::NONE.any());
        assert_eq!(Invalidation::ALL.merge(Invalidation::NONE), Invalidation::ALL);
    }

    #[test]
    fn ticker_emits_once_per_second() {
        let mut ticker = SecondTicker::new();
        assert_eq!(ticker.poll(at(9, 0, 0)), Some(at(9, 0, 0)));
        assert_eq!(ticker.poll(at(9, 0, 0)), None);
        assert_eq!(ticker.poll(at(9, 0, 1)), Some(at(9, 0, 1)));
        // clock set backwards still ticks
        assert_eq!(ticker.poll(at(8, 0, 0)), Some(at(8, 0, 0)));
    }
}
