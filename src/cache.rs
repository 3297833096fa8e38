//! Lazily filled lookup tables for geometry results.
//!
//! Pivot geometry never changes after startup, so a slot is computed on first
//! use and kept for the life of the face. Presence is tracked with `Option`;
//! no data value doubles as an "unset" marker.

use embedded_graphics::geometry::{Angle, Point};
use log::debug;

/// One slot per degree of a turn.
pub const ANGLE_SLOTS: usize = 360;
/// One slot per second of a minute.
pub const SECOND_SLOTS: usize = 60;

/// Second-hand tip and the centre of its decorative ring.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SecondPoints {
    pub tip: Point,
    pub ring: Point,
}

/// Fixed-size memo table keyed by a small index.
#[derive(Clone, Debug)]
pub struct SlotCache<T, const N: usize> {
    slots: [Option<T>; N],
}

impl<T: Copy, const N: usize> SlotCache<T, N> {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; N],
        }
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.slots.get(index).copied().flatten()
    }

    pub fn is_cached(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored value, or runs `compute` once and stores its result.
    ///
    /// Indices past the table are computed every time and never stored.
    pub fn get_or_insert_with<F>(&mut self, index: usize, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self.slots.get_mut(index) {
            Some(Some(value)) => *value,
            Some(slot) => {
                let value = compute();
                *slot = Some(value);
                debug!("cache slot {}/{} filled", index, N);
                value
            }
            None => compute(),
        }
    }
}

impl<T: Copy, const N: usize> Default for SlotCache<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

pub type AngleCache = SlotCache<Angle, ANGLE_SLOTS>;
pub type SecondPointCache = SlotCache<SecondPoints, SECOND_SLOTS>;
