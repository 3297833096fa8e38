//! Off-centre pivot geometry.
//!
//! The hands hang from a virtual pivot that sits `pivot_offset` pixels from
//! the true dial centre, straight above it on screen. A time division is evenly
//! spaced as seen from that pivot, but the tip has to land on the dial circle
//! of `dial_radius` around the true centre. True centre, pivot and dial point
//! form a side-side-angle triangle; the law of sines gives the bearing of the
//! dial point from the true centre, which is what the renderer rotates by.
//!
//! Everything here is a pure function of its inputs. Caching lives in
//! [`crate::cache`], ownership of the centre point in [`crate::face`].

use core::f32::consts::TAU;
use core::fmt;

use embedded_graphics::geometry::{Angle, Point};

/// Largest radius a face accepts, so pixel arithmetic stays well inside `i32`.
pub const MAX_RADIUS: u32 = 1 << 15;

/// Rejected pivot configuration. Detected once at startup, never per frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GeometryError {
    ZeroRadius,
    RadiusTooLarge { radius: u32 },
    /// `asin` in the triangle solve is only defined while the pivot stays
    /// inside the dial.
    PivotOutsideDial { pivot_offset: u32, dial_radius: u32 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::ZeroRadius => write!(f, "dial radius must be positive"),
            GeometryError::RadiusTooLarge { radius } => {
                write!(f, "radius {} exceeds the limit of {}", radius, MAX_RADIUS)
            }
            GeometryError::PivotOutsideDial {
                pivot_offset,
                dial_radius,
            } => write!(
                f,
                "pivot offset {} must be smaller than dial radius {}",
                pivot_offset, dial_radius
            ),
        }
    }
}

/// `count` steps out of `divisions` around a full turn.
///
/// Construction guarantees `divisions > 0` and `count < divisions`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AngleSample {
    divisions: u16,
    count: u16,
}

impl AngleSample {
    pub const fn new(divisions: u16, count: u16) -> Option<Self> {
        if divisions == 0 || count >= divisions {
            None
        } else {
            Some(Self { divisions, count })
        }
    }

    // Callers pass a non-zero constant for `divisions`.
    pub(crate) const fn wrapping(divisions: u16, count: u16) -> Self {
        Self {
            divisions,
            count: count % divisions,
        }
    }

    pub const fn divisions(self) -> u16 {
        self.divisions
    }

    pub const fn count(self) -> u16 {
        self.count
    }

    /// Position of this sample on a 360-step turn, if it lands exactly on one.
    ///
    /// 12, 60 and 360 division samples all map here, so they can share one
    /// angle table.
    pub const fn degree_index(self) -> Option<u16> {
        if 360 % self.divisions != 0 {
            return None;
        }
        Some(self.count * (360 / self.divisions))
    }
}

/// Dial radius and pivot offset, fixed for the life of the face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PivotGeometry {
    dial_radius: u32,
    pivot_offset: u32,
    // pivot_offset / dial_radius, always in [0, 1)
    ratio: f32,
}

impl PivotGeometry {
    /// Validates `pivot_offset < dial_radius`.
    ///
    /// An offset of zero is accepted and degenerates to plain circular
    /// division.
    pub fn new(dial_radius: u32, pivot_offset: u32) -> Result<Self, GeometryError> {
        if dial_radius == 0 {
            return Err(GeometryError::ZeroRadius);
        }
        if dial_radius > MAX_RADIUS {
            return Err(GeometryError::RadiusTooLarge {
                radius: dial_radius,
            });
        }
        if pivot_offset >= dial_radius {
            return Err(GeometryError::PivotOutsideDial {
                pivot_offset,
                dial_radius,
            });
        }
        Ok(Self {
            dial_radius,
            pivot_offset,
            ratio: pivot_offset as f32 / dial_radius as f32,
        })
    }

    pub fn dial_radius(&self) -> u32 {
        self.dial_radius
    }

    pub fn pivot_offset(&self) -> u32 {
        self.pivot_offset
    }

    /// Clockwise bearing from 12 o'clock, seen from the true centre, of the
    /// dial point that sits `sample` of a turn around the virtual pivot.
    ///
    /// With `v = π + θ` the virtual angle and `θ = 2π·count/divisions`, the
    /// triangle gives `π − v − asin(k·sin v)` counter-clockwise, which is
    /// `θ − asin(k·sin θ)` clockwise. Working in `θ` keeps `count = 0`
    /// exactly at zero since `sin(0)` is exact. `k < 1` holds by
    /// construction, so the `asin` argument never leaves `(-1, 1)`.
    pub fn compute_angle(&self, sample: AngleSample) -> Angle {
        let theta = TAU / f32::from(sample.divisions) * f32::from(sample.count);
        let x = self.ratio * libm::sinf(theta);
        Angle::from_radians(theta - libm::asinf(x))
    }
}

/// Point `length` pixels from `center` along a clockwise-from-12 `angle`.
pub fn project_point(center: Point, angle: Angle, length: i32) -> Point {
    let radians = angle.to_radians();
    let length = length as f32;
    Point::new(
        center.x + libm::roundf(libm::sinf(radians) * length) as i32,
        center.y - libm::roundf(libm::cosf(radians) * length) as i32,
    )
}

/// Rotates a vertex given relative to the pivot clockwise by `angle`, then
/// moves it onto `center`.
///
/// `project_point(c, a, l)` equals `rotate_about(c, Point::new(0, -l), a)`.
pub fn rotate_about(center: Point, offset: Point, angle: Angle) -> Point {
    let radians = angle.to_radians();
    let (sin, cos) = (libm::sinf(radians), libm::cosf(radians));
    let (x, y) = (offset.x as f32, offset.y as f32);
    Point::new(
        center.x + libm::roundf(x * cos - y * sin) as i32,
        center.y + libm::roundf(x * sin + y * cos) as i32,
    )
}
