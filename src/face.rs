//! The "gravity" watch face.
//!
//! This module provides:
//! - `FaceConfig` presets for the dial and hand shapes
//! - `FaceContext`, which owns the pivot geometry, the true centre and the
//!   angle/point caches
//! - `WatchFace`, which tracks invalidation and draws the layers
//!   (dial, second, minute, hour) onto any `DrawTarget<Color = Rgb565>`

use embedded_graphics::{
    geometry::Angle,
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, Polyline, PrimitiveStyle, Rectangle, Triangle},
};
use log::info;

use crate::cache::{AngleCache, SecondPointCache, SecondPoints};
use crate::clock::{hour_sample, minute_sample, second_sample, ClockTime, Invalidation};
use crate::geometry::{
    project_point, rotate_about, AngleSample, GeometryError, PivotGeometry, MAX_RADIUS,
};
use crate::settings::FaceStyle;

/// Longest hand outline we rotate per frame.
pub const MAX_HAND_POINTS: usize = 8;

const PEBBLE_HOUR_HAND: [Point; 5] = [
    Point::new(-4, 2),
    Point::new(4, 2),
    Point::new(4, -30),
    Point::new(0, -40),
    Point::new(-4, -30),
];

const PEBBLE_MINUTE_HAND: [Point; 5] = [
    Point::new(-4, 2),
    Point::new(4, 2),
    Point::new(4, -55),
    Point::new(0, -65),
    Point::new(-4, -55),
];

// Same shapes, three times the size, for the 466x466 AMOLED.
const AMOLED_HOUR_HAND: [Point; 5] = [
    Point::new(-12, 6),
    Point::new(12, 6),
    Point::new(12, -90),
    Point::new(0, -120),
    Point::new(-12, -90),
];

const AMOLED_MINUTE_HAND: [Point; 5] = [
    Point::new(-12, 6),
    Point::new(12, 6),
    Point::new(12, -165),
    Point::new(0, -195),
    Point::new(-12, -165),
];

/// Dial and hand dimensions. Fixed for the life of a `WatchFace`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceConfig {
    /// True centre to dial rim, where the pips sit.
    pub dial_radius: u32,
    /// True centre to the virtual pivot, which sits above the centre on screen.
    pub pivot_offset: u32,
    pub pip_count: u16,
    pub pip_radius: u32,
    pub hub_radius: u32,
    /// Second-hand tip sits this far inside the rim.
    pub second_tip_inset: u32,
    /// Decorative ring on the second hand sits this far inside the rim.
    pub ring_inset: u32,
    pub ring_radius: u32,
    /// Hand outlines relative to the pivot, pointing at 12 o'clock.
    pub hour_hand: &'static [Point],
    pub minute_hand: &'static [Point],
}

impl FaceConfig {
    /// Original 144x168 layout.
    pub const PEBBLE: FaceConfig = FaceConfig {
        dial_radius: 70,
        pivot_offset: 25,
        pip_count: 12,
        pip_radius: 4,
        hub_radius: 4,
        second_tip_inset: 2,
        ring_inset: 8,
        ring_radius: 3,
        hour_hand: &PEBBLE_HOUR_HAND,
        minute_hand: &PEBBLE_MINUTE_HAND,
    };

    /// CO5300 466x466 round AMOLED.
    pub const AMOLED_466: FaceConfig = FaceConfig {
        dial_radius: 210,
        pivot_offset: 75,
        pip_count: 12,
        pip_radius: 12,
        hub_radius: 12,
        second_tip_inset: 6,
        ring_inset: 24,
        ring_radius: 9,
        hour_hand: &AMOLED_HOUR_HAND,
        minute_hand: &AMOLED_MINUTE_HAND,
    };
}

/// Owned per-face state: geometry, true centre and both caches.
///
/// Everything runs on the render loop; nothing here is shared across threads.
#[derive(Clone, Debug)]
pub struct FaceContext {
    geometry: PivotGeometry,
    center: Point,
    tip_length: i32,
    ring_length: i32,
    angles: AngleCache,
    seconds: SecondPointCache,
}

impl FaceContext {
    pub fn new(config: &FaceConfig, center: Point) -> Result<Self, GeometryError> {
        let geometry = PivotGeometry::new(config.dial_radius, config.pivot_offset)?;
        for radius in [config.pip_radius, config.hub_radius, config.ring_radius] {
            if radius > MAX_RADIUS {
                return Err(GeometryError::RadiusTooLarge { radius });
            }
        }
        Ok(Self {
            geometry,
            center,
            tip_length: config.dial_radius.saturating_sub(config.second_tip_inset) as i32,
            ring_length: config.dial_radius.saturating_sub(config.ring_inset) as i32,
            angles: AngleCache::new(),
            seconds: SecondPointCache::new(),
        })
    }

    pub fn geometry(&self) -> &PivotGeometry {
        &self.geometry
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn angle_cache(&self) -> &AngleCache {
        &self.angles
    }

    pub fn second_cache(&self) -> &SecondPointCache {
        &self.seconds
    }

    /// Corrected bearing for `sample`, cached when it lands on a whole degree.
    pub fn angle(&mut self, sample: AngleSample) -> Angle {
        let geometry = self.geometry;
        match sample.degree_index() {
            Some(index) => self
                .angles
                .get_or_insert_with(usize::from(index), || geometry.compute_angle(sample)),
            None => geometry.compute_angle(sample),
        }
    }

    /// Second-hand tip and ring centre for `second` (0-59).
    pub fn second_points(&mut self, second: u8) -> SecondPoints {
        let sample = second_sample(ClockTime {
            hour: 0,
            minute: 0,
            second: second % 60,
        });
        let (geometry, center) = (self.geometry, self.center);
        let (tip_length, ring_length) = (self.tip_length, self.ring_length);
        self.seconds
            .get_or_insert_with(usize::from(sample.count()), || {
                let angle = geometry.compute_angle(sample);
                SecondPoints {
                    tip: project_point(center, angle, tip_length),
                    ring: project_point(center, angle, ring_length),
                }
            })
    }
}

pub struct WatchFace {
    config: FaceConfig,
    context: FaceContext,
    style: FaceStyle,
    pending: Invalidation,
}

impl WatchFace {
    /// Builds a face centred in `bounds`. Rejects a pivot outside the dial.
    pub fn new(
        config: FaceConfig,
        bounds: Rectangle,
        style: FaceStyle,
    ) -> Result<Self, GeometryError> {
        let center = bounds.center();
        let context = FaceContext::new(&config, center)?;
        info!(
            "face: radius {} pivot {} centre ({}, {}) style {:?}",
            config.dial_radius, config.pivot_offset, center.x, center.y, style
        );
        Ok(Self {
            config,
            context,
            style,
            pending: Invalidation::ALL,
        })
    }

    pub fn config(&self) -> &FaceConfig {
        &self.config
    }

    pub fn context(&self) -> &FaceContext {
        &self.context
    }

    pub fn style(&self) -> FaceStyle {
        self.style
    }

    pub fn set_style(&mut self, style: FaceStyle) {
        if style != self.style {
            info!("face style {:?} -> {:?}", self.style, style);
            self.style = style;
            self.pending = Invalidation::ALL;
        }
    }

    /// One "time advanced" notification. Returns whether a redraw is due.
    pub fn tick(&mut self, time: ClockTime) -> bool {
        self.pending = self.pending.merge(Invalidation::for_tick(time));
        self.pending.any()
    }

    pub fn pending(&self) -> Invalidation {
        self.pending
    }

    pub fn needs_redraw(&self) -> bool {
        self.pending.any()
    }

    /// Paints the whole layer stack for `time` and clears the pending flags.
    ///
    /// Hands overlap each other and the dial, so any dirty layer repaints
    /// everything beneath and above it.
    pub fn draw<D>(&mut self, target: &mut D, time: ClockTime) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let (fg, bg) = self.style.colors();
        self.draw_dial(target, fg, bg)?;
        self.draw_second(target, fg, time)?;
        let minute = self.context.angle(minute_sample(time));
        self.draw_hand(target, self.config.minute_hand, minute, fg, bg)?;
        let hour = self.context.angle(hour_sample(time));
        self.draw_hand(target, self.config.hour_hand, hour, fg, bg)?;
        self.pending = Invalidation::NONE;
        Ok(())
    }

    fn draw_dial<D>(&mut self, target: &mut D, fg: Rgb565, bg: Rgb565) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        target.clear(bg)?;

        let fill = PrimitiveStyle::with_fill(fg);
        let center = self.context.center();
        let length = self.config.dial_radius as i32;
        for i in 0..self.config.pip_count {
            let Some(sample) = AngleSample::new(self.config.pip_count, i) else {
                continue;
            };
            let angle = self.context.angle(sample);
            let pip = project_point(center, angle, length);
            Circle::with_center(pip, self.config.pip_radius * 2 + 1)
                .into_styled(fill)
                .draw(target)?;
        }
        Circle::with_center(center, self.config.hub_radius * 2 + 1)
            .into_styled(fill)
            .draw(target)
    }

    fn draw_second<D>(&mut self, target: &mut D, fg: Rgb565, time: ClockTime) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let points = self.context.second_points(time.second);
        let stroke = PrimitiveStyle::with_stroke(fg, 1);
        Line::new(self.context.center(), points.tip)
            .into_styled(stroke)
            .draw(target)?;
        Circle::with_center(points.ring, self.config.ring_radius * 2 + 1)
            .into_styled(stroke)
            .draw(target)
    }

    fn draw_hand<D>(
        &self,
        target: &mut D,
        shape: &[Point],
        angle: Angle,
        fg: Rgb565,
        bg: Rgb565,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let center = self.context.center();
        let mut outline: heapless::Vec<Point, { MAX_HAND_POINTS + 1 }> = heapless::Vec::new();
        for &vertex in shape.iter().take(MAX_HAND_POINTS) {
            outline.push(rotate_about(center, vertex, angle)).ok();
        }
        if outline.len() < 3 {
            return Ok(());
        }

        // Convex outlines, so a fan from the first vertex covers them.
        let fill = PrimitiveStyle::with_fill(fg);
        for pair in outline[1..].windows(2) {
            Triangle::new(outline[0], pair[0], pair[1])
                .into_styled(fill)
                .draw(target)?;
        }

        let first = outline[0];
        outline.push(first).ok();
        Polyline::new(&outline)
            .into_styled(PrimitiveStyle::with_stroke(bg, 1))
            .draw(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ANGLE_SLOTS;
    use crate::framebuffer::FrameBuffer;

    const W: u16 = 144;
    const H: u16 = 168;

    fn at(hour: u8, minute: u8, second: u8) -> ClockTime {
        ClockTime::new(hour, minute, second).unwrap()
    }

    fn buffers() -> (Vec<u16>, Vec<u16>) {
        let len = W as usize * H as usize;
        (vec![0u16; len], vec![0u16; len])
    }

    fn pebble_face(style: FaceStyle) -> WatchFace {
        let bounds = Rectangle::new(Point::zero(), Size::new(W as u32, H as u32));
        WatchFace::new(FaceConfig::PEBBLE, bounds, style).unwrap()
    }

    #[test]
    fn pivot_outside_dial_is_fatal_at_construction() {
        let config = FaceConfig {
            pivot_offset: 70,
            ..FaceConfig::PEBBLE
        };
        let bounds = Rectangle::new(Point::zero(), Size::new(144, 168));
        assert!(matches!(
            WatchFace::new(config, bounds, FaceStyle::Classic),
            Err(GeometryError::PivotOutsideDial { .. })
        ));
    }

    #[test]
    fn oversized_radii_are_rejected() {
        let bounds = Rectangle::new(Point::zero(), Size::new(144, 168));
        let config = FaceConfig {
            ring_radius: u32::MAX,
            ..FaceConfig::PEBBLE
        };
        assert_eq!(
            WatchFace::new(config, bounds, FaceStyle::Classic).err(),
            Some(GeometryError::RadiusTooLarge { radius: u32::MAX })
        );
        let config = FaceConfig {
            dial_radius: u32::MAX,
            ..FaceConfig::PEBBLE
        };
        assert!(matches!(
            WatchFace::new(config, bounds, FaceStyle::Classic),
            Err(GeometryError::RadiusTooLarge { .. })
        ));
    }

    #[test]
    fn presets_are_valid() {
        for config in [FaceConfig::PEBBLE, FaceConfig::AMOLED_466] {
            assert!(PivotGeometry::new(config.dial_radius, config.pivot_offset).is_ok());
            assert!(config.hour_hand.len() <= MAX_HAND_POINTS);
            assert!(config.minute_hand.len() <= MAX_HAND_POINTS);
        }
    }

    #[test]
    fn second_points_are_cached_per_second() {
        let mut face = pebble_face(FaceStyle::Classic);
        let first = face.context.second_points(15);
        assert!(face.context().second_cache().is_cached(15));
        assert_eq!(face.context.second_points(15), first);
        assert_eq!(face.context().second_cache().len(), 1);

        let center = face.context().center();
        assert_eq!(face.context.second_points(0).tip, center - Point::new(0, 68));
        assert_eq!(face.context.second_points(0).ring, center - Point::new(0, 62));
    }

    #[test]
    fn pips_and_hands_share_the_angle_table() {
        let mut face = pebble_face(FaceStyle::Classic);
        let pip = face.context.angle(AngleSample::new(12, 3).unwrap());
        assert!(face.context().angle_cache().is_cached(90));
        let hand = face.context.angle(hour_sample(at(3, 0, 0)));
        assert_eq!(pip, hand);
        assert_eq!(face.context().angle_cache().len(), 1);
    }

    #[test]
    fn uncached_divisions_still_compute() {
        let mut face = pebble_face(FaceStyle::Classic);
        let sample = AngleSample::new(7, 3).unwrap();
        let angle = face.context.angle(sample);
        assert_eq!(angle, face.context().geometry().compute_angle(sample));
        assert!(face.context().angle_cache().is_empty());
    }

    #[test]
    fn draws_dial_and_hands() {
        let (mut pixels, mut shown) = buffers();
        let mut fb = FrameBuffer::new(&mut pixels, &mut shown, W, H).unwrap();
        let mut face = pebble_face(FaceStyle::Classic);
        let center = face.context().center();
        let (fg, bg) = FaceStyle::Classic.colors();

        face.draw(&mut fb, at(10, 10, 30)).unwrap();

        assert_eq!(fb.pixel(center), Some(fg));
        assert_eq!(fb.pixel(center - Point::new(0, 70)), Some(fg));
        assert_eq!(fb.pixel(center + Point::new(0, 70)), Some(fg));
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(bg));
        // second hand at 30s runs straight down
        assert_eq!(fb.pixel(center + Point::new(0, 40)), Some(fg));
        assert!(!face.needs_redraw());
    }

    #[test]
    fn minute_hand_covers_its_path() {
        let (mut pixels, mut shown) = buffers();
        let mut fb = FrameBuffer::new(&mut pixels, &mut shown, W, H).unwrap();
        let mut face = pebble_face(FaceStyle::Classic);
        let center = face.context().center();
        let (fg, _) = FaceStyle::Classic.colors();

        // 0:00:05 keeps every hand at 12 except the second hand; the hour
        // hand outline crosses the column at its tip (dy 40)
        face.draw(&mut fb, at(0, 0, 5)).unwrap();
        for dy in (5..=35).chain(45..=60) {
            assert_eq!(fb.pixel(center - Point::new(0, dy)), Some(fg), "dy {dy}");
        }
        assert!(face.context().angle_cache().len() < ANGLE_SLOTS);
    }

    #[test]
    fn second_tick_only_dirties_near_the_second_hand() {
        let (mut pixels, mut shown) = buffers();
        let mut fb = FrameBuffer::new(&mut pixels, &mut shown, W, H).unwrap();
        let mut face = pebble_face(FaceStyle::Classic);

        face.draw(&mut fb, at(6, 0, 20)).unwrap();
        fb.take_dirty();

        assert!(face.tick(at(6, 0, 21)));
        let pending = face.pending();
        assert!(pending.second && !pending.minute && !pending.hour);
        face.draw(&mut fb, at(6, 0, 21)).unwrap();

        let dirty = fb.take_dirty().unwrap();
        let center = face.context().center();
        // 20s and 21s sit in the lower-right quadrant
        assert!(dirty.top_left.x >= center.x - 1);
        assert!(dirty.top_left.y >= center.y - 6);
    }

    #[test]
    fn restyle_invalidates_everything() {
        let (mut pixels, mut shown) = buffers();
        let mut fb = FrameBuffer::new(&mut pixels, &mut shown, W, H).unwrap();
        let mut face = pebble_face(FaceStyle::Classic);
        face.draw(&mut fb, at(1, 2, 3)).unwrap();
        fb.take_dirty();

        face.set_style(FaceStyle::Classic);
        assert!(!face.needs_redraw());

        face.set_style(FaceStyle::Inverted);
        assert_eq!(face.pending(), Invalidation::ALL);
        face.draw(&mut fb, at(1, 2, 3)).unwrap();
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::WHITE));
        assert_eq!(fb.take_dirty(), Some(fb.bounding_box()));
    }
}
