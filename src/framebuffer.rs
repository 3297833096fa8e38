//! RGB565 framebuffer that reports what changed since the last flush.
//!
//! The face repaints every layer on each tick. Instead of tracking writes,
//! `dirty` compares the working frame against a copy of what the panel
//! last received, so pixels that are cleared and then painted back to the
//! same value do not count.

use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
    Pixel,
};

pub struct FrameBuffer<'fb> {
    pixels: &'fb mut [u16],
    // contents of the panel as of the last successful flush
    shown: &'fb mut [u16],
    w: u16,
    h: u16,
    full: bool,
}

impl<'fb> FrameBuffer<'fb> {
    /// `None` unless both slices hold exactly `width * height` entries.
    ///
    /// The first flush covers the whole panel, since nothing is known
    /// about what it currently shows.
    pub fn new(
        pixels: &'fb mut [u16],
        shown: &'fb mut [u16],
        width: u16,
        height: u16,
    ) -> Option<Self> {
        let len = (width as usize) * (height as usize);
        if len == 0 || pixels.len() != len || shown.len() != len {
            return None;
        }
        Some(Self {
            pixels,
            shown,
            w: width,
            h: height,
            full: true,
        })
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.h
    }

    pub fn pixel(&self, p: Point) -> Option<Rgb565> {
        let (x, y) = self.in_bounds(p)?;
        Some(RawU16::new(self.pixels[self.index(x, y)]).into())
    }

    /// Raw RGB565 values of row `y`, columns `x0..=x1`.
    ///
    /// Out-of-range coordinates are clipped to the buffer.
    pub fn row(&self, y: u16, x0: u16, x1: u16) -> &[u16] {
        if y >= self.h || x0 > x1 || x0 >= self.w {
            return &[];
        }
        let x1 = x1.min(self.w - 1);
        let start = self.index(x0, y);
        let end = self.index(x1, y) + 1;
        &self.pixels[start..end]
    }

    /// Forces the next flush to cover the whole panel.
    pub fn mark_all_dirty(&mut self) {
        self.full = true;
    }

    /// Smallest rectangle holding every pixel that differs from the last
    /// flushed frame, inclusive. Does not change what counts as shown.
    pub fn dirty(&self) -> Option<Rectangle> {
        if self.full {
            return Some(self.bounding_box());
        }

        let w = self.w as usize;
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for (y, (row, shown)) in self
            .pixels
            .chunks_exact(w)
            .zip(self.shown.chunks_exact(w))
            .enumerate()
        {
            let Some(first) = row.iter().zip(shown).position(|(a, b)| a != b) else {
                continue;
            };
            let last = row
                .iter()
                .zip(shown)
                .rposition(|(a, b)| a != b)
                .unwrap_or(first);
            bounds = Some(match bounds {
                Some((x0, y0, x1, _)) => (x0.min(first), y0, x1.max(last), y),
                None => (first, y, last, y),
            });
        }

        let (x0, y0, x1, y1) = bounds?;
        Some(Rectangle::with_corners(
            Point::new(x0 as i32, y0 as i32),
            Point::new(x1 as i32, y1 as i32),
        ))
    }

    /// Hands the dirty region to `send` and records it as shown only when
    /// `send` succeeds. A failed send leaves the region dirty for the next
    /// attempt.
    pub fn flush_with<E, F>(&mut self, send: F) -> Result<(), E>
    where
        F: FnOnce(&Self, Rectangle) -> Result<(), E>,
    {
        let Some(rect) = self.dirty() else {
            return Ok(());
        };
        send(&*self, rect)?;
        self.commit(&rect);
        Ok(())
    }

    /// Like `flush_with` for a send that cannot fail: returns the dirty
    /// region and records it as shown.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        let rect = self.dirty()?;
        self.commit(&rect);
        Some(rect)
    }

    fn commit(&mut self, rect: &Rectangle) {
        let area = rect.intersection(&self.bounding_box());
        if let Some(br) = area.bottom_right() {
            let w = self.w as usize;
            let (x0, x1) = (area.top_left.x as usize, br.x as usize);
            for y in area.top_left.y as usize..=br.y as usize {
                let span = y * w + x0..=y * w + x1;
                self.shown[span.clone()].copy_from_slice(&self.pixels[span]);
            }
        }
        if area == self.bounding_box() {
            self.full = false;
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    #[inline]
    fn in_bounds(&self, p: Point) -> Option<(u16, u16)> {
        if p.x < 0 || p.y < 0 || p.x >= self.w as i32 || p.y >= self.h as i32 {
            return None;
        }
        Some((p.x as u16, p.y as u16))
    }

    #[inline]
    fn set(&mut self, x: u16, y: u16, raw: u16) {
        let i = self.index(x, y);
        self.pixels[i] = raw;
    }
}

// -------------------- embedded-graphics integration --------------------
impl OriginDimensions for FrameBuffer<'_> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for FrameBuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        for Pixel(p, c) in pixels {
            if let Some((x, y)) = self.in_bounds(p) {
                self.set(x, y, c.into_storage());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let raw = color.into_storage();
        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set(x as u16, y as u16, raw);
            }
        }
        Ok(())
    }
}
