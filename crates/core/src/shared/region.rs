use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle locating a face or an eye in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region spanning the corner coordinates `(x1, y1)`-`(x2, y2)`, rounded
    /// outward to whole pixels.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let left = x1.floor() as i32;
        let top = y1.floor() as i32;
        let right = x2.ceil() as i32;
        let bottom = y2.ceil() as i32;
        Self::new(left, top, (right - left).max(0), (bottom - top).max(0))
    }

    /// Square of side `size` centred on `(cx, cy)`.
    pub fn centered_square(cx: f64, cy: f64, size: f64) -> Self {
        let half = size / 2.0;
        Self::from_corners(cx - half, cy - half, cx + half, cy + half)
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Intersection with the `width` x `height` image rectangle, or `None`
    /// when nothing of the region is inside.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = (self.x + self.width).min(width as i32);
        let y2 = (self.y + self.height).min(height as i32);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, x2 - x1, y2 - y1))
    }
}
