use crate::shared::region::Region;

/// Eye box side as a fraction of the inter-eye distance.
const EYE_BOX_RATIO: f64 = 0.3;

/// Smallest eye box side in pixels.
const MIN_EYE_BOX: f64 = 2.0;

/// A complete pair of detected eyes, in image coordinates.
///
/// "Left" is the eye with the smaller x coordinate in the image. A pair with
/// only one eye cannot be represented; see [`EyePair::from_slots`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EyePair {
    left: Region,
    right: Region,
}

impl EyePair {
    pub fn new(left: Region, right: Region) -> Self {
        if left.center().0 <= right.center().0 {
            Self { left, right }
        } else {
            Self {
                left: right,
                right: left,
            }
        }
    }

    /// Builds a pair only when both slots are filled and non-empty.
    pub fn from_slots(left: Option<Region>, right: Option<Region>) -> Option<Self> {
        match (left, right) {
            (Some(l), Some(r)) if !l.is_empty() && !r.is_empty() => Some(Self::new(l, r)),
            _ => None,
        }
    }

    /// Builds eye boxes around two landmark points.
    ///
    /// Boxes are squares sized relative to the distance between the points.
    /// Returns `None` if either point is missing or both coincide.
    pub fn from_points(left: Option<(f64, f64)>, right: Option<(f64, f64)>) -> Option<Self> {
        let (l, r) = (left?, right?);
        let dist = ((r.0 - l.0).powi(2) + (r.1 - l.1).powi(2)).sqrt();
        if dist <= 0.0 {
            return None;
        }
        let size = (dist * EYE_BOX_RATIO).max(MIN_EYE_BOX);
        Self::from_slots(
            Some(Region::centered_square(l.0, l.1, size)),
            Some(Region::centered_square(r.0, r.1, size)),
        )
    }

    pub fn left(&self) -> &Region {
        &self.left
    }

    pub fn right(&self) -> &Region {
        &self.right
    }

    /// Point halfway between the eye centres.
    pub fn midpoint(&self) -> (f64, f64) {
        let (lx, ly) = self.left.center();
        let (rx, ry) = self.right.center();
        ((lx + rx) / 2.0, (ly + ry) / 2.0)
    }

    pub fn distance(&self) -> f64 {
        let (lx, ly) = self.left.center();
        let (rx, ry) = self.right.center();
        ((rx - lx).powi(2) + (ry - ly).powi(2)).sqrt()
    }

    /// Tilt of the line from left to right eye, in degrees.
    ///
    /// Positive when the right eye sits lower than the left (y grows downward).
    pub fn angle_degrees(&self) -> f64 {
        let (lx, ly) = self.left.center();
        let (rx, ry) = self.right.center();
        (ry - ly).atan2(rx - lx).to_degrees()
    }
}
