//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
///
/// Feature extents are in longitude/latitude degrees; map extents computed
/// by the viewport are in Web Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow the box by `margin` on every side.
    pub fn buffered(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(vec![(121.3, 14.1), (121.2, 14.0), (121.4, 14.05)])
            .unwrap();
        assert_eq!(bbox.min_x, 121.2);
        assert_eq!(bbox.min_y, 14.0);
        assert_eq!(bbox.max_x, 121.4);
        assert_eq!(bbox.max_y, 14.1);
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c).max_x, 30.0);
    }

    #[test]
    fn test_point_box_contains_itself() {
        let p = BoundingBox::new(1.0, 2.0, 1.0, 2.0);
        assert!(p.contains_point(1.0, 2.0));
        assert!(p.buffered(0.5).contains_point(1.4, 2.4));
        assert_eq!(p.center(), (1.0, 2.0));
    }
}
