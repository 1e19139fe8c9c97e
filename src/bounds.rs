//! Integer screen-space bounding boxes
//!
//! `min` is inclusive and `max` is exclusive for pixel iteration; both come
//! straight from triangle vertex coordinates, so a box built from points
//! holds its bottom/right-most vertices on the `max` edge, which the
//! top-left fill rule excludes anyway.

use glam::IVec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub min: IVec2,
    pub max: IVec2,
}

impl BoundingBox {
    /// Axis-aligned box of three points.
    pub fn from_points(p0: IVec2, p1: IVec2, p2: IVec2) -> Self {
        Self {
            min: p0.min(p1.min(p2)),
            max: p0.max(p1.max(p2)),
        }
    }

    /// Whether this box touches the rectangle `[bound_min, bound_max)`.
    pub fn overlaps(&self, bound_min: IVec2, bound_max: IVec2) -> bool {
        self.min.x <= bound_max.x
            && self.max.x >= bound_min.x
            && self.min.y <= bound_max.y
            && self.max.y >= bound_min.y
    }

    /// This box clamped into `[bound_min, bound_max)`.
    pub fn intersection(&self, bound_min: IVec2, bound_max: IVec2) -> Self {
        Self {
            min: self.min.max(bound_min),
            max: self.max.min(bound_max),
        }
    }

    /// True when the box contains no pixels.
    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::ivec2;

    #[test]
    fn test_from_points() {
        let b = BoundingBox::from_points(ivec2(5, 9), ivec2(1, 20), ivec2(10, 2));
        assert_eq!(b.min, ivec2(1, 2));
        assert_eq!(b.max, ivec2(10, 20));
    }

    #[test]
    fn test_overlaps() {
        let b = BoundingBox {
            min: ivec2(10, 10),
            max: ivec2(20, 20),
        };
        assert!(b.overlaps(ivec2(0, 0), ivec2(32, 32)));
        assert!(b.overlaps(ivec2(15, 15), ivec2(40, 40)));
        assert!(!b.overlaps(ivec2(21, 0), ivec2(40, 40)));
        assert!(!b.overlaps(ivec2(0, 0), ivec2(9, 9)));
    }

    #[test]
    fn test_intersection() {
        let b = BoundingBox {
            min: ivec2(-5, 8),
            max: ivec2(50, 12),
        };
        let clipped = b.intersection(ivec2(0, 0), ivec2(32, 32));
        assert_eq!(clipped.min, ivec2(0, 8));
        assert_eq!(clipped.max, ivec2(32, 12));
        assert!(!clipped.is_empty());
    }

    #[test]
    fn test_empty() {
        let b = BoundingBox {
            min: ivec2(10, 10),
            max: ivec2(20, 20),
        };
        assert!(b.intersection(ivec2(20, 0), ivec2(30, 30)).is_empty());
    }
}
