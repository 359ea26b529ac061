#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in viewport coordinates.
///
/// Coordinates are fractional pixels (origin at top-left, y growing down),
/// matching what host trees report for overlay bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width in pixels. Non-positive widths denote an empty rectangle.
    pub width: f64,
    /// Height in pixels. Non-positive heights denote an empty rectangle.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Left edge. Alias for `self.x`.
    #[inline]
    pub const fn left(&self) -> f64 {
        self.x
    }

    /// Top edge. Alias for `self.y`.
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width.max(0.0)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height.max(0.0)
    }

    /// Area in square pixels. Zero for empty rectangles.
    #[inline]
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.width * self.height
        }
    }

    /// Check if the rectangle has zero (or degenerate negative) extent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if
    /// there is no overlap.
    ///
    /// Empty rectangles never intersect anything, including themselves.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Create a new rectangle that is the union of this rectangle and another.
    ///
    /// The result is the smallest rectangle that contains both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Fraction of this rectangle's area covered by `other`, in `[0, 1]`.
    ///
    /// This is directional: the denominator is always `self`'s area, so
    /// `a.overlap_fraction(&b)` and `b.overlap_fraction(&a)` differ whenever
    /// the areas differ. A zero-area rectangle on either side yields `0.0`.
    pub fn overlap_fraction(&self, other: &Rect) -> f64 {
        let Some(hit) = self.intersection_opt(other) else {
            return 0.0;
        };
        // Intersection area can't exceed self's area, but clamp against
        // floating-point drift so callers can rely on the (0, 1] range.
        (hit.area() / self.area()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(2.0, 3.0));
        assert!(rect.contains(5.9, 7.9));
        assert!(!rect.contains(6.0, 3.0));
        assert!(!rect.contains(2.0, 8.0));
    }

    #[test]
    fn rect_intersection_overlaps() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(2.0, 2.0, 4.0, 4.0);
        assert_eq!(a.intersection(&b), Rect::new(2.0, 2.0, 2.0, 2.0));
    }

    #[test]
    fn rect_intersection_no_overlap_is_empty() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 3.0, 2.0, 2.0);
        assert_eq!(a.intersection(&b), Rect::default());
    }

    #[test]
    fn rect_intersection_adjacent_no_overlap() {
        // Rects share an edge but don't overlap (right edge is exclusive).
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(5.0, 0.0, 5.0, 5.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn rect_intersection_contained() {
        let outer = Rect::new(0.0, 0.0, 20.0, 20.0);
        let inner = Rect::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(outer.intersection(&inner), inner);
        assert_eq!(inner.intersection(&outer), inner);
    }

    #[test]
    fn empty_rect_never_intersects() {
        let empty = Rect::new(10.0, 10.0, 0.0, 5.0);
        let full = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(empty.intersection_opt(&full), None);
        assert_eq!(full.intersection_opt(&empty), None);
        assert_eq!(empty.intersection_opt(&empty), None);
    }

    #[test]
    fn rect_union_basic() {
        let a = Rect::new(0.0, 0.0, 5.0, 5.0);
        let b = Rect::new(3.0, 3.0, 5.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn rect_union_with_empty_is_identity() {
        let a = Rect::new(1.0, 2.0, 3.0, 4.0);
        let empty = Rect::default();
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
    }

    #[test]
    fn rect_area() {
        assert_eq!(Rect::new(0.0, 0.0, 10.0, 20.0).area(), 200.0);
        assert_eq!(Rect::new(5.0, 5.0, 0.0, 10.0).area(), 0.0);
        assert_eq!(Rect::new(5.0, 5.0, -3.0, 10.0).area(), 0.0);
    }

    #[test]
    fn rect_is_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_empty());
        assert!(Rect::new(5.0, 5.0, 0.0, 10.0).is_empty());
        assert!(Rect::new(5.0, 5.0, 10.0, -1.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 0.5, 0.5).is_empty());
    }

    // --- Overlap fraction ---

    #[test]
    fn overlap_fraction_quarter() {
        let subject = Rect::new(0.0, 0.0, 100.0, 100.0);
        let other = Rect::new(50.0, 50.0, 150.0, 150.0);
        assert_eq!(subject.overlap_fraction(&other), 0.25);
    }

    #[test]
    fn overlap_fraction_is_directional() {
        let small = Rect::new(0.0, 0.0, 10.0, 10.0);
        let large = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Small is fully covered by large; large is only 1% covered.
        assert_eq!(small.overlap_fraction(&large), 1.0);
        assert_eq!(large.overlap_fraction(&small), 0.01);
    }

    #[test]
    fn overlap_fraction_zero_when_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.overlap_fraction(&b), 0.0);
    }

    #[test]
    fn overlap_fraction_zero_area_never_overlaps() {
        let flat = Rect::new(0.0, 0.0, 100.0, 0.0);
        let full = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(flat.overlap_fraction(&full), 0.0);
        assert_eq!(full.overlap_fraction(&flat), 0.0);
    }

    #[test]
    fn overlap_fraction_self_is_one() {
        let r = Rect::new(3.0, 4.0, 20.0, 30.0);
        assert_eq!(r.overlap_fraction(&r), 1.0);
    }

    #[test]
    fn serde_round_trip() {
        let r = Rect::new(1.5, 2.5, 30.0, 40.0);
        let json = serde_json::to_string(&r).unwrap();
        let back: Rect = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
