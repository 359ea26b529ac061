//! Property-based invariant tests for geometry and overlap computation.
//!
//! These verify the algebraic facts the conflict detector leans on:
//!
//! 1. Intersection is commutative.
//! 2. Intersection is idempotent (A ∩ A = A) for non-empty rects.
//! 3. Intersection result fits within both inputs.
//! 4. Union contains both inputs.
//! 5. Overlap existence is symmetric: `a.overlap_fraction(&b) > 0` iff
//!    `b.overlap_fraction(&a) > 0` (fractions themselves differ by area
//!    ratio).
//! 6. Overlap fraction is bounded by `[0, 1]`.
//! 7. Empty rects never overlap anything.

use proptest::prelude::*;
use stratum_core::geometry::Rect;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (
        -500.0f64..=500.0,
        -500.0f64..=500.0,
        0.0f64..=400.0,
        0.0f64..=400.0,
    )
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn nonempty_rect_strategy() -> impl Strategy<Value = Rect> {
    (
        -500.0f64..=500.0,
        -500.0f64..=500.0,
        0.5f64..=400.0,
        0.5f64..=400.0,
    )
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn rect_fits_within(inner: &Rect, outer: &Rect) -> bool {
    inner.is_empty()
        || (inner.x >= outer.x
            && inner.y >= outer.y
            && inner.right() <= outer.right() + 1e-9
            && inner.bottom() <= outer.bottom() + 1e-9)
}

proptest! {
    #[test]
    fn intersection_commutative(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(
            a.intersection(&b),
            b.intersection(&a),
            "intersection is not commutative: a={:?}, b={:?}",
            a, b
        );
    }

    #[test]
    fn intersection_idempotent(a in nonempty_rect_strategy()) {
        // Edges are recomputed as (x + width) - x, so compare with a
        // tolerance rather than bitwise.
        let hit = a.intersection(&a);
        prop_assert!((hit.x - a.x).abs() < 1e-9, "A ∩ A drifted: {:?} vs {:?}", hit, a);
        prop_assert!((hit.y - a.y).abs() < 1e-9, "A ∩ A drifted: {:?} vs {:?}", hit, a);
        prop_assert!((hit.width - a.width).abs() < 1e-9, "A ∩ A drifted: {:?} vs {:?}", hit, a);
        prop_assert!((hit.height - a.height).abs() < 1e-9, "A ∩ A drifted: {:?} vs {:?}", hit, a);
    }

    #[test]
    fn intersection_fits_both(a in rect_strategy(), b in rect_strategy()) {
        let hit = a.intersection(&b);
        prop_assert!(rect_fits_within(&hit, &a), "intersection escapes a: {:?}", hit);
        prop_assert!(rect_fits_within(&hit, &b), "intersection escapes b: {:?}", hit);
    }

    #[test]
    fn union_contains_both(a in nonempty_rect_strategy(), b in nonempty_rect_strategy()) {
        let u = a.union(&b);
        prop_assert!(rect_fits_within(&a, &u));
        prop_assert!(rect_fits_within(&b, &u));
    }

    #[test]
    fn overlap_existence_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
        let ab = a.overlap_fraction(&b);
        let ba = b.overlap_fraction(&a);
        prop_assert_eq!(
            ab > 0.0,
            ba > 0.0,
            "overlap existence not symmetric: a→b={}, b→a={}",
            ab, ba
        );
    }

    #[test]
    fn overlap_fraction_bounded(a in rect_strategy(), b in rect_strategy()) {
        let f = a.overlap_fraction(&b);
        prop_assert!((0.0..=1.0).contains(&f), "fraction out of range: {}", f);
    }

    #[test]
    fn empty_rect_never_overlaps(x in -500.0f64..=500.0, y in -500.0f64..=500.0, b in rect_strategy()) {
        let empty = Rect::new(x, y, 0.0, 0.0);
        prop_assert_eq!(empty.overlap_fraction(&b), 0.0);
        prop_assert_eq!(b.overlap_fraction(&empty), 0.0);
    }
}
