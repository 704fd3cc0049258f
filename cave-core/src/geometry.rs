//! Small 2-D geometry helpers shared by the graph builder, the overlap
//! index and the hull tracer.
//!
//! Angles at this layer are in **degrees**, matching the configuration.

use glam::Vec2;

/// Rotates `v` counter-clockwise by `degrees`.
#[inline]
pub fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Unsigned angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns `0.0` if either vector is (close to) zero.
pub fn unsigned_angle(from: Vec2, to: Vec2) -> f32 {
    let denom = (from.length_squared() * to.length_squared()).sqrt();
    if denom < 1e-15 {
        return 0.0;
    }
    let cos = (from.dot(to) / denom).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Intersects the segments `origin1 → target1` and `origin2 → target2`.
///
/// Both parametric coordinates must lie in `[0, 1]`. Parallel segments never
/// intersect, and segments that only touch at an endpoint of both are not
/// reported.
///
/// ### Returns
/// The intersection point, or `None`.
pub fn line_intersection(origin1: Vec2, target1: Vec2, origin2: Vec2, target2: Vec2) -> Option<Vec2> {
    let s1 = target1 - origin1;
    let s2 = target2 - origin2;

    let scale = -s2.x * s1.y + s1.x * s2.y;
    if scale.abs() <= f32::EPSILON * s1.length() * s2.length() {
        return None;
    }

    let d = origin1 - origin2;
    let s = (-s1.y * d.x + s1.x * d.y) / scale;
    let t = (s2.x * d.y - s2.y * d.x) / scale;
    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
        return None;
    }

    let at_end = |v: f32| v == 0.0 || v == 1.0;
    if at_end(s) && at_end(t) {
        return None;
    }

    Some(origin1 + s1 * t)
}

#[inline]
fn tri_sign(p1: Vec2, p2: Vec2, p3: Vec2) -> f32 {
    (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
}

/// Returns `true` if `p` lies inside or on the boundary of triangle `abc`.
///
/// Works for either winding: the point is inside iff the three edge signs
/// are not mixed.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = tri_sign(p, a, b);
    let d2 = tri_sign(p, b, c);
    let d3 = tri_sign(p, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn rotate_quarter_turn() {
        let r = rotate(Vec2::X, 90.0);
        assert!(close(r, Vec2::Y), "{r:?}");

        let r = rotate(Vec2::new(5.0, 0.0), -90.0);
        assert!(close(r, Vec2::new(0.0, -5.0)), "{r:?}");
    }

    #[test]
    fn unsigned_angle_is_symmetric_and_bounded() {
        assert!((unsigned_angle(Vec2::X, Vec2::Y) - 90.0).abs() < 1e-4);
        assert!((unsigned_angle(Vec2::X, -Vec2::Y) - 90.0).abs() < 1e-4);
        assert!((unsigned_angle(Vec2::X, -Vec2::X) - 180.0).abs() < 1e-4);
        assert_eq!(unsigned_angle(Vec2::X, Vec2::ZERO), 0.0);
    }

    #[test]
    fn crossing_segments_meet_at_known_point() {
        let hit = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
            Vec2::new(4.0, 0.0),
        );
        assert!(close(hit.expect("segments cross"), Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let hit = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, -1.0),
            Vec2::new(2.0, 1.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn shared_endpoint_is_not_an_intersection() {
        let hit = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn endpoint_touching_interior_is_an_intersection() {
        let hit = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 3.0),
        );
        assert!(close(hit.expect("T-junction"), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let hit = line_intersection(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(2.0, 1.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn point_in_triangle_accepts_interior_and_rejects_exterior() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0));
        assert!(point_in_triangle(Vec2::new(1.0, 1.0), a, b, c));
        assert!(point_in_triangle(Vec2::new(1.0, 1.0), a, c, b));
        assert!(!point_in_triangle(Vec2::new(3.0, 3.0), a, b, c));
        assert!(!point_in_triangle(Vec2::new(-1.0, 0.5), a, b, c));
    }

    proptest! {
        #[test]
        fn triangle_vertices_test_inside(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
        ) {
            let (a, b, c) = (Vec2::new(ax, ay), Vec2::new(bx, by), Vec2::new(cx, cy));
            prop_assert!(point_in_triangle(a, a, b, c));
            prop_assert!(point_in_triangle(b, a, b, c));
            prop_assert!(point_in_triangle(c, a, b, c));
        }

        #[test]
        fn points_outside_bounding_box_are_rejected(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0,
            cx in -100.0f32..100.0, cy in -100.0f32..100.0,
            offset in 1.0f32..50.0,
        ) {
            let (a, b, c) = (Vec2::new(ax, ay), Vec2::new(bx, by), Vec2::new(cx, cy));
            prop_assume!((b - a).perp_dot(c - a).abs() > 1e-2);
            let max = a.max(b).max(c);
            let min = a.min(b).min(c);
            prop_assert!(!point_in_triangle(max + Vec2::splat(offset), a, b, c));
            prop_assert!(!point_in_triangle(min - Vec2::splat(offset), a, b, c));
        }

        #[test]
        fn crossing_diagonals_meet_at_center(
            cx in -50.0f32..50.0, cy in -50.0f32..50.0,
            half in 0.5f32..20.0,
        ) {
            let c = Vec2::new(cx, cy);
            let hit = line_intersection(
                c + Vec2::new(-half, -half),
                c + Vec2::new(half, half),
                c + Vec2::new(-half, half),
                c + Vec2::new(half, -half),
            );
            prop_assert!(hit.is_some());
            prop_assert!((hit.unwrap() - c).length() < 1e-3);
        }
    }
}
