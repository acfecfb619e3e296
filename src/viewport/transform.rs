//! Translate-then-scale transform of one diagram inside its container.
//!
//! The transform is applied as `translate(x, y) scale(s)` with the scale
//! origin at the top left corner, so `offset_x`/`offset_y` are plain pixel
//! offsets in container space and a content point `c` lands at
//! `offset + c * scale`.

use crate::geometry::{Point, Size};

/// Lower bound for wheel-driven zoom.
pub const MIN_SCALE: f32 = 0.125;
/// Upper bound for wheel-driven zoom.
pub const MAX_SCALE: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn new(offset_x: f32, offset_y: f32, scale: f32) -> Self {
        Self {
            offset_x,
            offset_y,
            scale,
        }
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    /// Content-space point currently displayed at `p` (container space).
    pub fn content_point_at(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        )
    }

    /// Container-space position of the content point `c`.
    pub fn to_container(&self, c: Point) -> Point {
        Point::new(
            self.offset_x + c.x * self.scale,
            self.offset_y + c.y * self.scale,
        )
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Multiplies the scale by `factor`, keeping the content point under the
    /// container center in place. Unclamped.
    pub fn zoom_around_center(&mut self, factor: f32, container: Size) {
        if !factor.is_finite() || factor <= 0.0 || !self.has_usable_scale() {
            return;
        }
        let center = container.center();
        let anchor = self.content_point_at(center);

        self.scale *= factor;

        self.offset_x = center.x - anchor.x * self.scale;
        self.offset_y = center.y - anchor.y * self.scale;
    }

    /// Adds `delta_scale` to the scale, clamped to [`MIN_SCALE`, `MAX_SCALE`],
    /// keeping the content point under `pointer` (container space) in place.
    pub fn zoom_around_cursor(&mut self, pointer: Point, delta_scale: f32) {
        if !delta_scale.is_finite() || !self.has_usable_scale() {
            return;
        }
        let previous = self.scale;
        self.scale = (self.scale + delta_scale).clamp(MIN_SCALE, MAX_SCALE);

        let ratio = 1.0 - self.scale / previous;
        self.offset_x += (pointer.x - self.offset_x) * ratio;
        self.offset_y += (pointer.y - self.offset_y) * ratio;
    }

    /// CSS projection of the transform.
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.offset_x, self.offset_y, self.scale
        )
    }

    fn has_usable_scale(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::{approx_eq, assert_approx_eq};
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    use super::*;

    #[test]
    fn test_move_by_accumulates() {
        let mut t = Transform::default();
        t.move_by(50.0, 0.0);
        t.move_by(-20.0, 15.0);
        assert_approx_eq!(f32, t.offset_x, 30.0);
        assert_approx_eq!(f32, t.offset_y, 15.0);
        assert_approx_eq!(f32, t.scale, 1.0);
    }

    #[test]
    fn test_zoom_around_center_keeps_center_point() {
        let container = Size::new(800.0, 600.0);
        let mut t = Transform::new(100.0, 40.0, 0.5);
        let before = t.content_point_at(container.center());

        t.zoom_around_center(1.1, container);

        let after = t.content_point_at(container.center());
        assert_approx_eq!(f32, t.scale, 0.55, epsilon = 1e-6);
        assert_approx_eq!(f32, before.x, after.x, epsilon = 1e-3);
        assert_approx_eq!(f32, before.y, after.y, epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_around_center_ignores_bad_factor() {
        let mut t = Transform::new(10.0, 10.0, 1.0);
        t.zoom_around_center(0.0, Size::new(100.0, 100.0));
        t.zoom_around_center(f32::NAN, Size::new(100.0, 100.0));
        assert_eq!(t, Transform::new(10.0, 10.0, 1.0));
    }

    #[test]
    fn test_zoom_around_cursor_keeps_cursor_point() {
        let mut t = Transform::new(20.0, 30.0, 1.0);
        let pointer = Point::new(200.0, 150.0);
        let before = t.content_point_at(pointer);

        t.zoom_around_cursor(pointer, 0.25);

        let after = t.content_point_at(pointer);
        assert_approx_eq!(f32, t.scale, 1.25);
        assert_approx_eq!(f32, before.x, after.x, epsilon = 1e-3);
        assert_approx_eq!(f32, before.y, after.y, epsilon = 1e-3);
    }

    #[test]
    fn test_zoom_around_cursor_clamps() {
        let mut t = Transform::default();
        t.zoom_around_cursor(Point::ZERO, 100.0);
        assert_approx_eq!(f32, t.scale, MAX_SCALE);
        t.zoom_around_cursor(Point::ZERO, -100.0);
        assert_approx_eq!(f32, t.scale, MIN_SCALE);
    }

    #[test]
    fn test_to_css() {
        let t = Transform::new(0.0, 225.0, 0.5);
        assert_eq!(t.to_css(), "translate(0px, 225px) scale(0.5)");
    }

    fn delta_strategy() -> impl Strategy<Value = (f32, f32)> {
        (-5000.0f32..5000.0, -5000.0f32..5000.0)
    }

    fn factor_strategy() -> impl Strategy<Value = f32> {
        0.2f32..5.0
    }

    /// Offsets after any sequence of moves equal the sum of the deltas.
    fn check_move_is_additive(deltas: Vec<(f32, f32)>) -> Result<(), TestCaseError> {
        let mut t = Transform::default();
        for (dx, dy) in &deltas {
            t.move_by(*dx, *dy);
        }
        let sum_x: f32 = deltas.iter().map(|d| d.0).sum();
        let sum_y: f32 = deltas.iter().map(|d| d.1).sum();
        prop_assert!(approx_eq!(f32, t.offset_x, sum_x, epsilon = 0.05));
        prop_assert!(approx_eq!(f32, t.offset_y, sum_y, epsilon = 0.05));
        Ok(())
    }

    /// Two center zooms compose into one zoom by the product of the factors.
    fn check_center_zoom_composes(f1: f32, f2: f32) -> Result<(), TestCaseError> {
        let container = Size::new(640.0, 480.0);
        let start = Transform::new(37.0, -12.0, 0.8);
        let anchor = start.content_point_at(container.center());

        let mut twice = start;
        twice.zoom_around_center(f1, container);
        twice.zoom_around_center(f2, container);

        let mut once = start;
        once.zoom_around_center(f1 * f2, container);

        prop_assert!(approx_eq!(f32, twice.scale, once.scale, epsilon = 1e-4));
        let after = twice.content_point_at(container.center());
        prop_assert!(approx_eq!(f32, after.x, anchor.x, epsilon = 1e-2));
        prop_assert!(approx_eq!(f32, after.y, anchor.y, epsilon = 1e-2));
        Ok(())
    }

    /// Wheel zoom never leaves the scale bounds.
    fn check_cursor_zoom_stays_in_bounds(
        start: f32,
        deltas: Vec<f32>,
    ) -> Result<(), TestCaseError> {
        let mut t = Transform::new(0.0, 0.0, start);
        for delta in deltas {
            t.zoom_around_cursor(Point::new(120.0, 80.0), delta);
            prop_assert!(t.scale >= MIN_SCALE && t.scale <= MAX_SCALE);
            prop_assert!(t.offset_x.is_finite() && t.offset_y.is_finite());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn test_move_is_additive(deltas in prop::collection::vec(delta_strategy(), 0..32)) {
            check_move_is_additive(deltas)?;
        }

        #[test]
        fn test_center_zoom_composes(f1 in factor_strategy(), f2 in factor_strategy()) {
            check_center_zoom_composes(f1, f2)?;
        }

        #[test]
        fn test_cursor_zoom_stays_in_bounds(
            start in 0.01f32..10.0,
            deltas in prop::collection::vec(-1000.0f32..1000.0, 1..16),
        ) {
            check_cursor_zoom_stays_in_bounds(start, deltas)?;
        }
    }
}
