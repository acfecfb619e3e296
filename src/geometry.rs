use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_pos2(p: egui::Pos2) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_vec2(v: egui::Vec2) -> Self {
        Self {
            width: v.x,
            height: v.y,
        }
    }

    pub fn to_vec2(self) -> egui::Vec2 {
        egui::vec2(self.width, self.height)
    }

    /// Both dimensions are finite and strictly positive.
    pub fn is_measurable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub fn from_min_size(min: Point, size: Size) -> Self {
        Self {
            min,
            max: Point::new(min.x + size.width, min.y + size.height),
        }
    }

    pub fn from_rect(r: egui::Rect) -> Self {
        Self {
            min: Point::from_pos2(r.min),
            max: Point::from_pos2(r.max),
        }
    }

    pub fn to_rect(self) -> egui::Rect {
        egui::Rect::from_min_max(self.min.to_pos2(), self.max.to_pos2())
    }

    pub fn width(self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Converts a point in the same space as the rect into rect-local coordinates.
    pub fn to_local(self, p: Point) -> Point {
        p - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_is_measurable() {
        assert!(Size::new(10.0, 5.0).is_measurable());
        assert!(!Size::new(0.0, 5.0).is_measurable());
        assert!(!Size::new(10.0, 0.0).is_measurable());
        assert!(!Size::new(f32::NAN, 5.0).is_measurable());
        assert!(!Size::new(f32::INFINITY, 5.0).is_measurable());
    }

    #[test]
    fn test_rect_contains_and_local() {
        let r = Rect::from_min_size(Point::new(10.0, 20.0), Size::new(100.0, 50.0));
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(r.contains(Point::new(110.0, 70.0)));
        assert!(!r.contains(Point::new(111.0, 70.0)));
        assert_eq!(r.to_local(Point::new(15.0, 25.0)), Point::new(5.0, 5.0));
        assert_eq!(r.size(), Size::new(100.0, 50.0));
    }
}
