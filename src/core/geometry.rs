use serde::{Deserialize, Serialize};

/// A position in logical pixels. Windows may sit at negative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Floor both axes at `min`. Negative inputs land on the floor too.
    pub fn at_least(self, min: Size) -> Size {
        Size::new(self.width.max(min.width), self.height.max(min.height))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(self) -> i32 {
        self.y + self.height
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Linear blend between `self` and `to`; `t` is clamped to `0.0..=1.0`.
    pub fn lerp(self, to: Bounds, t: f32) -> Bounds {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: i32, b: i32| a + ((b - a) as f32 * t).round() as i32;
        Bounds::new(
            mix(self.x, to.x),
            mix(self.y, to.y),
            mix(self.width, to.width),
            mix(self.height, to.height),
        )
    }
}

/// The visible screen in logical pixels. The taskbar strip along the bottom
/// edge is excluded from the area maximized windows may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    pub taskbar_height: i32,
}

impl Viewport {
    pub const fn new(width: i32, height: i32, taskbar_height: i32) -> Self {
        Self {
            width,
            height,
            taskbar_height,
        }
    }

    pub fn work_area(self) -> Bounds {
        Bounds::new(
            0,
            0,
            self.width.max(0),
            (self.height - self.taskbar_height).max(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_floors_negative_sizes() {
        let min = Size::new(300, 200);
        assert_eq!(Size::new(-40, 10).at_least(min), min);
        assert_eq!(Size::new(640, 480).at_least(min), Size::new(640, 480));
    }

    #[test]
    fn contains_is_half_open() {
        let b = Bounds::new(10, 10, 5, 5);
        assert!(b.contains(Point::new(10, 10)));
        assert!(b.contains(Point::new(14, 14)));
        assert!(!b.contains(Point::new(15, 14)));
        assert!(!b.contains(Point::new(9, 12)));
    }

    #[test]
    fn lerp_hits_both_endpoints() {
        let a = Bounds::new(0, 0, 100, 100);
        let b = Bounds::new(50, 20, 300, 200);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Bounds::new(25, 10, 200, 150));
    }

    #[test]
    fn work_area_excludes_taskbar() {
        let vp = Viewport::new(1200, 800, 20);
        assert_eq!(vp.work_area(), Bounds::new(0, 0, 1200, 780));
    }
}
