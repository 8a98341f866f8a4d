//! Display model and the pure queries the geometry layer runs against it.
//!
//! All coordinates are physical pixels in the global screen space. The set of
//! displays is never cached here: callers ask a [`DisplayLocator`] for a fresh
//! snapshot at every decision point because monitors can be attached or
//! removed while the app is running.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A point in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// One active display rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Display {
    pub fn new(id: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    fn center_distance_sq(&self, point: Point) -> i64 {
        let center = self.center();
        let dx = i64::from(center.x) - i64::from(point.x);
        let dy = i64::from(center.y) - i64::from(point.y);
        dx * dx + dy * dy
    }

    /// Clamps the top-left corner of an item of `item` size so the whole item
    /// lies inside this display, keeping `inset` pixels from the left and top
    /// edges. When the item is larger than the display the left/top bound wins.
    pub fn clamp(&self, point: Point, item: Size, inset: i32) -> Point {
        let min_x = self.x + inset;
        let min_y = self.y + inset;
        let max_x = (self.right() - item.width).max(min_x);
        let max_y = (self.bottom() - item.height).max(min_y);
        Point::new(point.x.clamp(min_x, max_x), point.y.clamp(min_y, max_y))
    }
}

/// Source of the current display set.
pub trait DisplayLocator: Send + Sync {
    /// Returns the displays attached right now.
    fn displays(&self) -> Result<Vec<Display>>;
}

/// Returns the display containing `point`, if any.
pub fn display_containing(displays: &[Display], point: Point) -> Option<&Display> {
    displays.iter().find(|display| display.contains(point))
}

/// Resolves the display nearest to `point`.
///
/// A display that contains the point always wins. Otherwise the display whose
/// center is closest is returned; ties go to the earlier display in the list.
pub fn nearest_display(displays: &[Display], point: Point) -> Option<&Display> {
    if let Some(display) = display_containing(displays, point) {
        return Some(display);
    }

    let mut best: Option<(&Display, i64)> = None;
    for display in displays {
        let distance = display.center_distance_sq(point);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((display, distance)),
        }
    }
    best.map(|(display, _)| display)
}

/// Static display set, used by tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct FixedDisplays(pub Vec<Display>);

impl DisplayLocator for FixedDisplays {
    fn displays(&self) -> Result<Vec<Display>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_monitors() -> Vec<Display> {
        vec![
            Display::new("left", 0, 0, 1920, 1080),
            Display::new("right", 1920, 0, 1280, 1024),
        ]
    }

    #[test]
    fn test_contains_is_half_open() {
        let display = Display::new("d", 0, 0, 100, 100);
        assert!(display.contains(Point::new(0, 0)));
        assert!(display.contains(Point::new(99, 99)));
        assert!(!display.contains(Point::new(100, 50)));
        assert!(!display.contains(Point::new(50, -1)));
    }

    #[test]
    fn test_nearest_prefers_containing_display() {
        let displays = two_monitors();
        let found = nearest_display(&displays, Point::new(2000, 10)).unwrap();
        assert_eq!(found.id, "right");
    }

    #[test]
    fn test_nearest_by_center_distance_when_outside() {
        let displays = two_monitors();
        let found = nearest_display(&displays, Point::new(4000, 500)).unwrap();
        assert_eq!(found.id, "right");

        let found = nearest_display(&displays, Point::new(-500, 500)).unwrap();
        assert_eq!(found.id, "left");
    }

    #[test]
    fn test_nearest_tie_goes_to_first() {
        let displays = vec![
            Display::new("a", 0, 0, 100, 100),
            Display::new("b", 200, 0, 100, 100),
        ];
        // Equidistant from both centers (50,50) and (250,50).
        let found = nearest_display(&displays, Point::new(150, 500)).unwrap();
        assert_eq!(found.id, "a");
    }

    #[test]
    fn test_nearest_empty_set() {
        assert!(nearest_display(&[], Point::new(0, 0)).is_none());
    }

    #[test]
    fn test_clamp_keeps_item_fully_visible() {
        let display = Display::new("d", 0, 0, 1920, 1080);
        let item = Size::new(80, 80);

        let clamped = display.clamp(Point::new(5000, 5000), item, 10);
        assert_eq!(clamped, Point::new(1840, 1000));

        let clamped = display.clamp(Point::new(-300, -300), item, 10);
        assert_eq!(clamped, Point::new(10, 10));

        let clamped = display.clamp(Point::new(500, 400), item, 10);
        assert_eq!(clamped, Point::new(500, 400));
    }

    #[test]
    fn test_clamp_oversized_item_pins_to_top_left() {
        let display = Display::new("d", 100, 100, 50, 50);
        let clamped = display.clamp(Point::new(400, 400), Size::new(80, 80), 0);
        assert_eq!(clamped, Point::new(100, 100));
    }

    #[test]
    fn test_display_containing() {
        let displays = two_monitors();
        assert!(display_containing(&displays, Point::new(1919, 1079)).is_some());
        assert!(display_containing(&displays, Point::new(3000, 1000)).is_some());
        assert!(display_containing(&displays, Point::new(3000, 1050)).is_none());
    }
}
