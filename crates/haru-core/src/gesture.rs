//! Pointer gesture trackers for dragging and resizing the panel.
//!
//! Both trackers are plain state machines: `start` arms them, `update` turns a
//! pointer sample into new geometry, `end` disarms them. An `update` that
//! arrives while disarmed yields `None` so stray events are dropped.

use crate::display::{Point, Size};

/// Tracks an in-flight window drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragGesture {
    offset: Option<Point>,
}

impl DragGesture {
    /// Records the pointer-to-window offset.
    pub fn start(&mut self, pointer: Point, window: Point) {
        self.offset = Some(Point::new(pointer.x - window.x, pointer.y - window.y));
    }

    /// Returns the new window position for `pointer`, or `None` if no drag is
    /// active. No clamping: the window may temporarily leave the screen.
    pub fn update(&self, pointer: Point) -> Option<Point> {
        self.offset
            .map(|offset| Point::new(pointer.x - offset.x, pointer.y - offset.y))
    }

    pub fn end(&mut self) {
        self.offset = None;
    }

    pub fn is_active(&self) -> bool {
        self.offset.is_some()
    }
}

/// Tracks an in-flight resize. Deltas are incremental: every update moves
/// the reference pointer to the latest sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeGesture {
    state: Option<ResizeState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResizeState {
    last_pointer: Point,
    size: Size,
}

impl ResizeGesture {
    pub fn start(&mut self, pointer: Point, size: Size) {
        self.state = Some(ResizeState {
            last_pointer: pointer,
            size,
        });
    }

    /// Applies the delta since the previous sample, never shrinking below
    /// `min`. Returns the new size, or `None` if no resize is active.
    pub fn update(&mut self, pointer: Point, min: Size) -> Option<Size> {
        let state = self.state.as_mut()?;
        let dx = pointer.x - state.last_pointer.x;
        let dy = pointer.y - state.last_pointer.y;
        state.size = Size::new(
            (state.size.width + dx).max(min.width),
            (state.size.height + dy).max(min.height),
        );
        state.last_pointer = pointer;
        Some(state.size)
    }

    /// Replaces the tracked size, e.g. after a size restore mid-gesture.
    pub fn rebase(&mut self, size: Size) {
        if let Some(state) = self.state.as_mut() {
            state.size = size;
        }
    }

    pub fn end(&mut self) {
        self.state = None;
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }
}
