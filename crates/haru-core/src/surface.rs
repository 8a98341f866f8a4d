//! Surface state and the host abstraction for the two companion windows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::display::{Point, Size};
use crate::error::Result;

/// Identifies one of the two on-screen surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// The full-size interactive overlay.
    Panel,
    /// The small fixed-size collapsed indicator.
    Indicator,
}

impl SurfaceKind {
    /// Window label used by the desktop shell.
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceKind::Panel => "panel",
            SurfaceKind::Indicator => "indicator",
        }
    }
}

/// Geometry of the panel surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
}

impl PanelState {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Geometry of the indicator surface. Its size is fixed by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub x: i32,
    pub y: i32,
}

impl IndicatorState {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Which surface is currently presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Panel visible, indicator hidden.
    #[default]
    Expanded,
    /// Indicator visible, panel hidden.
    Collapsed,
}

/// Native windowing backend the geometry controller drives.
///
/// Every call targets one surface. Queries return `Ok(None)` when the surface
/// does not currently exist (for example after it was destroyed out-of-band);
/// [`SurfaceHost::create`] brings it back and resolves only once the surface
/// has finished loading its content.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    async fn exists(&self, surface: SurfaceKind) -> bool;

    async fn create(&self, surface: SurfaceKind) -> Result<()>;

    async fn position(&self, surface: SurfaceKind) -> Result<Option<Point>>;

    async fn size(&self, surface: SurfaceKind) -> Result<Option<Size>>;

    async fn set_position(&self, surface: SurfaceKind, position: Point) -> Result<()>;

    async fn set_size(&self, surface: SurfaceKind, size: Size) -> Result<()>;

    async fn show(&self, surface: SurfaceKind) -> Result<()>;

    async fn hide(&self, surface: SurfaceKind) -> Result<()>;
}
