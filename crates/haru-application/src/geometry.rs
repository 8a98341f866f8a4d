//! Geometry controller for the panel and indicator surfaces.
//!
//! The controller is the only writer of both surface records. It keeps them
//! in step with the windowing backend and with the current display layout,
//! which is re-read from the [`DisplayLocator`] at every decision point.

use std::sync::Arc;

use haru_core::config::GeometryConfig;
use haru_core::display::{
    Display, DisplayLocator, Point, Size, display_containing, nearest_display,
};
use haru_core::gesture::{DragGesture, ResizeGesture};
use haru_core::surface::{IndicatorState, PanelState, SurfaceHost, SurfaceKind, WindowMode};
use haru_core::{HaruError, Result};

/// A single backend mutation, replayed once if the surface vanished.
#[derive(Debug, Clone, Copy)]
enum SurfaceOp {
    Move(Point),
    Resize(Size),
    Show,
    Hide,
}

/// Owns the collapse/expand state machine and the pointer gestures.
///
/// Callers serialize access (the orchestrator keeps it behind a mutex), so
/// every handler takes `&mut self`.
pub struct GeometryController {
    host: Arc<dyn SurfaceHost>,
    displays: Arc<dyn DisplayLocator>,
    config: GeometryConfig,
    mode: WindowMode,
    panel: PanelState,
    indicator: IndicatorState,
    drag: DragGesture,
    resize: ResizeGesture,
}

impl GeometryController {
    pub fn new(
        host: Arc<dyn SurfaceHost>,
        displays: Arc<dyn DisplayLocator>,
        config: GeometryConfig,
    ) -> Self {
        let size = config.panel_size();
        Self {
            host,
            displays,
            panel: PanelState {
                x: 0,
                y: 0,
                width: size.width,
                height: size.height,
                resizable: config.panel_resizable,
            },
            indicator: IndicatorState { x: 0, y: 0 },
            config,
            mode: WindowMode::Expanded,
            drag: DragGesture::default(),
            resize: ResizeGesture::default(),
        }
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn indicator(&self) -> IndicatorState {
        self.indicator
    }

    /// Places the panel at the bottom-right corner of the first display and
    /// shows it.
    pub async fn init(&mut self) -> Result<()> {
        let displays = self.snapshot()?;
        let size = self.config.panel_size();

        if let Some(display) = displays.first() {
            let corner = Point::new(display.right() - size.width, display.bottom() - size.height);
            let position = display.clamp(corner, size, self.config.edge_inset);
            self.panel.x = position.x;
            self.panel.y = position.y;
        }
        self.panel.width = size.width;
        self.panel.height = size.height;

        self.apply(SurfaceKind::Panel, SurfaceOp::Resize(size)).await?;
        self.apply(SurfaceKind::Panel, SurfaceOp::Move(self.panel.position()))
            .await?;
        self.apply(SurfaceKind::Panel, SurfaceOp::Show).await?;
        self.apply(SurfaceKind::Indicator, SurfaceOp::Hide).await?;
        self.mode = WindowMode::Expanded;

        tracing::info!(
            "[Geometry] Panel placed at ({}, {}) size {}x{}",
            self.panel.x,
            self.panel.y,
            self.panel.width,
            self.panel.height
        );
        Ok(())
    }

    /// Swaps the panel for the indicator.
    ///
    /// The indicator is shown before the panel is hidden, with a settle delay
    /// in between, so there is never a frame without a visible surface.
    pub async fn collapse(&mut self) -> Result<()> {
        if self.mode == WindowMode::Collapsed {
            return Ok(());
        }
        self.drag.end();
        self.resize.end();

        self.sync_panel().await?;
        let displays = self.snapshot()?;
        let panel = self.panel;
        let target = Point::new(
            panel.x + panel.width + self.config.indicator_margin,
            panel.y + self.config.indicator_vertical_offset,
        );
        let position = match nearest_display(&displays, panel.position()) {
            Some(display) => {
                display.clamp(target, self.config.indicator_size(), self.config.edge_inset)
            }
            None => target,
        };
        self.indicator.x = position.x;
        self.indicator.y = position.y;

        self.apply(SurfaceKind::Indicator, SurfaceOp::Move(position))
            .await?;
        self.apply(SurfaceKind::Indicator, SurfaceOp::Show).await?;
        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        if let Err(e) = self.apply(SurfaceKind::Panel, SurfaceOp::Hide).await {
            // Stay expanded with only the panel showing.
            if let Err(undo) = self.apply(SurfaceKind::Indicator, SurfaceOp::Hide).await {
                tracing::warn!("[Geometry] Failed to hide indicator after aborted collapse: {}", undo);
            }
            return Err(e);
        }
        self.mode = WindowMode::Collapsed;

        tracing::debug!("[Geometry] Collapsed to indicator at ({}, {})", position.x, position.y);
        Ok(())
    }

    /// Swaps the indicator back for the panel, placed beside the indicator on
    /// the display that holds it.
    pub async fn expand(&mut self) -> Result<()> {
        if self.mode == WindowMode::Expanded {
            return Ok(());
        }

        if let Some(position) = self.host.position(SurfaceKind::Indicator).await? {
            self.indicator.x = position.x;
            self.indicator.y = position.y;
        }
        let displays = self.snapshot()?;
        let anchor = self.indicator.position();
        let size = self.panel.size();
        let target = Point::new(
            anchor.x - size.width - self.config.indicator_margin,
            anchor.y - self.config.indicator_vertical_offset,
        );
        let position = match display_containing(&displays, anchor).or(displays.first()) {
            Some(display) => display.clamp(target, size, self.config.edge_inset),
            None => target,
        };
        self.panel.x = position.x;
        self.panel.y = position.y;

        self.apply(SurfaceKind::Panel, SurfaceOp::Move(position)).await?;
        self.apply(SurfaceKind::Panel, SurfaceOp::Show).await?;
        self.apply(SurfaceKind::Indicator, SurfaceOp::Hide).await?;
        self.mode = WindowMode::Expanded;

        tracing::debug!("[Geometry] Expanded panel at ({}, {})", position.x, position.y);
        Ok(())
    }

    pub async fn drag_start(&mut self, pointer: Point) -> Result<()> {
        if self.mode != WindowMode::Expanded {
            return Ok(());
        }
        self.sync_panel().await?;
        self.drag.start(pointer, self.panel.position());
        Ok(())
    }

    /// Moves the panel with the pointer. Samples without a preceding
    /// `drag_start` are dropped.
    pub async fn drag_move(&mut self, pointer: Point) -> Result<()> {
        let Some(position) = self.drag.update(pointer) else {
            return Ok(());
        };
        self.panel.x = position.x;
        self.panel.y = position.y;
        self.apply(SurfaceKind::Panel, SurfaceOp::Move(position)).await
    }

    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    pub async fn resize_start(&mut self, pointer: Point) -> Result<()> {
        if self.mode != WindowMode::Expanded || !self.panel.resizable {
            return Ok(());
        }
        self.sync_panel().await?;
        self.resize.start(pointer, self.panel.size());
        Ok(())
    }

    pub async fn resize_move(&mut self, pointer: Point) -> Result<()> {
        let Some(size) = self.resize.update(pointer, self.config.panel_min_size()) else {
            return Ok(());
        };
        self.panel.width = size.width;
        self.panel.height = size.height;
        self.apply(SurfaceKind::Panel, SurfaceOp::Resize(size)).await
    }

    pub fn resize_end(&mut self) {
        self.resize.end();
    }

    /// Resets the panel to its configured size, whatever the gesture state.
    pub async fn restore_size(&mut self) -> Result<()> {
        let size = self.config.panel_size();
        self.panel.width = size.width;
        self.panel.height = size.height;
        self.resize.rebase(size);
        self.apply(SurfaceKind::Panel, SurfaceOp::Resize(size)).await
    }

    /// Moves the indicator so its top-left lands on `target`.
    ///
    /// The indicator is kept wholly on its display, and a target outside every
    /// display is pulled into the nearest one.
    pub async fn mini_drag_move(&mut self, target: Point) -> Result<()> {
        if self.mode != WindowMode::Collapsed {
            return Ok(());
        }
        let displays = self.snapshot()?;
        let position = constrain_indicator(&displays, target, self.config.indicator_size());
        self.indicator.x = position.x;
        self.indicator.y = position.y;
        self.apply(SurfaceKind::Indicator, SurfaceOp::Move(position))
            .await
    }

    /// Ends an indicator drag. Each move is already resolved on its own, so
    /// this only records where the indicator came to rest.
    pub fn mini_drag_end(&mut self) {
        tracing::debug!(
            "[Geometry] Indicator dropped at ({}, {})",
            self.indicator.x,
            self.indicator.y
        );
    }

    fn snapshot(&self) -> Result<Vec<Display>> {
        let displays = self.displays.displays()?;
        if displays.is_empty() {
            tracing::warn!("[Geometry] No displays reported, geometry left unclamped");
        }
        Ok(displays)
    }

    /// Refreshes the panel record from the backend, which may have moved the
    /// window on its own (e.g. a DPI change).
    async fn sync_panel(&mut self) -> Result<()> {
        if let Some(position) = self.host.position(SurfaceKind::Panel).await? {
            self.panel.x = position.x;
            self.panel.y = position.y;
        }
        if let Some(size) = self.host.size(SurfaceKind::Panel).await? {
            self.panel.width = size.width;
            self.panel.height = size.height;
        }
        Ok(())
    }

    /// Runs `op` against `surface`, recreating the surface first if it is gone
    /// and once more if the backend reports it lost mid-call.
    async fn apply(&self, surface: SurfaceKind, op: SurfaceOp) -> Result<()> {
        if !self.host.exists(surface).await {
            if matches!(op, SurfaceOp::Hide) {
                return Ok(());
            }
            self.recreate(surface).await?;
        }

        match self.apply_once(surface, op).await {
            Err(e) if e.is_surface() => {
                tracing::warn!(
                    "[Geometry] {} surface lost during {:?}: {}, recreating",
                    surface.label(),
                    op,
                    e
                );
                self.recreate(surface).await?;
                self.apply_once(surface, op).await
            }
            other => other,
        }
    }

    async fn apply_once(&self, surface: SurfaceKind, op: SurfaceOp) -> Result<()> {
        match op {
            SurfaceOp::Move(position) => self.host.set_position(surface, position).await,
            SurfaceOp::Resize(size) => self.host.set_size(surface, size).await,
            SurfaceOp::Show => self.host.show(surface).await,
            SurfaceOp::Hide => self.host.hide(surface).await,
        }
    }

    /// Creates `surface` and puts back the geometry recorded for it.
    async fn recreate(&self, surface: SurfaceKind) -> Result<()> {
        tracing::info!("[Geometry] Recreating {} surface", surface.label());
        self.host
            .create(surface)
            .await
            .map_err(|e| HaruError::surface(format!("failed to recreate {}: {e}", surface.label())))?;

        match surface {
            SurfaceKind::Panel => {
                self.host.set_size(surface, self.panel.size()).await?;
                self.host.set_position(surface, self.panel.position()).await
            }
            SurfaceKind::Indicator => {
                self.host
                    .set_position(surface, self.indicator.position())
                    .await
            }
        }
    }
}

/// Clamps `target` into the display holding it, or the nearest one when it
/// lies on none, so the whole indicator stays visible.
fn constrain_indicator(displays: &[Display], target: Point, indicator: Size) -> Point {
    match nearest_display(displays, target) {
        Some(display) => display.clamp(target, indicator, 0),
        None => target,
    }
}
