//! Tauri-backed surface host and display locator.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use haru_core::config::GeometryConfig;
use haru_core::display::{Display, DisplayLocator, Point, Size};
use haru_core::surface::{SurfaceHost, SurfaceKind};
use haru_core::{HaruError, Result};
use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Manager, PhysicalPosition, PhysicalSize, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tokio::sync::oneshot;

/// How long a recreated surface may take to load before we carry on anyway.
const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

fn page_for(surface: SurfaceKind) -> &'static str {
    match surface {
        SurfaceKind::Panel => "index.html",
        SurfaceKind::Indicator => "indicator.html",
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn surface_error(surface: SurfaceKind, e: tauri::Error) -> HaruError {
    HaruError::surface(format!("{}: {e}", surface.label()))
}

/// Drives the `panel` and `indicator` webview windows.
pub struct TauriSurfaceHost {
    app: AppHandle,
    config: GeometryConfig,
}

impl TauriSurfaceHost {
    pub fn new(app: AppHandle, config: GeometryConfig) -> Self {
        Self { app, config }
    }

    fn window(&self, surface: SurfaceKind) -> Option<WebviewWindow> {
        self.app.get_webview_window(surface.label())
    }

    fn require(&self, surface: SurfaceKind) -> Result<WebviewWindow> {
        self.window(surface)
            .ok_or_else(|| HaruError::surface(format!("{} window does not exist", surface.label())))
    }
}

#[async_trait]
impl SurfaceHost for TauriSurfaceHost {
    async fn exists(&self, surface: SurfaceKind) -> bool {
        self.window(surface).is_some()
    }

    async fn create(&self, surface: SurfaceKind) -> Result<()> {
        if self.window(surface).is_some() {
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        let loaded = Mutex::new(Some(tx));
        let (resizable, size) = match surface {
            SurfaceKind::Panel => (self.config.panel_resizable, self.config.panel_size()),
            SurfaceKind::Indicator => (false, self.config.indicator_size()),
        };

        let window = WebviewWindowBuilder::new(
            &self.app,
            surface.label(),
            WebviewUrl::App(page_for(surface).into()),
        )
        .title("Haru")
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(resizable)
        .visible(false)
        .on_page_load(move |_window, payload| {
            if payload.event() == PageLoadEvent::Finished
                && let Ok(mut sender) = loaded.lock()
                && let Some(tx) = sender.take()
            {
                let _ = tx.send(());
            }
        })
        .build()
        .map_err(|e| surface_error(surface, e))?;

        window
            .set_size(PhysicalSize::new(to_u32(size.width), to_u32(size.height)))
            .map_err(|e| surface_error(surface, e))?;

        match tokio::time::timeout(PAGE_LOAD_TIMEOUT, rx).await {
            Ok(_) => tracing::info!("[Surfaces] {} window created", surface.label()),
            Err(_) => tracing::warn!(
                "[Surfaces] {} window did not finish loading within {:?}",
                surface.label(),
                PAGE_LOAD_TIMEOUT
            ),
        }
        Ok(())
    }

    async fn position(&self, surface: SurfaceKind) -> Result<Option<Point>> {
        let Some(window) = self.window(surface) else {
            return Ok(None);
        };
        let position = window
            .outer_position()
            .map_err(|e| surface_error(surface, e))?;
        Ok(Some(Point::new(position.x, position.y)))
    }

    async fn size(&self, surface: SurfaceKind) -> Result<Option<Size>> {
        let Some(window) = self.window(surface) else {
            return Ok(None);
        };
        let size = window.outer_size().map_err(|e| surface_error(surface, e))?;
        Ok(Some(Size::new(to_i32(size.width), to_i32(size.height))))
    }

    async fn set_position(&self, surface: SurfaceKind, position: Point) -> Result<()> {
        self.require(surface)?
            .set_position(PhysicalPosition::new(position.x, position.y))
            .map_err(|e| surface_error(surface, e))
    }

    async fn set_size(&self, surface: SurfaceKind, size: Size) -> Result<()> {
        self.require(surface)?
            .set_size(PhysicalSize::new(to_u32(size.width), to_u32(size.height)))
            .map_err(|e| surface_error(surface, e))
    }

    async fn show(&self, surface: SurfaceKind) -> Result<()> {
        self.require(surface)?
            .show()
            .map_err(|e| surface_error(surface, e))
    }

    async fn hide(&self, surface: SurfaceKind) -> Result<()> {
        self.require(surface)?
            .hide()
            .map_err(|e| surface_error(surface, e))
    }
}

/// Reads the monitor work areas, primary monitor first.
pub struct TauriDisplayLocator {
    app: AppHandle,
}

impl TauriDisplayLocator {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl DisplayLocator for TauriDisplayLocator {
    fn displays(&self) -> Result<Vec<Display>> {
        let mut monitors = self
            .app
            .available_monitors()
            .map_err(|e| HaruError::surface(format!("failed to list monitors: {e}")))?;

        let primary = self.app.primary_monitor().ok().flatten();
        if let Some(primary) = primary.as_ref() {
            let origin = *primary.position();
            monitors.sort_by_key(|monitor| *monitor.position() != origin);
            if monitors.is_empty() {
                monitors.push(primary.clone());
            }
        }

        Ok(monitors
            .iter()
            .enumerate()
            .map(|(index, monitor)| {
                let area = monitor.work_area();
                let id = monitor
                    .name()
                    .cloned()
                    .unwrap_or_else(|| format!("display-{index}"));
                Display::new(
                    id,
                    area.position.x,
                    area.position.y,
                    to_i32(area.size.width),
                    to_i32(area.size.height),
                )
            })
            .collect())
    }
}
