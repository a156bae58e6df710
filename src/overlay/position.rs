//! Live device position overlay
//!
//! Draws a stroke-only circle whose radius is the reported accuracy of the
//! most recent position. Nothing is drawn until a position has been set.

use crate::core::{LatLong, Position};
use crate::render::{CircleCommand, DisplayModel, Layer, Paint, RenderBackend, Viewport};
use log::{debug, trace};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Position state owned by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayState {
    pub current_position: Option<Position>,
    /// Latches to true on the first position and never resets
    pub has_been_set: bool,
}

struct Binding {
    backend: Arc<dyn RenderBackend>,
    display_model: DisplayModel,
}

struct Inner {
    state: OverlayState,
    binding: Option<Binding>,
}

/// Overlay marking the current device position on the map
pub struct PositionOverlay {
    inner: Mutex<Inner>,
    paint: Paint,
}

impl PositionOverlay {
    pub fn new() -> Self {
        Self::with_paint(Paint::default())
    }

    pub fn with_paint(paint: Paint) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: OverlayState::default(),
                binding: None,
            }),
            paint,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new position and ask the backend for a redraw
    ///
    /// Coordinates are taken as-is. Safe to call from any thread.
    pub fn set_position(&self, latitude: f64, longitude: f64, accuracy_m: f32) {
        let backend = {
            let mut inner = self.lock();
            inner.state.current_position = Some(Position::new(latitude, longitude, accuracy_m));
            inner.state.has_been_set = true;
            inner.binding.as_ref().map(|b| Arc::clone(&b.backend))
        };

        trace!("Overlay position set to ({}, {}) +/- {}m", latitude, longitude, accuracy_m);

        if let Some(backend) = backend {
            backend.request_redraw();
        }
    }

    /// Produce the draw command for this pass, if any
    pub fn render(&self, viewport: &Viewport) -> Option<CircleCommand> {
        let inner = self.lock();
        self.command(&inner, viewport)
    }

    fn command(&self, inner: &Inner, viewport: &Viewport) -> Option<CircleCommand> {
        if !inner.state.has_been_set {
            return None;
        }
        let position = inner.state.current_position?;

        let display_model = inner
            .binding
            .as_ref()
            .map(|b| b.display_model)
            .unwrap_or_default();
        let mpp = viewport.meters_per_pixel(position.latitude, display_model.tile_size);
        let radius_px = if mpp > 0.0 {
            (position.accuracy_m as f64 / mpp) as f32
        } else {
            0.0
        };

        let mut paint = self.paint;
        paint.stroke_width *= display_model.scale_factor;

        Some(CircleCommand {
            center: LatLong::new(position.latitude, position.longitude),
            radius_m: position.accuracy_m,
            radius_px,
            paint,
        })
    }

    pub fn state(&self) -> OverlayState {
        self.lock().state
    }

    pub fn paint(&self) -> Paint {
        self.paint
    }

    pub fn is_attached(&self) -> bool {
        self.lock().binding.is_some()
    }

    /// Display parameters bound on attach
    pub fn display_model(&self) -> Option<DisplayModel> {
        self.lock().binding.as_ref().map(|b| b.display_model)
    }
}

impl Default for PositionOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for PositionOverlay {
    fn on_attach(&self, backend: Arc<dyn RenderBackend>) {
        let display_model = backend.display_model();
        debug!("Position overlay attached (tile size {})", display_model.tile_size);
        self.lock().binding = Some(Binding {
            backend,
            display_model,
        });
    }

    fn draw(&self, viewport: &Viewport) {
        let (command, backend) = {
            let inner = self.lock();
            let Some(binding) = inner.binding.as_ref() else {
                return;
            };
            let backend = Arc::clone(&binding.backend);
            (self.command(&inner, viewport), backend)
        };

        let Some(command) = command else {
            return;
        };
        if !viewport
            .bounding_box
            .intersects_circle(command.center, command.radius_m)
        {
            trace!("Position circle outside the viewport, not drawn");
            return;
        }
        backend.draw_circle(command.center, command.radius_m, &command.paint);
    }

    fn on_detach(&self) {
        if self.lock().binding.take().is_some() {
            debug!("Position overlay detached");
        }
    }
}
