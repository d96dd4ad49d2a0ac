//! Viewport module for the zoom transform between screen and canvas space.

use crate::config::CanvasConfig;
use kurbo::{Affine, Point, Size, Vec2};

/// Viewport maps screen pointer positions to canvas-logical coordinates.
///
/// The canvas is drawn with its top-left corner at `origin` (screen pixels)
/// and scaled uniformly by `zoom`. Everything downstream works in logical
/// coordinates; only rendering re-applies the zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Screen position of the canvas top-left corner.
    pub origin: Vec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    canvas: Size,
    min_canvas: f64,
    max_canvas: f64,
    fit_padding: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl Viewport {
    /// Create a viewport at 100% zoom with the configured default canvas size.
    ///
    /// An invalid config (see [`CanvasConfig::validate`]) is replaced by the
    /// defaults.
    pub fn new(config: &CanvasConfig) -> Self {
        let fallback;
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("{e}; using default canvas limits");
                fallback = CanvasConfig::default();
                &fallback
            }
        };
        let mut viewport = Self {
            origin: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            canvas: Size::ZERO,
            min_canvas: config.min_size,
            max_canvas: config.max_size,
            fit_padding: config.fit_padding,
        };
        viewport.set_canvas_size(config.default_width, config.default_height);
        viewport.zoom = 1.0_f64.clamp(viewport.min_zoom, viewport.max_zoom);
        viewport
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Zoom as a whole percentage for display.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Logical canvas size.
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Set the logical canvas size, clamping each axis to the configured range.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> Size {
        let clamp = |v: f64| {
            if v.is_finite() {
                v.clamp(self.min_canvas, self.max_canvas)
            } else {
                self.min_canvas
            }
        };
        self.canvas = Size::new(clamp(width), clamp(height));
        self.canvas
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts logical coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin) * Affine::scale(self.zoom)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.origin)
    }

    /// `logical = (screen - origin) / zoom`.
    pub fn screen_to_logical(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    pub fn logical_to_screen(&self, logical: Point) -> Point {
        self.transform() * logical
    }

    /// Convert a screen-space delta to logical units.
    pub fn screen_delta_to_logical(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Convert a distance in screen pixels to logical pixels.
    pub fn screen_distance(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// Set the zoom level, clamped. Returns true if it changed.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !zoom.is_finite() {
            return false;
        }
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }
        self.zoom = new_zoom;
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - self.zoom_step)
    }

    /// Scroll-wheel zoom. Only acts while the zoom modifier is held;
    /// scrolling down zooms out. Returns true if the event was consumed.
    pub fn wheel(&mut self, delta_y: f64, modifier_held: bool) -> bool {
        if !modifier_held || delta_y == 0.0 {
            return false;
        }
        if delta_y > 0.0 {
            self.zoom_out();
        } else {
            self.zoom_in();
        }
        true
    }

    /// Zoom so the whole canvas fits the workspace, never above 100%.
    pub fn fit(&mut self, workspace: Size) -> f64 {
        let available = Size::new(
            (workspace.width - self.fit_padding).max(1.0),
            (workspace.height - self.fit_padding).max(1.0),
        );
        let scale = (available.width / self.canvas.width)
            .min(available.height / self.canvas.height)
            .min(1.0);
        self.set_zoom(scale.max(self.min_zoom));
        self.zoom
    }

    /// Snap threshold in logical pixels for a threshold given in screen pixels.
    pub fn snap_threshold(&self, screen_pixels: f64) -> f64 {
        self.screen_distance(screen_pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert!((viewport.zoom() - 1.0).abs() < f64::EPSILON);
        assert!((viewport.canvas_size().width - 595.0).abs() < f64::EPSILON);
        assert!((viewport.canvas_size().height - 842.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_inverted_limits_fall_back_to_defaults() {
        let config = CanvasConfig {
            min_zoom: 5.0,
            min_size: 3000.0,
            ..CanvasConfig::default()
        };
        let mut viewport = Viewport::new(&config);
        assert!((viewport.zoom() - 1.0).abs() < f64::EPSILON);
        assert!((viewport.max_zoom() - 4.0).abs() < f64::EPSILON);
        assert!((viewport.canvas_size().width - 595.0).abs() < f64::EPSILON);
        assert!((viewport.set_canvas_size(5000.0, 50.0).width - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_logical() {
        let mut viewport = Viewport::default();
        viewport.origin = Vec2::new(40.0, 60.0);
        viewport.set_zoom(2.0);
        let logical = viewport.screen_to_logical(Point::new(140.0, 260.0));
        assert!((logical.x - 50.0).abs() < f64::EPSILON);
        assert!((logical.y - 100.0).abs() < f64::EPSILON);

        let back = viewport.logical_to_screen(logical);
        assert!((back.x - 140.0).abs() < 1e-9);
        assert!((back.y - 260.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut viewport = Viewport::default();
        assert!(viewport.set_zoom(100.0));
        assert!((viewport.zoom() - 4.0).abs() < f64::EPSILON);
        assert!(!viewport.zoom_in());
        viewport.set_zoom(0.0);
        assert!((viewport.zoom() - 0.25).abs() < f64::EPSILON);
        assert!(!viewport.zoom_out());
    }

    #[test]
    fn test_zoom_steps() {
        let mut viewport = Viewport::default();
        viewport.zoom_in();
        assert!((viewport.zoom() - 1.25).abs() < f64::EPSILON);
        viewport.zoom_out();
        viewport.zoom_out();
        assert!((viewport.zoom() - 0.75).abs() < f64::EPSILON);
        assert_eq!(viewport.zoom_percent(), 75);
    }

    #[test]
    fn test_wheel_requires_modifier() {
        let mut viewport = Viewport::default();
        assert!(!viewport.wheel(120.0, false));
        assert!((viewport.zoom() - 1.0).abs() < f64::EPSILON);
        assert!(viewport.wheel(120.0, true));
        assert!((viewport.zoom() - 0.75).abs() < f64::EPSILON);
        assert!(viewport.wheel(-120.0, true));
        assert!((viewport.zoom() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_never_zooms_past_100() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(2.0);
        let zoom = viewport.fit(Size::new(4000.0, 4000.0));
        assert!((zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_small_workspace() {
        let mut viewport = Viewport::default();
        // (451 - 30) / 842 = 0.5
        let zoom = viewport.fit(Size::new(1000.0, 451.0));
        assert!((zoom - 0.5).abs() < 1e-9);
        let zoom = viewport.fit(Size::new(50.0, 50.0));
        assert!((zoom - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_canvas_size_clamped() {
        let mut viewport = Viewport::default();
        let size = viewport.set_canvas_size(50.0, 5000.0);
        assert!((size.width - 100.0).abs() < f64::EPSILON);
        assert!((size.height - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_threshold_scales_with_zoom() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(2.0);
        assert!((viewport.snap_threshold(5.0) - 2.5).abs() < f64::EPSILON);
        viewport.set_zoom(0.5);
        assert!((viewport.snap_threshold(5.0) - 10.0).abs() < f64::EPSILON);
    }
}
