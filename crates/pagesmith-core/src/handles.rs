//! Selection handles: the eight resize grips and the rotation grip.

use crate::element::Geometry;
use kurbo::{Point, Size, Vec2};
use std::fmt;
use std::str::FromStr;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Distance of the rotation handle above the top edge, in logical pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// One of the eight compass-point resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NW,
        ResizeHandle::N,
        ResizeHandle::NE,
        ResizeHandle::E,
        ResizeHandle::SE,
        ResizeHandle::S,
        ResizeHandle::SW,
        ResizeHandle::W,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResizeHandle::N => "n",
            ResizeHandle::S => "s",
            ResizeHandle::E => "e",
            ResizeHandle::W => "w",
            ResizeHandle::NE => "ne",
            ResizeHandle::NW => "nw",
            ResizeHandle::SE => "se",
            ResizeHandle::SW => "sw",
        }
    }

    /// Whether this handle drags the west edge.
    pub fn moves_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::NW | ResizeHandle::SW)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::NE | ResizeHandle::SE)
    }

    /// Whether this handle drags the north edge.
    pub fn moves_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::NE | ResizeHandle::NW)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::SE | ResizeHandle::SW)
    }

    /// Position of the handle on an unrotated box, as fractions of its size.
    fn anchor(self) -> (f64, f64) {
        let fx = if self.moves_west() {
            0.0
        } else if self.moves_east() {
            1.0
        } else {
            0.5
        };
        let fy = if self.moves_north() {
            0.0
        } else if self.moves_south() {
            1.0
        } else {
            0.5
        };
        (fx, fy)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeHandle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResizeHandle::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| format!("unknown resize handle: {s}"))
    }
}

/// Constraints applied after the raw resize arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_size: f64,
    /// Part of the element that must stay within the canvas.
    pub boundary_buffer: f64,
    pub canvas: Size,
}

/// Apply a resize drag to the geometry captured at gesture start.
///
/// `delta` is the pointer movement since the gesture began, already in
/// logical units. Width and height never drop below `min_size`; when they
/// would, the origin is compensated so the opposite edge stays put. The
/// origin is then clamped so at least `boundary_buffer` of the element
/// remains reachable on the canvas. Rotation is left untouched.
pub fn resize_geometry(
    start: &Geometry,
    handle: ResizeHandle,
    delta: Vec2,
    limits: &ResizeLimits,
) -> Geometry {
    let (dx, dy) = (delta.x, delta.y);
    let mut g = *start;

    if handle.moves_west() {
        g.x += dx;
        g.width -= dx;
    } else if handle.moves_east() {
        g.width += dx;
    }
    if handle.moves_north() {
        g.y += dy;
        g.height -= dy;
    } else if handle.moves_south() {
        g.height += dy;
    }

    if g.width < limits.min_size {
        if handle.moves_west() {
            g.x -= limits.min_size - g.width;
        }
        g.width = limits.min_size;
    }
    if g.height < limits.min_size {
        if handle.moves_north() {
            g.y -= limits.min_size - g.height;
        }
        g.height = limits.min_size;
    }

    g.x = clamp_origin(g.x, g.width, limits.canvas.width, limits.boundary_buffer);
    g.y = clamp_origin(g.y, g.height, limits.canvas.height, limits.boundary_buffer);
    g
}

/// Clamp an origin into `[-extent + buffer, canvas - buffer]`.
pub fn clamp_origin(origin: f64, extent: f64, canvas: f64, buffer: f64) -> f64 {
    let lo = -extent + buffer;
    let hi = canvas - buffer;
    if lo > hi {
        // f64::clamp panics when the window is inverted.
        return hi;
    }
    origin.clamp(lo, hi)
}

/// Kind of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Resize(ResizeHandle),
    Rotate,
}

/// A selection handle with its position in logical coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in logical coordinates) hits this handle.
    /// `tolerance` should be adjusted for zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Get the selection handles for an element, rotated with it.
///
/// The rotation handle comes first so it wins over overlapping resize grips.
pub fn element_handles(geometry: &Geometry) -> Vec<Handle> {
    let transform = geometry.rotation_transform();
    let bounds = geometry.bounds();
    let mut handles = Vec::with_capacity(9);

    let rotate = Point::new(bounds.center().x, bounds.y0 - ROTATE_HANDLE_OFFSET);
    handles.push(Handle::new(transform * rotate, HandleKind::Rotate));

    for handle in ResizeHandle::ALL {
        let (fx, fy) = handle.anchor();
        let local = Point::new(
            bounds.x0 + bounds.width() * fx,
            bounds.y0 + bounds.height() * fy,
        );
        handles.push(Handle::new(transform * local, HandleKind::Resize(handle)));
    }
    handles
}

/// Find the handle under `point`, if any.
pub fn hit_test_handles(geometry: &Geometry, point: Point, tolerance: f64) -> Option<HandleKind> {
    element_handles(geometry)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ResizeLimits {
        ResizeLimits {
            min_size: 20.0,
            boundary_buffer: 50.0,
            canvas: Size::new(595.0, 842.0),
        }
    }

    fn start() -> Geometry {
        Geometry {
            x: 100.0,
            y: 100.0,
            width: 120.0,
            height: 30.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_handle_parse() {
        assert_eq!("sw".parse::<ResizeHandle>(), Ok(ResizeHandle::SW));
        assert!("x".parse::<ResizeHandle>().is_err());
    }

    #[test]
    fn test_rule_table() {
        let d = Vec2::new(10.0, 5.0);
        let cases = [
            (ResizeHandle::NW, (110.0, 105.0, 110.0, 25.0)),
            (ResizeHandle::N, (100.0, 105.0, 120.0, 25.0)),
            (ResizeHandle::NE, (100.0, 105.0, 130.0, 25.0)),
            (ResizeHandle::E, (100.0, 100.0, 130.0, 30.0)),
            (ResizeHandle::SE, (100.0, 100.0, 130.0, 35.0)),
            (ResizeHandle::S, (100.0, 100.0, 120.0, 35.0)),
            (ResizeHandle::SW, (110.0, 100.0, 110.0, 35.0)),
            (ResizeHandle::W, (110.0, 100.0, 110.0, 30.0)),
        ];
        for (handle, (x, y, w, h)) in cases {
            let g = resize_geometry(&start(), handle, d, &limits());
            assert!((g.x - x).abs() < f64::EPSILON, "{handle} x");
            assert!((g.y - y).abs() < f64::EPSILON, "{handle} y");
            assert!((g.width - w).abs() < f64::EPSILON, "{handle} width");
            assert!((g.height - h).abs() < f64::EPSILON, "{handle} height");
        }
    }

    #[test]
    fn test_min_size_keeps_east_edge_from_west_handle() {
        let g = resize_geometry(&start(), ResizeHandle::W, Vec2::new(500.0, 0.0), &limits());
        assert!((g.width - 20.0).abs() < f64::EPSILON);
        assert!((g.x + g.width - 220.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_min_size_keeps_south_edge_from_north_handle() {
        let g = resize_geometry(&start(), ResizeHandle::N, Vec2::new(0.0, 100.0), &limits());
        assert!((g.height - 20.0).abs() < f64::EPSILON);
        assert!((g.y + g.height - 130.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_min_size_from_east_handle_keeps_origin() {
        let g = resize_geometry(&start(), ResizeHandle::SE, Vec2::new(-500.0, -500.0), &limits());
        assert!((g.width - 20.0).abs() < f64::EPSILON);
        assert!((g.height - 20.0).abs() < f64::EPSILON);
        assert!((g.x - 100.0).abs() < f64::EPSILON);
        assert!((g.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boundary_clamp() {
        let mut g = start();
        g.x = 600.0;
        g.y = -80.0;
        let g = resize_geometry(&g, ResizeHandle::SE, Vec2::new(10.0, 10.0), &limits());
        // x limited to 595 - 50, y to -40 + 50.
        assert!((g.x - 545.0).abs() < f64::EPSILON);
        assert!((g.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_origin() {
        assert!((clamp_origin(700.0, 100.0, 595.0, 50.0) - 545.0).abs() < f64::EPSILON);
        assert!((clamp_origin(-200.0, 100.0, 595.0, 50.0) + 50.0).abs() < f64::EPSILON);
        assert!((clamp_origin(10.0, 100.0, 595.0, 50.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handle_positions() {
        let handles = element_handles(&start());
        assert_eq!(handles.len(), 9);
        assert_eq!(handles[0].kind, HandleKind::Rotate);
        let rotate = handles[0].position;
        assert!((rotate.x - 160.0).abs() < 1e-9);
        assert!((rotate.y - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_handles() {
        let g = start();
        assert_eq!(
            hit_test_handles(&g, Point::new(221.0, 131.0), 4.0),
            Some(HandleKind::Resize(ResizeHandle::SE))
        );
        assert_eq!(hit_test_handles(&g, Point::new(160.0, 115.0), 4.0), None);
    }

    #[test]
    fn test_handles_follow_rotation() {
        let mut g = start();
        g.rotation = 180.0;
        // The SE grip lands on the unrotated NW corner.
        assert_eq!(
            hit_test_handles(&g, Point::new(100.0, 100.0), 1.0),
            Some(HandleKind::Resize(ResizeHandle::SE))
        );
    }
}
