//! Snap functionality for aligning a moving element to guides and siblings.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Orientation of a guide or indicator line.
///
/// A vertical line sits at an x position; a horizontal line at a y position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A user-placed alignment reference line, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    pub orientation: Orientation,
    pub position: f64,
}

impl GuideLine {
    pub fn new(orientation: Orientation, position: f64) -> Self {
        Self {
            orientation,
            position,
        }
    }

    pub fn vertical(x: f64) -> Self {
        Self::new(Orientation::Vertical, x)
    }

    pub fn horizontal(y: f64) -> Self {
        Self::new(Orientation::Horizontal, y)
    }
}

/// A matched alignment, drawn as a transient indicator.
pub type SnapLine = GuideLine;

/// Which sibling alignments are checked.
///
/// Guides always match left/right/center (top/bottom/middle). Siblings by
/// default only match like edges: top-top, bottom-bottom, left-left and
/// right-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiblingAlignment {
    #[default]
    EdgesOnly,
    /// Also align centers to sibling centers.
    EdgesAndCenters,
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The adjusted top-left position.
    pub position: Point,
    /// Every alignment that matched, in match order.
    pub lines: Vec<SnapLine>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(position: Point) -> Self {
        Self {
            position,
            lines: Vec::new(),
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Match an extent `[start, start + len]` against a guide at `p`.
///
/// Tries the leading edge, then the trailing edge, then the center, and
/// returns the new start for the first that lies within `threshold`.
fn snap_extent_to_guide(start: f64, len: f64, p: f64, threshold: f64) -> Option<f64> {
    if (start - p).abs() <= threshold {
        Some(p)
    } else if (start + len - p).abs() <= threshold {
        Some(p - len)
    } else if (start + len / 2.0 - p).abs() <= threshold {
        Some(p - len / 2.0)
    } else {
        None
    }
}

/// Snap a candidate top-left position.
///
/// All distances are tested against the unsnapped candidate; when several
/// alignments match on one axis, the last one wins. `threshold` is in
/// logical pixels (see [`crate::Viewport::snap_threshold`]).
pub fn snap_position<I>(
    candidate: Point,
    size: Size,
    guides: &[GuideLine],
    siblings: I,
    threshold: f64,
    alignment: SiblingAlignment,
) -> SnapResult
where
    I: IntoIterator<Item = Rect>,
{
    let Point { x, y } = candidate;
    let (w, h) = (size.width, size.height);
    let mut result = SnapResult::none(candidate);

    for guide in guides {
        let p = guide.position;
        match guide.orientation {
            Orientation::Vertical => {
                if let Some(new_x) = snap_extent_to_guide(x, w, p, threshold) {
                    result.position.x = new_x;
                    result.lines.push(*guide);
                }
            }
            Orientation::Horizontal => {
                if let Some(new_y) = snap_extent_to_guide(y, h, p, threshold) {
                    result.position.y = new_y;
                    result.lines.push(*guide);
                }
            }
        }
    }

    for sibling in siblings {
        if (y - sibling.y0).abs() <= threshold {
            result.position.y = sibling.y0;
            result.lines.push(GuideLine::horizontal(sibling.y0));
        }
        if (y + h - sibling.y1).abs() <= threshold {
            result.position.y = sibling.y1 - h;
            result.lines.push(GuideLine::horizontal(sibling.y1));
        }
        if (x - sibling.x0).abs() <= threshold {
            result.position.x = sibling.x0;
            result.lines.push(GuideLine::vertical(sibling.x0));
        }
        if (x + w - sibling.x1).abs() <= threshold {
            result.position.x = sibling.x1 - w;
            result.lines.push(GuideLine::vertical(sibling.x1));
        }

        if alignment == SiblingAlignment::EdgesAndCenters {
            let center = sibling.center();
            if (y + h / 2.0 - center.y).abs() <= threshold {
                result.position.y = center.y - h / 2.0;
                result.lines.push(GuideLine::horizontal(center.y));
            }
            if (x + w / 2.0 - center.x).abs() <= threshold {
                result.position.x = center.x - w / 2.0;
                result.lines.push(GuideLine::vertical(center.x));
            }
        }
    }

    if result.is_snapped() {
        log::debug!(
            "Snapped ({x:.1}, {y:.1}) -> ({:.1}, {:.1}) on {} line(s)",
            result.position.x,
            result.position.y,
            result.lines.len()
        );
    }
    result
}
