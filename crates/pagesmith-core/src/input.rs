//! Pointer and keyboard input types.

use crate::element::ElementId;
use crate::handles::ResizeHandle;
use crate::snap::Orientation;
use kurbo::Point;

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Empty canvas.
    Canvas,
    /// An element body.
    Element(ElementId),
    /// A resize grip of an element.
    Resize(ElementId, ResizeHandle),
    /// The rotation grip of an element.
    Rotate(ElementId),
    /// One of the rulers along the canvas edges.
    Ruler(Orientation),
    /// An existing guide line, by index.
    Guide(usize),
}

/// Pointer event in screen coordinates.
///
/// `target: None` asks the editor to hit-test the position itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        position: Point,
        target: Option<PointerTarget>,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    DoubleClick {
        position: Point,
        target: Option<PointerTarget>,
    },
    Scroll {
        delta_y: f64,
        modifiers: Modifiers,
    },
}

/// Editor commands bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Delete,
    Deselect,
    Duplicate,
}

/// Map a key press to an editor command.
pub fn shortcut_for(key: &str, modifiers: Modifiers) -> Option<Shortcut> {
    match key {
        "Delete" => Some(Shortcut::Delete),
        "Escape" => Some(Shortcut::Deselect),
        "d" | "D" if modifiers.command() => Some(Shortcut::Duplicate),
        _ => None,
    }
}
