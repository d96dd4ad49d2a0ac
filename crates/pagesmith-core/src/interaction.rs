//! Pointer interaction state machine: drag, resize, rotate and guide placement.
//!
//! Exactly one gesture is active at a time. A pointer-down starts a gesture
//! from [`Gesture::Idle`]; pointer-moves update the target live; a pointer-up
//! anywhere ends it and asks the host to refresh the properties panel.

use crate::editor::{Editor, EditorEvent};
use crate::element::{ElementId, Geometry, normalize_rotation};
use crate::error::{EditorError, EditorResult};
use crate::handles::{ResizeHandle, resize_geometry};
use crate::input::{PointerEvent, PointerTarget};
use crate::snap::{Orientation, snap_position};
use crate::tools::ToolKind;
use kurbo::{Point, Vec2};

/// Active drag of an element body.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub element: ElementId,
    /// Pointer position relative to the element origin, captured at start.
    pub offset: Vec2,
    /// Geometry at gesture start.
    pub start: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeState {
    pub element: ElementId,
    pub handle: ResizeHandle,
    /// Geometry at gesture start.
    pub start: Geometry,
    /// Pointer position at gesture start, in screen pixels.
    pub pointer_start: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotateState {
    pub element: ElementId,
    /// Element center at gesture start; fixed for the whole gesture.
    pub center: Point,
    /// Pointer angle around `center` at start, in radians.
    pub start_angle: f64,
    /// Element rotation at start, in degrees.
    pub start_rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuideState {
    pub index: usize,
    /// Position before the gesture; `None` for a guide pulled from a ruler.
    pub start: Option<f64>,
}

/// The single active pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(DragState),
    Resizing(ResizeState),
    Rotating(RotateState),
    PlacingGuide(GuideState),
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Dragging(_) => "drag",
            Gesture::Resizing(_) => "resize",
            Gesture::Rotating(_) => "rotate",
            Gesture::PlacingGuide(_) => "guide placement",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// The element this gesture manipulates, if any.
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Gesture::Dragging(s) => Some(&s.element),
            Gesture::Resizing(s) => Some(&s.element),
            Gesture::Rotating(s) => Some(&s.element),
            Gesture::Idle | Gesture::PlacingGuide(_) => None,
        }
    }
}

fn target_name(target: &PointerTarget) -> &'static str {
    match target {
        PointerTarget::Canvas => "canvas click",
        PointerTarget::Element(_) => "drag",
        PointerTarget::Resize(..) => "resize",
        PointerTarget::Rotate(_) => "rotate",
        PointerTarget::Ruler(_) | PointerTarget::Guide(_) => "guide placement",
    }
}

fn axis(point: Point, orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Vertical => point.x,
        Orientation::Horizontal => point.y,
    }
}

fn angle_around(center: Point, point: Point) -> f64 {
    (point - center).atan2()
}

impl Editor {
    /// Dispatch a pointer event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EditorResult<()> {
        match event {
            PointerEvent::Down { position, target } => self.pointer_down(position, target),
            PointerEvent::Move { position } => {
                self.pointer_move(position);
                Ok(())
            }
            PointerEvent::Up { position } => {
                self.pointer_up(position);
                Ok(())
            }
            PointerEvent::DoubleClick { position, target } => self.double_click(position, target),
            PointerEvent::Scroll { delta_y, modifiers } => {
                self.wheel(delta_y, modifiers);
                Ok(())
            }
        }
    }

    /// Start a gesture at a screen position.
    ///
    /// With `target: None` the target is hit-tested. Fails if a gesture is
    /// already active or the target element does not exist.
    pub fn pointer_down(
        &mut self,
        position: Point,
        target: Option<PointerTarget>,
    ) -> EditorResult<()> {
        let target = target.unwrap_or_else(|| self.hit_test(position));
        if !self.gesture.is_idle() {
            let requested = target_name(&target);
            log::warn!(
                "Rejected {requested}: {} gesture still active",
                self.gesture.name()
            );
            return Err(EditorError::GestureInProgress {
                requested,
                active: self.gesture.name(),
            });
        }

        let logical = self.viewport.screen_to_logical(position);
        self.gesture = match target {
            PointerTarget::Canvas => {
                match self.tool().element_type() {
                    Some(element_type) => {
                        self.create_element(element_type, logical);
                        self.set_tool(ToolKind::Select);
                    }
                    None => self.deselect(),
                }
                Gesture::Idle
            }
            PointerTarget::Element(id) => {
                let start = self.require(&id)?.geometry;
                self.select(Some(id.clone()));
                Gesture::Dragging(DragState {
                    element: id,
                    offset: logical - start.origin(),
                    start,
                })
            }
            PointerTarget::Resize(id, handle) => {
                let start = self.require(&id)?.geometry;
                self.select(Some(id.clone()));
                self.clear_snap_lines();
                Gesture::Resizing(ResizeState {
                    element: id,
                    handle,
                    start,
                    pointer_start: position,
                })
            }
            PointerTarget::Rotate(id) => {
                let geometry = self.require(&id)?.geometry;
                self.select(Some(id.clone()));
                let center = geometry.center();
                Gesture::Rotating(RotateState {
                    element: id,
                    center,
                    start_angle: angle_around(center, logical),
                    start_rotation: geometry.rotation,
                })
            }
            PointerTarget::Ruler(orientation) => {
                let index = self.add_guide(orientation, axis(logical, orientation));
                Gesture::PlacingGuide(GuideState { index, start: None })
            }
            PointerTarget::Guide(index) => {
                let start = self
                    .guides
                    .get(index)
                    .map(|g| g.position)
                    .ok_or(EditorError::GuideNotFound(index))?;
                Gesture::PlacingGuide(GuideState {
                    index,
                    start: Some(start),
                })
            }
        };
        if !self.gesture.is_idle() {
            log::debug!("Gesture started: {}", self.gesture.name());
        }
        Ok(())
    }

    /// Update the active gesture for a pointer at `position` (screen pixels).
    pub fn pointer_move(&mut self, position: Point) {
        let logical = self.viewport.screen_to_logical(position);
        match self.gesture.clone() {
            Gesture::Idle => {}
            Gesture::Dragging(state) => self.drag_to(&state, logical),
            Gesture::Resizing(state) => {
                let delta = self.viewport.screen_delta_to_logical(position - state.pointer_start);
                let geometry = resize_geometry(&state.start, state.handle, delta, &self.resize_limits());
                self.update_geometry(&state.element, |g| {
                    g.x = geometry.x;
                    g.y = geometry.y;
                    g.width = geometry.width;
                    g.height = geometry.height;
                });
            }
            Gesture::Rotating(state) => {
                let diff = angle_around(state.center, logical) - state.start_angle;
                let rotation = normalize_rotation(state.start_rotation + diff.to_degrees());
                self.update_geometry(&state.element, |g| g.rotation = rotation);
            }
            Gesture::PlacingGuide(state) => {
                let Some(orientation) = self.guides.get(state.index).map(|g| g.orientation) else {
                    self.gesture = Gesture::Idle;
                    return;
                };
                let position = self.clamp_guide_position(orientation, axis(logical, orientation));
                if let Some(guide) = self.guides.get_mut(state.index) {
                    guide.position = position;
                }
                self.emit(EditorEvent::GuidesChanged);
            }
        }
    }

    /// End the active gesture. Accepted from anywhere, in any state.
    pub fn pointer_up(&mut self, _position: Point) {
        let gesture = std::mem::take(&mut self.gesture);
        if gesture.is_idle() {
            return;
        }
        log::debug!("Gesture ended: {}", gesture.name());
        self.clear_snap_lines();
        if let Some(id) = gesture.element() {
            if self.store.contains(id) {
                self.emit(EditorEvent::PropertiesRefresh(id.clone()));
            }
        }
    }

    /// Abandon the active gesture and put its target back where it started.
    ///
    /// A guide pulled from a ruler during the gesture is removed again.
    /// Returns false when no gesture was active.
    pub fn cancel_gesture(&mut self) -> bool {
        let gesture = std::mem::take(&mut self.gesture);
        if gesture.is_idle() {
            return false;
        }
        log::debug!("Gesture cancelled: {}", gesture.name());
        match gesture {
            Gesture::Idle => {}
            Gesture::Dragging(DragState { element, start, .. })
            | Gesture::Resizing(ResizeState { element, start, .. }) => {
                self.update_geometry(&element, |g| *g = start);
            }
            Gesture::Rotating(state) => {
                self.update_geometry(&state.element, |g| g.rotation = state.start_rotation);
            }
            Gesture::PlacingGuide(GuideState { index, start }) => match start {
                Some(position) => {
                    if let Some(guide) = self.guides.get_mut(index) {
                        guide.position = position;
                        self.emit(EditorEvent::GuidesChanged);
                    }
                }
                None => {
                    if index < self.guides.len() {
                        self.guides.remove(index);
                        self.emit(EditorEvent::GuidesChanged);
                    }
                }
            },
        }
        self.clear_snap_lines();
        true
    }

    /// Double-clicking a guide deletes it.
    pub fn double_click(
        &mut self,
        position: Point,
        target: Option<PointerTarget>,
    ) -> EditorResult<()> {
        let target = target.unwrap_or_else(|| self.hit_test(position));
        if let PointerTarget::Guide(index) = target {
            self.remove_guide(index)?;
        }
        Ok(())
    }

    fn drag_to(&mut self, state: &DragState, logical: Point) {
        let Some(element) = self.store.get(&state.element) else {
            self.gesture = Gesture::Idle;
            return;
        };
        let candidate = logical - state.offset;
        let size = element.geometry.size();

        let position = if self.snap_enabled {
            let threshold = self.viewport.snap_threshold(self.config.snap.threshold);
            let siblings = self
                .store
                .iter()
                .filter(|other| other.id() != &state.element)
                .map(|other| other.geometry.bounds());
            let result = snap_position(
                candidate,
                size,
                &self.guides,
                siblings,
                threshold,
                self.sibling_alignment,
            );
            if result.lines != self.snap_lines {
                self.snap_lines = result.lines;
                self.emit(EditorEvent::SnapLinesChanged);
            }
            result.position
        } else {
            candidate
        };

        self.update_geometry(&state.element, |g| {
            g.x = position.x;
            g.y = position.y;
        });
    }

    fn update_geometry(&mut self, id: &ElementId, f: impl FnOnce(&mut Geometry)) {
        match self.store.get_mut(id) {
            Some(element) => {
                f(&mut element.geometry);
                self.emit(EditorEvent::ElementMoved(id.clone()));
            }
            None => {
                log::warn!("Gesture target {id} vanished, returning to idle");
                self.gesture = Gesture::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::snap::GuideLine;

    fn editor_with_rect() -> (Editor, ElementId) {
        let mut editor = Editor::default();
        let id = editor.create_element(ElementType::Rectangle, Point::new(100.0, 100.0));
        (editor, id)
    }

    fn geometry(editor: &Editor, id: &ElementId) -> Geometry {
        editor.element(id).unwrap().geometry
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let (mut editor, id) = editor_with_rect();
        editor.set_snap_enabled(false);
        editor
            .pointer_down(Point::new(110.0, 120.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(410.0, 20.0));
        let g = geometry(&editor, &id);
        assert!((g.x - 400.0).abs() < f64::EPSILON);
        assert!((g.y - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_off_canvas_is_not_clamped() {
        let (mut editor, id) = editor_with_rect();
        editor.set_snap_enabled(false);
        editor.pointer_down(Point::new(120.0, 120.0), None).unwrap();
        assert!(matches!(editor.gesture(), Gesture::Dragging(_)));
        editor.pointer_move(Point::new(-500.0, 2000.0));
        let g = geometry(&editor, &id);
        assert!((g.x + 520.0).abs() < f64::EPSILON);
        assert!((g.y - 1980.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_snaps_and_clears_lines_on_up() {
        let (mut editor, id) = editor_with_rect();
        editor.add_guide(Orientation::Vertical, 150.0);
        editor
            .pointer_down(Point::new(100.0, 100.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(147.0, 300.0));
        assert!((geometry(&editor, &id).x - 150.0).abs() < f64::EPSILON);
        assert_eq!(editor.snap_lines(), &[GuideLine::vertical(150.0)]);

        editor.take_events();
        editor.pointer_up(Point::new(147.0, 300.0));
        assert!(editor.gesture().is_idle());
        assert!(editor.snap_lines().is_empty());
        let events = editor.take_events();
        assert!(events.contains(&EditorEvent::PropertiesRefresh(id)));
    }

    #[test]
    fn test_second_gesture_rejected() {
        let (mut editor, id) = editor_with_rect();
        editor
            .pointer_down(Point::new(100.0, 100.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        let result = editor.pointer_down(
            Point::new(200.0, 160.0),
            Some(PointerTarget::Resize(id.clone(), ResizeHandle::SE)),
        );
        assert!(matches!(
            result,
            Err(EditorError::GestureInProgress { requested: "resize", active: "drag" })
        ));
        assert!(matches!(editor.gesture(), Gesture::Dragging(_)));
    }

    #[test]
    fn test_resize_uses_zoomed_delta() {
        let (mut editor, id) = editor_with_rect();
        editor.set_zoom(2.0);
        editor
            .pointer_down(
                Point::new(400.0, 320.0),
                Some(PointerTarget::Resize(id.clone(), ResizeHandle::E)),
            )
            .unwrap();
        editor.pointer_move(Point::new(440.0, 500.0));
        let g = geometry(&editor, &id);
        assert!((g.width - 120.0).abs() < f64::EPSILON);
        assert!((g.height - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_never_snaps() {
        let (mut editor, id) = editor_with_rect();
        editor.add_guide(Orientation::Vertical, 203.0);
        editor
            .pointer_down(
                Point::new(200.0, 160.0),
                Some(PointerTarget::Resize(id.clone(), ResizeHandle::E)),
            )
            .unwrap();
        editor.pointer_move(Point::new(201.0, 160.0));
        assert!((geometry(&editor, &id).width - 101.0).abs() < f64::EPSILON);
        assert!(editor.snap_lines().is_empty());
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let (mut editor, id) = editor_with_rect();
        // Center is (150, 130). Start to the right, move below.
        editor
            .pointer_down(Point::new(200.0, 130.0), Some(PointerTarget::Rotate(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(150.0, 180.0));
        assert!((geometry(&editor, &id).rotation - 90.0).abs() < 1e-9);
        editor.pointer_move(Point::new(150.0, 80.0));
        assert!((geometry(&editor, &id).rotation - 270.0).abs() < 1e-9);
        editor.pointer_up(Point::ZERO);
    }

    #[test]
    fn test_ruler_places_guide() {
        let mut editor = Editor::default();
        editor
            .pointer_down(Point::new(40.0, 5.0), Some(PointerTarget::Ruler(Orientation::Vertical)))
            .unwrap();
        editor.pointer_move(Point::new(1000.0, 5.0));
        assert!((editor.guides()[0].position - 595.0).abs() < f64::EPSILON);
        editor.pointer_move(Point::new(-10.0, 5.0));
        assert!((editor.guides()[0].position).abs() < f64::EPSILON);
        editor.pointer_up(Point::ZERO);
        assert!(editor.gesture().is_idle());
    }

    #[test]
    fn test_double_click_removes_guide() {
        let mut editor = Editor::default();
        editor.add_guide(Orientation::Horizontal, 300.0);
        editor
            .handle_pointer(PointerEvent::DoubleClick {
                position: Point::new(20.0, 301.0),
                target: None,
            })
            .unwrap();
        assert!(editor.guides().is_empty());
    }

    #[test]
    fn test_tool_creates_on_canvas() {
        let mut editor = Editor::default();
        editor.set_tool(ToolKind::Create(ElementType::Circle));
        editor.pointer_down(Point::new(300.0, 400.0), None).unwrap();
        assert_eq!(editor.store().len(), 1);
        assert_eq!(editor.tool(), ToolKind::Select);
        let circle = editor.selected_element().unwrap();
        assert_eq!(circle.element_type(), ElementType::Circle);
        assert!((circle.geometry.x - 300.0).abs() < f64::EPSILON);
        assert!(editor.gesture().is_idle());
    }

    #[test]
    fn test_canvas_click_deselects() {
        let (mut editor, _) = editor_with_rect();
        editor.pointer_down(Point::new(500.0, 700.0), None).unwrap();
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_delete_during_drag_ends_gesture() {
        let (mut editor, id) = editor_with_rect();
        editor.pointer_down(Point::new(120.0, 120.0), None).unwrap();
        editor.delete(&id).unwrap();
        assert!(editor.gesture().is_idle());
        editor.pointer_move(Point::new(0.0, 0.0));
        editor.pointer_up(Point::ZERO);
    }

    #[test]
    fn test_drag_snaps_at_exact_threshold() {
        let (mut editor, id) = editor_with_rect();
        editor.add_guide(Orientation::Vertical, 150.0);
        editor
            .pointer_down(Point::new(100.0, 100.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(145.0, 100.0));
        assert!((geometry(&editor, &id).x - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cancel_drag_restores_start() {
        let (mut editor, id) = editor_with_rect();
        let start = geometry(&editor, &id);
        editor
            .pointer_down(Point::new(110.0, 110.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(400.0, 500.0));
        assert!(editor.cancel_gesture());
        assert_eq!(geometry(&editor, &id), start);
        assert!(editor.gesture().is_idle());
        assert!(!editor.cancel_gesture());
    }

    #[test]
    fn test_cancel_resize_and_rotate() {
        let (mut editor, id) = editor_with_rect();
        let start = geometry(&editor, &id);
        editor
            .pointer_down(
                Point::new(200.0, 160.0),
                Some(PointerTarget::Resize(id.clone(), ResizeHandle::SE)),
            )
            .unwrap();
        editor.pointer_move(Point::new(260.0, 220.0));
        editor.cancel_gesture();
        assert_eq!(geometry(&editor, &id), start);

        editor
            .pointer_down(Point::new(200.0, 130.0), Some(PointerTarget::Rotate(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(150.0, 180.0));
        editor.cancel_gesture();
        assert!((geometry(&editor, &id).rotation).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cancel_guide_gestures() {
        let mut editor = Editor::default();
        editor.add_guide(Orientation::Horizontal, 300.0);
        editor
            .pointer_down(Point::new(20.0, 300.0), Some(PointerTarget::Guide(0)))
            .unwrap();
        editor.pointer_move(Point::new(20.0, 500.0));
        editor.cancel_gesture();
        assert!((editor.guides()[0].position - 300.0).abs() < f64::EPSILON);

        editor
            .pointer_down(Point::new(40.0, 5.0), Some(PointerTarget::Ruler(Orientation::Vertical)))
            .unwrap();
        assert_eq!(editor.guides().len(), 2);
        editor.cancel_gesture();
        assert_eq!(editor.guides().len(), 1);
    }

    #[test]
    fn test_escape_cancels_before_deselecting() {
        let (mut editor, id) = editor_with_rect();
        editor
            .pointer_down(Point::new(110.0, 110.0), Some(PointerTarget::Element(id.clone())))
            .unwrap();
        editor.pointer_move(Point::new(300.0, 300.0));
        assert!(editor.key_down("Escape", crate::input::Modifiers::NONE));
        assert!(editor.gesture().is_idle());
        assert!((geometry(&editor, &id).x - 100.0).abs() < f64::EPSILON);
        assert_eq!(editor.selection(), Some(&id));

        editor.key_down("Escape", crate::input::Modifiers::NONE);
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_up_without_gesture_is_noop() {
        let mut editor = Editor::default();
        editor.pointer_up(Point::ZERO);
        assert!(editor.take_events().is_empty());
    }
}
