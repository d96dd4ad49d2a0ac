//! The editor context: element store, layer order, guides, selection and
//! viewport, owned together and mutated through one object.

use crate::color::{Cmyk, ColorMode, Swatch};
use crate::config::{EditorConfig, ElementDefaults};
use crate::element::{Element, ElementId, ElementStyle, ElementType, TextAlign, normalize_rotation};
use crate::error::{EditorError, EditorResult};
use crate::handles::{HANDLE_HIT_TOLERANCE, HandleKind, ResizeLimits, hit_test_handles};
use crate::input::{Modifiers, PointerTarget, Shortcut, shortcut_for};
use crate::interaction::Gesture;
use crate::layers::LayerOrder;
use crate::snap::{GuideLine, Orientation, SiblingAlignment, SnapLine};
use crate::store::ElementStore;
use crate::tools::ToolKind;
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use std::collections::{HashMap, VecDeque};

/// Offset applied to duplicated elements.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Undrained events kept before the oldest are discarded.
pub const MAX_PENDING_EVENTS: usize = 4096;

/// Notifications for the host UI, drained with [`Editor::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    ElementAdded(ElementId),
    ElementRemoved(ElementId),
    /// Geometry changed during a gesture.
    ElementMoved(ElementId),
    /// A property edit was applied.
    ElementChanged(ElementId),
    /// A gesture ended; numeric property fields should be refreshed.
    PropertiesRefresh(ElementId),
    SelectionChanged(Option<ElementId>),
    /// Selection controls of `id` should be shown or hidden.
    ControlsVisible { id: ElementId, visible: bool },
    LayersChanged,
    GuidesChanged,
    SnapLinesChanged,
    ZoomChanged(f64),
    CanvasResized(Size),
    Cleared,
}

/// Which colour of an element a property edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTarget {
    Text,
    Background,
    Border,
}

/// A single property-panel edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyEdit {
    Name(String),
    X(f64),
    Y(f64),
    Width(f64),
    Height(f64),
    Rotation(f64),
    Opacity(f64),
    Text(String),
    FontSize(f64),
    FontFamily(String),
    TextAlign(TextAlign),
    LineHeight(f64),
    BorderWidth(f64),
    ColorHex(ColorTarget, String),
    ColorCmyk(ColorTarget, Cmyk),
    ColorMode(ColorMode),
}

impl PropertyEdit {
    /// The numeric payload, for edits that carry one.
    fn number(&self) -> Option<f64> {
        match self {
            PropertyEdit::X(v)
            | PropertyEdit::Y(v)
            | PropertyEdit::Width(v)
            | PropertyEdit::Height(v)
            | PropertyEdit::Rotation(v)
            | PropertyEdit::Opacity(v)
            | PropertyEdit::FontSize(v)
            | PropertyEdit::LineHeight(v)
            | PropertyEdit::BorderWidth(v) => Some(*v),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PropertyEdit::Name(_) => "name",
            PropertyEdit::X(_) => "x",
            PropertyEdit::Y(_) => "y",
            PropertyEdit::Width(_) => "width",
            PropertyEdit::Height(_) => "height",
            PropertyEdit::Rotation(_) => "rotation",
            PropertyEdit::Opacity(_) => "opacity",
            PropertyEdit::Text(_) => "text",
            PropertyEdit::FontSize(_) => "fontSize",
            PropertyEdit::FontFamily(_) => "fontFamily",
            PropertyEdit::TextAlign(_) => "textAlign",
            PropertyEdit::LineHeight(_) => "lineHeight",
            PropertyEdit::BorderWidth(_) => "borderWidth",
            PropertyEdit::ColorHex(ColorTarget::Text, _)
            | PropertyEdit::ColorCmyk(ColorTarget::Text, _) => "color",
            PropertyEdit::ColorHex(ColorTarget::Background, _)
            | PropertyEdit::ColorCmyk(ColorTarget::Background, _) => "backgroundColor",
            PropertyEdit::ColorHex(ColorTarget::Border, _)
            | PropertyEdit::ColorCmyk(ColorTarget::Border, _) => "borderColor",
            PropertyEdit::ColorMode(_) => "colorMode",
        }
    }
}

/// The layout editor.
#[derive(Debug)]
pub struct Editor {
    pub(crate) config: EditorConfig,
    pub(crate) viewport: Viewport,
    pub(crate) store: ElementStore,
    pub(crate) layers: LayerOrder,
    pub(crate) guides: Vec<GuideLine>,
    pub(crate) selection: Option<ElementId>,
    pub(crate) gesture: Gesture,
    tool: ToolKind,
    pub(crate) snap_enabled: bool,
    pub(crate) sibling_alignment: SiblingAlignment,
    pub(crate) snap_lines: Vec<SnapLine>,
    pending_images: HashMap<ElementId, String>,
    events: VecDeque<EditorEvent>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            viewport: Viewport::new(&config.canvas),
            snap_enabled: config.snap.enabled,
            config,
            store: ElementStore::new(),
            layers: LayerOrder::new(),
            guides: Vec::new(),
            selection: None,
            gesture: Gesture::Idle,
            tool: ToolKind::Select,
            sibling_alignment: SiblingAlignment::default(),
            snap_lines: Vec::new(),
            pending_images: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Mutable viewport access, e.g. to update the canvas screen origin.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn layers(&self) -> &LayerOrder {
        &self.layers
    }

    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    pub fn selection(&self) -> Option<&ElementId> {
        self.selection.as_ref()
    }

    pub fn selected_element(&self) -> Option<&Element> {
        self.selection.as_ref().and_then(|id| self.store.get(id))
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
        if !enabled {
            self.clear_snap_lines();
        }
    }

    pub fn sibling_alignment(&self) -> SiblingAlignment {
        self.sibling_alignment
    }

    pub fn set_sibling_alignment(&mut self, alignment: SiblingAlignment) {
        self.sibling_alignment = alignment;
    }

    /// Alignment indicators for the current drag frame.
    pub fn snap_lines(&self) -> &[SnapLine] {
        &self.snap_lines
    }

    /// Drain pending notifications.
    ///
    /// Hosts should drain after every input. At most
    /// [`MAX_PENDING_EVENTS`] are kept; older ones are dropped first.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events).into()
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub(crate) fn require(&self, id: &ElementId) -> EditorResult<&Element> {
        self.store
            .get(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.clone()))
    }

    pub(crate) fn require_mut(&mut self, id: &ElementId) -> EditorResult<&mut Element> {
        self.store
            .get_mut(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.clone()))
    }

    pub(crate) fn resize_limits(&self) -> ResizeLimits {
        ResizeLimits {
            min_size: self.config.constraints.min_element_size,
            boundary_buffer: self.config.constraints.boundary_buffer,
            canvas: self.viewport.canvas_size(),
        }
    }

    pub(crate) fn clear_snap_lines(&mut self) {
        if !self.snap_lines.is_empty() {
            self.snap_lines.clear();
            self.emit(EditorEvent::SnapLinesChanged);
        }
    }

    // --- Element lifecycle ---

    /// Create an element of `element_type` with its top-left at a logical
    /// position. It goes on top of the layer stack and becomes the selection.
    pub fn create_element(&mut self, element_type: ElementType, position: Point) -> ElementId {
        let defaults = ElementDefaults::for_type(element_type, &self.config.colors);
        let id = self.store.mint_id();
        let name = self.store.next_name(element_type);
        self.insert_element(Element::new(id.clone(), name, element_type, position, &defaults));
        id
    }

    /// Create an element at the canvas center (toolbar click).
    pub fn add_element_centered(&mut self, element_type: ElementType) -> ElementId {
        let canvas = self.viewport.canvas_size();
        self.create_element(
            element_type,
            Point::new(canvas.width / 2.0, canvas.height / 2.0),
        )
    }

    /// Store, layer and select a fully built element.
    pub(crate) fn insert_element(&mut self, element: Element) {
        let id = element.id().clone();
        log::debug!("Created {} {id}", element.element_type());
        self.store.insert(element);
        self.layers.push_top(id.clone());
        self.emit(EditorEvent::ElementAdded(id.clone()));
        self.emit(EditorEvent::LayersChanged);
        self.select(Some(id));
    }

    /// Clone an element under a new id, offset by (20, 20).
    pub fn duplicate(&mut self, id: &ElementId) -> EditorResult<ElementId> {
        let source = self.require(id)?.clone();
        let new_id = self.store.mint_id();
        let name = self.store.next_name(source.element_type());
        let mut copy = source.duplicate_as(new_id.clone(), name);
        copy.geometry.x += DUPLICATE_OFFSET.x;
        copy.geometry.y += DUPLICATE_OFFSET.y;
        self.insert_element(copy);
        Ok(new_id)
    }

    /// Remove an element from the store, the layer order and the selection
    /// in one step.
    pub fn delete(&mut self, id: &ElementId) -> EditorResult<Element> {
        let removed = self
            .store
            .remove(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.clone()))?;
        self.layers.remove(id);
        self.pending_images.remove(id);
        if self.gesture.element() == Some(id) {
            log::debug!("Gesture target {id} deleted, returning to idle");
            self.gesture = Gesture::Idle;
            self.clear_snap_lines();
        }
        if self.selection.as_ref() == Some(id) {
            self.select(None);
        }
        self.emit(EditorEvent::ElementRemoved(id.clone()));
        self.emit(EditorEvent::LayersChanged);
        Ok(removed)
    }

    /// Remove every element. Name counters restart; ids keep counting.
    pub fn clear(&mut self, preserve_guides: bool) {
        self.store.clear();
        self.layers.clear();
        self.pending_images.clear();
        self.gesture = Gesture::Idle;
        self.snap_lines.clear();
        self.selection = None;
        if !preserve_guides {
            self.guides.clear();
        }
        self.emit(EditorEvent::Cleared);
    }

    // --- Selection ---

    pub fn select(&mut self, id: Option<ElementId>) {
        let id = id.filter(|id| self.store.contains(id));
        if self.selection != id {
            self.selection = id.clone();
            self.emit(EditorEvent::SelectionChanged(id));
        }
    }

    pub fn deselect(&mut self) {
        self.select(None);
    }

    // --- Keyboard ---

    /// Handle a key press. Returns true if it mapped to a command.
    pub fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        match shortcut_for(key, modifiers) {
            Some(shortcut) => {
                self.apply_shortcut(shortcut);
                true
            }
            None => false,
        }
    }

    /// Escape cancels an active gesture before it clears the selection.
    pub fn apply_shortcut(&mut self, shortcut: Shortcut) {
        if shortcut == Shortcut::Deselect {
            if !self.cancel_gesture() {
                self.deselect();
            }
            return;
        }
        let Some(id) = self.selection.clone() else {
            return;
        };
        let outcome = match shortcut {
            Shortcut::Delete => self.delete(&id).map(drop),
            Shortcut::Duplicate => self.duplicate(&id).map(drop),
            Shortcut::Deselect => Ok(()),
        };
        if let Err(e) = outcome {
            log::warn!("Shortcut {shortcut:?} failed: {e}");
        }
    }

    // --- Layers ---

    /// Move the layer at `from` to `to`.
    pub fn reorder_layer(&mut self, from: usize, to: usize) -> EditorResult<()> {
        self.layers.reorder(from, to)?;
        self.emit(EditorEvent::LayersChanged);
        Ok(())
    }

    pub fn move_layer_up(&mut self, id: &ElementId) -> EditorResult<bool> {
        self.require(id)?;
        let moved = self.layers.move_up(id);
        if moved {
            self.emit(EditorEvent::LayersChanged);
        }
        Ok(moved)
    }

    pub fn move_layer_down(&mut self, id: &ElementId) -> EditorResult<bool> {
        self.require(id)?;
        let moved = self.layers.move_down(id);
        if moved {
            self.emit(EditorEvent::LayersChanged);
        }
        Ok(moved)
    }

    /// Move to the top of the committed layer order.
    pub fn bring_to_front(&mut self, id: &ElementId) -> EditorResult<bool> {
        self.require(id)?;
        let moved = self.layers.to_front(id);
        if moved {
            self.emit(EditorEvent::LayersChanged);
        }
        Ok(moved)
    }

    /// Move to the bottom of the committed layer order.
    pub fn send_to_back(&mut self, id: &ElementId) -> EditorResult<bool> {
        self.require(id)?;
        let moved = self.layers.to_back(id);
        if moved {
            self.emit(EditorEvent::LayersChanged);
        }
        Ok(moved)
    }

    /// Flip visibility. A selected element's controls follow its visibility.
    pub fn toggle_visibility(&mut self, id: &ElementId) -> EditorResult<bool> {
        let visible = self
            .layers
            .toggle_visibility(id)
            .ok_or_else(|| EditorError::ElementNotFound(id.clone()))?;
        if self.selection.as_ref() == Some(id) {
            self.emit(EditorEvent::ControlsVisible {
                id: id.clone(),
                visible,
            });
        }
        self.emit(EditorEvent::LayersChanged);
        Ok(visible)
    }

    pub fn z_index(&self, id: &ElementId) -> Option<usize> {
        self.layers.z_index(id)
    }

    // --- Guides ---

    /// Add a guide, clamping its position to the canvas. Returns its index.
    pub fn add_guide(&mut self, orientation: Orientation, position: f64) -> usize {
        let position = self.clamp_guide_position(orientation, position);
        self.guides.push(GuideLine::new(orientation, position));
        self.emit(EditorEvent::GuidesChanged);
        self.guides.len() - 1
    }

    pub fn move_guide(&mut self, index: usize, position: f64) -> EditorResult<()> {
        let orientation = self
            .guides
            .get(index)
            .map(|g| g.orientation)
            .ok_or(EditorError::GuideNotFound(index))?;
        let position = self.clamp_guide_position(orientation, position);
        if let Some(guide) = self.guides.get_mut(index) {
            guide.position = position;
        }
        self.emit(EditorEvent::GuidesChanged);
        Ok(())
    }

    pub fn remove_guide(&mut self, index: usize) -> EditorResult<GuideLine> {
        if index >= self.guides.len() {
            return Err(EditorError::GuideNotFound(index));
        }
        if let Gesture::PlacingGuide(state) = &self.gesture {
            if state.index == index {
                self.gesture = Gesture::Idle;
            }
        }
        let removed = self.guides.remove(index);
        self.emit(EditorEvent::GuidesChanged);
        Ok(removed)
    }

    pub fn clear_guides(&mut self) {
        if let Gesture::PlacingGuide(_) = self.gesture {
            self.gesture = Gesture::Idle;
        }
        self.guides.clear();
        self.emit(EditorEvent::GuidesChanged);
    }

    pub(crate) fn clamp_guide_position(&self, orientation: Orientation, position: f64) -> f64 {
        let canvas = self.viewport.canvas_size();
        let max = match orientation {
            Orientation::Vertical => canvas.width,
            Orientation::Horizontal => canvas.height,
        };
        if position.is_finite() {
            position.clamp(0.0, max)
        } else {
            0.0
        }
    }

    // --- Canvas and zoom ---

    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> Size {
        let size = self.viewport.set_canvas_size(width, height);
        self.emit(EditorEvent::CanvasResized(size));
        size
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.viewport.zoom_in();
        self.zoom_changed(changed)
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.viewport.zoom_out();
        self.zoom_changed(changed)
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let changed = self.viewport.set_zoom(zoom);
        self.zoom_changed(changed)
    }

    /// Scroll-wheel zoom, active only with the command modifier held.
    pub fn wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        let before = self.viewport.zoom();
        let consumed = self.viewport.wheel(delta_y, modifiers.command());
        self.zoom_changed((self.viewport.zoom() - before).abs() > f64::EPSILON);
        consumed
    }

    /// Fit the canvas into a workspace of the given screen size.
    pub fn fit_to_workspace(&mut self, workspace: Size) -> f64 {
        let before = self.viewport.zoom();
        let zoom = self.viewport.fit(workspace);
        self.zoom_changed((zoom - before).abs() > f64::EPSILON);
        zoom
    }

    fn zoom_changed(&mut self, changed: bool) -> bool {
        if changed {
            let zoom = self.viewport.zoom();
            log::debug!("Zoom set to {}%", self.viewport.zoom_percent());
            self.emit(EditorEvent::ZoomChanged(zoom));
        }
        changed
    }

    // --- Hit testing ---

    /// Resolve what lies under a screen position.
    ///
    /// Checks the selected element's handles first, then visible element
    /// bodies top-most first, then guide lines.
    pub fn hit_test(&self, screen: Point) -> PointerTarget {
        let logical = self.viewport.screen_to_logical(screen);
        let tolerance = self.viewport.screen_distance(HANDLE_HIT_TOLERANCE);

        if let Some(selected) = self.selected_element() {
            if self.layers.is_visible(selected.id()) {
                match hit_test_handles(&selected.geometry, logical, tolerance) {
                    Some(HandleKind::Rotate) => return PointerTarget::Rotate(selected.id().clone()),
                    Some(HandleKind::Resize(handle)) => {
                        return PointerTarget::Resize(selected.id().clone(), handle);
                    }
                    None => {}
                }
            }
        }

        let top_most = self
            .layers
            .ids()
            .iter()
            .rev()
            .filter(|id| self.layers.is_visible(id))
            .filter_map(|id| self.store.get(id))
            .find(|element| element.geometry.contains(logical));
        if let Some(element) = top_most {
            return PointerTarget::Element(element.id().clone());
        }

        let guide = self.guides.iter().position(|guide| {
            let coord = match guide.orientation {
                Orientation::Vertical => logical.x,
                Orientation::Horizontal => logical.y,
            };
            (coord - guide.position).abs() <= tolerance
        });
        match guide {
            Some(index) => PointerTarget::Guide(index),
            None => PointerTarget::Canvas,
        }
    }

    // --- Property edits ---

    /// Apply a property-panel edit.
    ///
    /// Returns `Ok(false)` when the value was rejected and the element left
    /// unchanged (invalid hex, non-finite number).
    pub fn set_property(&mut self, id: &ElementId, edit: PropertyEdit) -> EditorResult<bool> {
        let min_size = self.config.constraints.min_element_size;
        let property = edit.name();
        let element = self.require_mut(id)?;
        if edit.number().is_some_and(|v| !v.is_finite()) {
            log::debug!("Ignored non-finite {property} for {id}");
            return Ok(false);
        }
        let unsupported = || EditorError::UnsupportedProperty {
            id: id.clone(),
            property,
        };

        let applied = match edit {
            PropertyEdit::Name(name) => {
                element.name = name;
                true
            }
            PropertyEdit::X(v) => set(&mut element.geometry.x, v),
            PropertyEdit::Y(v) => set(&mut element.geometry.y, v),
            PropertyEdit::Width(v) => set(&mut element.geometry.width, v.max(min_size)),
            PropertyEdit::Height(v) => set(&mut element.geometry.height, v.max(min_size)),
            PropertyEdit::Rotation(v) => set(&mut element.geometry.rotation, normalize_rotation(v)),
            PropertyEdit::Opacity(v) => set(&mut element.opacity, v.clamp(0.0, 1.0)),
            PropertyEdit::ColorMode(mode) => {
                element.color_mode = mode;
                true
            }
            PropertyEdit::Text(text) => {
                element.text_style_mut().ok_or_else(unsupported)?.text = text;
                true
            }
            PropertyEdit::FontSize(v) => {
                let style = element.text_style_mut().ok_or_else(unsupported)?;
                set(&mut style.font_size, v.max(1.0))
            }
            PropertyEdit::FontFamily(family) => {
                element.text_style_mut().ok_or_else(unsupported)?.font_family = family;
                true
            }
            PropertyEdit::TextAlign(align) => {
                element.text_style_mut().ok_or_else(unsupported)?.text_align = align;
                true
            }
            PropertyEdit::LineHeight(v) => {
                let style = element.text_style_mut().ok_or_else(unsupported)?;
                set(&mut style.line_height, v.max(0.0))
            }
            PropertyEdit::BorderWidth(v) => {
                let style = element.shape_style_mut().ok_or_else(unsupported)?;
                set(&mut style.border_width, v.max(0.0))
            }
            PropertyEdit::ColorHex(target, hex) => {
                swatch_mut(element, target).ok_or_else(unsupported)?.set_hex(&hex)
            }
            PropertyEdit::ColorCmyk(target, cmyk) => {
                swatch_mut(element, target).ok_or_else(unsupported)?.set_cmyk(cmyk);
                true
            }
        };

        if applied {
            self.emit(EditorEvent::ElementChanged(id.clone()));
        } else {
            log::debug!("Ignored invalid {property} for {id}");
        }
        Ok(applied)
    }

    // --- Images ---

    /// Start loading an image into an image element.
    ///
    /// The element keeps its current image until
    /// [`Editor::finish_image_load`] reports success.
    pub fn request_image(&mut self, id: &ElementId, url: impl Into<String>) -> EditorResult<()> {
        if self.require(id)?.element_type() != ElementType::Image {
            return Err(EditorError::UnsupportedProperty {
                id: id.clone(),
                property: "imageUrl",
            });
        }
        self.pending_images.insert(id.clone(), url.into());
        Ok(())
    }

    /// The URL currently loading for an element, if any.
    pub fn pending_image(&self, id: &ElementId) -> Option<&str> {
        self.pending_images.get(id).map(String::as_str)
    }

    /// Report the decode outcome of a pending image.
    ///
    /// On failure the previous image is retained and the error returned.
    pub fn finish_image_load(
        &mut self,
        id: &ElementId,
        outcome: Result<(), String>,
    ) -> EditorResult<()> {
        let url = self.pending_images.remove(id).ok_or_else(|| EditorError::ImageLoad {
            url: String::new(),
            reason: format!("no image load pending for {id}"),
        })?;
        if let Err(reason) = outcome {
            log::warn!("Image {url} failed to load for {id}: {reason}");
            return Err(EditorError::ImageLoad { url, reason });
        }
        let element = self.require_mut(id)?;
        if let ElementStyle::Image(style) = &mut element.style {
            style.image_url = Some(url);
        }
        self.emit(EditorEvent::ElementChanged(id.clone()));
        Ok(())
    }
}

fn set(slot: &mut f64, value: f64) -> bool {
    *slot = value;
    true
}

fn swatch_mut(element: &mut Element, target: ColorTarget) -> Option<&mut Swatch> {
    match (target, &mut element.style) {
        (ColorTarget::Text, ElementStyle::Text(style)) => Some(&mut style.color),
        (ColorTarget::Background, ElementStyle::Shape(style)) => Some(&mut style.background),
        (ColorTarget::Border, ElementStyle::Shape(style)) => Some(&mut style.border),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::ResizeHandle;

    fn editor_with(types: &[ElementType]) -> (Editor, Vec<ElementId>) {
        let mut editor = Editor::default();
        let ids = types
            .iter()
            .enumerate()
            .map(|(i, t)| editor.create_element(*t, Point::new(50.0 + 150.0 * i as f64, 50.0)))
            .collect();
        (editor, ids)
    }

    #[test]
    fn test_create_selects_and_layers() {
        let (editor, ids) = editor_with(&[ElementType::Text, ElementType::Circle]);
        assert_eq!(editor.selection(), Some(&ids[1]));
        assert_eq!(editor.layers().ids(), ids.as_slice());
        assert_eq!(editor.element(&ids[0]).unwrap().name, "Text 1");
    }

    #[test]
    fn test_add_centered() {
        let mut editor = Editor::default();
        let id = editor.add_element_centered(ElementType::Rectangle);
        let g = editor.element(&id).unwrap().geometry;
        assert!((g.x - 297.5).abs() < f64::EPSILON);
        assert!((g.y - 421.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicate_offsets() {
        let (mut editor, ids) = editor_with(&[ElementType::Rectangle]);
        let copy = editor.duplicate(&ids[0]).unwrap();
        let original = editor.element(&ids[0]).unwrap().clone();
        let duplicate = editor.element(&copy).unwrap();
        assert!((duplicate.geometry.x - original.geometry.x - 20.0).abs() < f64::EPSILON);
        assert!((duplicate.geometry.y - original.geometry.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(duplicate.style, original.style);
        assert_eq!(duplicate.name, "Rectangle 2");
        assert_eq!(editor.layers().ids().last(), Some(&copy));
    }

    #[test]
    fn test_delete_is_atomic() {
        let (mut editor, ids) = editor_with(&[ElementType::Text, ElementType::Line]);
        editor.delete(&ids[1]).unwrap();
        assert!(editor.element(&ids[1]).is_none());
        assert_eq!(editor.selection(), None);
        assert!(editor.layers().is_permutation_of(editor.store().ids()));
        assert!(matches!(
            editor.delete(&ids[1]),
            Err(EditorError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_keyboard_shortcuts() {
        let (mut editor, ids) = editor_with(&[ElementType::Heading]);
        assert!(editor.key_down("d", Modifiers::CTRL));
        assert_eq!(editor.store().len(), 2);
        assert!(editor.key_down("Escape", Modifiers::NONE));
        assert_eq!(editor.selection(), None);
        editor.select(Some(ids[0].clone()));
        assert!(editor.key_down("Delete", Modifiers::NONE));
        assert_eq!(editor.store().len(), 1);
        assert!(!editor.key_down("x", Modifiers::NONE));
    }

    #[test]
    fn test_front_back_commit_to_layers() {
        let (mut editor, ids) = editor_with(&[
            ElementType::Rectangle,
            ElementType::Circle,
            ElementType::Line,
        ]);
        assert!(editor.bring_to_front(&ids[0]).unwrap());
        assert_eq!(editor.z_index(&ids[0]), Some(12));
        assert!(editor.send_to_back(&ids[2]).unwrap());
        assert_eq!(editor.z_index(&ids[2]), Some(10));
        assert!(!editor.send_to_back(&ids[2]).unwrap());
    }

    #[test]
    fn test_toggle_visibility_hides_controls() {
        let (mut editor, ids) = editor_with(&[ElementType::Circle]);
        editor.take_events();
        assert!(!editor.toggle_visibility(&ids[0]).unwrap());
        let events = editor.take_events();
        assert!(events.contains(&EditorEvent::ControlsVisible {
            id: ids[0].clone(),
            visible: false
        }));
    }

    #[test]
    fn test_guides_clamped() {
        let mut editor = Editor::default();
        let v = editor.add_guide(Orientation::Vertical, 900.0);
        let h = editor.add_guide(Orientation::Horizontal, -5.0);
        assert!((editor.guides()[v].position - 595.0).abs() < f64::EPSILON);
        assert!((editor.guides()[h].position).abs() < f64::EPSILON);
        editor.move_guide(h, 100.0).unwrap();
        assert!((editor.guides()[h].position - 100.0).abs() < f64::EPSILON);
        editor.remove_guide(v).unwrap();
        assert_eq!(editor.guides().len(), 1);
        assert!(matches!(editor.remove_guide(5), Err(EditorError::GuideNotFound(5))));
        editor.clear_guides();
        assert!(editor.guides().is_empty());
    }

    #[test]
    fn test_clear_keeps_ids_counting() {
        let (mut editor, ids) = editor_with(&[ElementType::Text]);
        editor.add_guide(Orientation::Vertical, 10.0);
        editor.clear(true);
        assert!(editor.store().is_empty());
        assert!(editor.layers().is_empty());
        assert_eq!(editor.guides().len(), 1);
        let next = editor.create_element(ElementType::Text, Point::ZERO);
        assert_ne!(next, ids[0]);
        assert_eq!(editor.element(&next).unwrap().name, "Text 1");
        editor.clear(false);
        assert!(editor.guides().is_empty());
    }

    #[test]
    fn test_property_edits() {
        let (mut editor, ids) = editor_with(&[ElementType::Text, ElementType::Rectangle]);
        let (text, rect) = (&ids[0], &ids[1]);

        assert!(editor.set_property(text, PropertyEdit::Width(5.0)).unwrap());
        assert!((editor.element(text).unwrap().geometry.width - 20.0).abs() < f64::EPSILON);

        assert!(editor.set_property(text, PropertyEdit::Rotation(-45.0)).unwrap());
        assert!((editor.element(text).unwrap().geometry.rotation - 315.0).abs() < f64::EPSILON);

        assert!(editor.set_property(rect, PropertyEdit::Opacity(3.0)).unwrap());
        assert!((editor.element(rect).unwrap().opacity - 1.0).abs() < f64::EPSILON);

        assert!(!editor.set_property(rect, PropertyEdit::X(f64::NAN)).unwrap());

        assert!(matches!(
            editor.set_property(rect, PropertyEdit::Text("nope".into())),
            Err(EditorError::UnsupportedProperty { property: "text", .. })
        ));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let (mut editor, ids) = editor_with(&[ElementType::Text, ElementType::Rectangle]);
        let (text, rect) = (&ids[0], &ids[1]);
        let before_text = editor.element(text).unwrap().clone();
        let before_rect = editor.element(rect).unwrap().clone();

        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let edits = [
                (text, PropertyEdit::X(v)),
                (text, PropertyEdit::Y(v)),
                (text, PropertyEdit::Width(v)),
                (text, PropertyEdit::Height(v)),
                (text, PropertyEdit::Rotation(v)),
                (text, PropertyEdit::Opacity(v)),
                (text, PropertyEdit::FontSize(v)),
                (text, PropertyEdit::LineHeight(v)),
                (rect, PropertyEdit::BorderWidth(v)),
            ];
            for (id, edit) in edits {
                let label = format!("{edit:?}");
                assert!(!editor.set_property(id, edit).unwrap(), "{label} was applied");
            }
        }
        assert_eq!(editor.element(text).unwrap(), &before_text);
        assert_eq!(editor.element(rect).unwrap(), &before_rect);
    }

    #[test]
    fn test_event_queue_is_bounded() {
        let mut editor = Editor::default();
        for _ in 0..MAX_PENDING_EVENTS + 10 {
            editor.emit(EditorEvent::GuidesChanged);
        }
        editor.emit(EditorEvent::Cleared);
        let events = editor.take_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert_eq!(events.last(), Some(&EditorEvent::Cleared));
        assert!(editor.take_events().is_empty());
    }

    #[test]
    fn test_invalid_hex_is_ignored() {
        let (mut editor, ids) = editor_with(&[ElementType::Rectangle]);
        let edit = PropertyEdit::ColorHex(ColorTarget::Background, "#12".into());
        assert!(!editor.set_property(&ids[0], edit).unwrap());
        let style = editor.element(&ids[0]).unwrap().shape_style().unwrap().clone();
        assert_eq!(style.background.hex, "#3498db");

        let edit = PropertyEdit::ColorCmyk(ColorTarget::Border, Cmyk::new(0, 0, 0, 100));
        assert!(editor.set_property(&ids[0], edit).unwrap());
        let style = editor.element(&ids[0]).unwrap().shape_style().unwrap();
        assert_eq!(style.border.hex, "#000000");
    }

    #[test]
    fn test_image_load_failure_keeps_previous() {
        let (mut editor, ids) = editor_with(&[ElementType::Image]);
        let id = &ids[0];
        editor.request_image(id, "https://cdn.example/a.png").unwrap();
        editor.finish_image_load(id, Ok(())).unwrap();
        assert_eq!(editor.element(id).unwrap().image_url(), Some("https://cdn.example/a.png"));

        editor.request_image(id, "https://cdn.example/broken.png").unwrap();
        let result = editor.finish_image_load(id, Err("decode failed".into()));
        assert!(matches!(result, Err(EditorError::ImageLoad { .. })));
        assert_eq!(editor.element(id).unwrap().image_url(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn test_image_request_on_non_image() {
        let (mut editor, ids) = editor_with(&[ElementType::Text]);
        assert!(editor.request_image(&ids[0], "x.png").is_err());
    }

    #[test]
    fn test_hit_test() {
        let (mut editor, ids) = editor_with(&[ElementType::Rectangle, ElementType::Rectangle]);
        // Second rectangle spans (200, 50)..(300, 110) and is selected.
        assert_eq!(
            editor.hit_test(Point::new(300.0, 110.0)),
            PointerTarget::Resize(ids[1].clone(), ResizeHandle::SE)
        );
        assert_eq!(
            editor.hit_test(Point::new(250.0, 25.0)),
            PointerTarget::Rotate(ids[1].clone())
        );
        assert_eq!(
            editor.hit_test(Point::new(80.0, 80.0)),
            PointerTarget::Element(ids[0].clone())
        );
        assert_eq!(editor.hit_test(Point::new(500.0, 500.0)), PointerTarget::Canvas);

        editor.toggle_visibility(&ids[0]).unwrap();
        assert_eq!(editor.hit_test(Point::new(80.0, 80.0)), PointerTarget::Canvas);

        editor.add_guide(Orientation::Horizontal, 600.0);
        assert_eq!(editor.hit_test(Point::new(10.0, 603.0)), PointerTarget::Guide(0));
    }

    #[test]
    fn test_zoom_events() {
        let mut editor = Editor::default();
        assert!(editor.zoom_in());
        assert!(!editor.wheel(100.0, Modifiers::NONE));
        assert!(editor.wheel(100.0, Modifiers::CTRL));
        let events = editor.take_events();
        assert_eq!(
            events,
            vec![EditorEvent::ZoomChanged(1.25), EditorEvent::ZoomChanged(1.0)]
        );
    }
}
