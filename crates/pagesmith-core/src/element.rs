//! Element model: identity, geometry and type-specific style.

use crate::color::{ColorMode, Swatch};
use crate::config::ElementDefaults;
use kurbo::{Affine, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an element, minted as `element-<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    const PREFIX: &'static str = "element-";

    /// Build the id for counter value `n`.
    pub fn from_counter(n: u64) -> Self {
        Self(format!("{}{n}", Self::PREFIX))
    }

    /// Wrap an arbitrary string as an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The counter value, if this id has the minted `element-<n>` shape.
    pub fn counter(&self) -> Option<u64> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Heading,
    Rectangle,
    Circle,
    Line,
    Image,
}

impl ElementType {
    pub const ALL: [ElementType; 6] = [
        ElementType::Text,
        ElementType::Heading,
        ElementType::Rectangle,
        ElementType::Circle,
        ElementType::Line,
        ElementType::Image,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Text => "text",
            ElementType::Heading => "heading",
            ElementType::Rectangle => "rectangle",
            ElementType::Circle => "circle",
            ElementType::Line => "line",
            ElementType::Image => "image",
        }
    }

    /// Display label used for element names.
    pub fn label(self) -> &'static str {
        match self {
            ElementType::Text => "Text",
            ElementType::Heading => "Heading",
            ElementType::Rectangle => "Rectangle",
            ElementType::Circle => "Circle",
            ElementType::Line => "Line",
            ElementType::Image => "Image",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown element type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Position, size and rotation in canvas-logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, always in `[0, 360)`.
    pub rotation: f64,
}

impl Geometry {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Unrotated bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size())
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Transform from the element's unrotated frame to canvas space.
    pub fn rotation_transform(&self) -> Affine {
        Affine::rotate_about(self.rotation.to_radians(), self.center())
    }

    /// Check whether a logical point lies inside the (rotated) element.
    pub fn contains(&self, point: Point) -> bool {
        let local = self.rotation_transform().inverse() * point;
        self.bounds().contains(local)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub text_align: TextAlign,
    pub line_height: f64,
    pub color: Swatch,
}

/// Style for rectangles, circles and lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub background: Swatch,
    pub border: Swatch,
    pub border_width: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageStyle {
    pub image_url: Option<String>,
}

/// Type-specific style fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementStyle {
    Text(TextStyle),
    Shape(ShapeStyle),
    Image(ImageStyle),
}

impl ElementStyle {
    pub fn for_type(element_type: ElementType, defaults: &ElementDefaults) -> Self {
        match element_type {
            ElementType::Text | ElementType::Heading => ElementStyle::Text(TextStyle {
                text: defaults.text.clone(),
                font_size: defaults.font_size,
                font_family: defaults.font_family.clone(),
                text_align: defaults.text_align,
                line_height: defaults.line_height,
                color: defaults.color.clone(),
            }),
            ElementType::Rectangle | ElementType::Circle | ElementType::Line => {
                ElementStyle::Shape(ShapeStyle {
                    background: defaults.background.clone(),
                    border: defaults.border.clone(),
                    border_width: defaults.border_width,
                })
            }
            ElementType::Image => ElementStyle::Image(ImageStyle::default()),
        }
    }
}

/// A placed element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    element_type: ElementType,
    /// Display name, e.g. "Rectangle 2".
    pub name: String,
    pub geometry: Geometry,
    /// In `[0, 1]`.
    pub opacity: f64,
    pub color_mode: ColorMode,
    pub style: ElementStyle,
}

impl Element {
    /// Create an element with the defaults for its type, top-left at `position`.
    pub fn new(
        id: ElementId,
        name: String,
        element_type: ElementType,
        position: Point,
        defaults: &ElementDefaults,
    ) -> Self {
        Self {
            id,
            element_type,
            name,
            geometry: Geometry {
                x: position.x,
                y: position.y,
                width: defaults.width,
                height: defaults.height,
                rotation: normalize_rotation(defaults.rotation),
            },
            opacity: defaults.opacity,
            color_mode: defaults.color_mode,
            style: ElementStyle::for_type(element_type, defaults),
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Clone every field onto a new identity.
    pub fn duplicate_as(&self, id: ElementId, name: String) -> Self {
        Self {
            id,
            name,
            ..self.clone()
        }
    }

    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.style {
            ElementStyle::Text(style) => Some(style),
            _ => None,
        }
    }

    pub fn text_style_mut(&mut self) -> Option<&mut TextStyle> {
        match &mut self.style {
            ElementStyle::Text(style) => Some(style),
            _ => None,
        }
    }

    pub fn shape_style(&self) -> Option<&ShapeStyle> {
        match &self.style {
            ElementStyle::Shape(style) => Some(style),
            _ => None,
        }
    }

    pub fn shape_style_mut(&mut self) -> Option<&mut ShapeStyle> {
        match &mut self.style {
            ElementStyle::Shape(style) => Some(style),
            _ => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match &self.style {
            ElementStyle::Image(style) => style.image_url.as_deref(),
            _ => None,
        }
    }
}
