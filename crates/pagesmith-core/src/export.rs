//! Read-only document snapshot handed to an export backend.
//!
//! Export targets put the origin at the bottom-left, so every element's
//! y is flipped: `y' = canvas_height - y - height`.

use crate::color::{ColorMode, Swatch, hex_to_rgb};
use crate::config::font_stack;
use crate::editor::Editor;
use crate::element::{Element, ElementStyle, ElementType, TextAlign};
use crate::layers::LayerOrder;
use crate::snap::{GuideLine, Orientation};
use crate::store::ElementStore;
use kurbo::{Point, Size};
use serde::Serialize;

/// Colour resolved for the export target, channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportColor {
    Rgb([f64; 3]),
    Cmyk([f64; 4]),
}

impl ExportColor {
    pub fn resolve(swatch: &Swatch, mode: ColorMode) -> Self {
        match mode {
            ColorMode::Cmyk => ExportColor::Cmyk(swatch.cmyk.fractions()),
            ColorMode::Hex => {
                let rgb = hex_to_rgb(&swatch.hex);
                ExportColor::Rgb([
                    f64::from(rgb.r) / 255.0,
                    f64::from(rgb.g) / 255.0,
                    f64::from(rgb.b) / 255.0,
                ])
            }
        }
    }
}

/// Drawing primitive for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExportContent {
    Text {
        text: String,
        font_size: f64,
        font_family: String,
        /// CSS-style fallback list for `font_family`.
        font_stack: String,
        text_align: TextAlign,
        line_height: f64,
        color: ExportColor,
    },
    Rectangle {
        fill: ExportColor,
        stroke: ExportColor,
        border_width: f64,
    },
    Ellipse {
        center: Point,
        radius_x: f64,
        radius_y: f64,
        fill: ExportColor,
        stroke: ExportColor,
        border_width: f64,
    },
    /// Horizontal stroke through the vertical middle of the box.
    Line {
        start: Point,
        end: Point,
        thickness: f64,
        color: ExportColor,
    },
    Image {
        url: Option<String>,
    },
}

/// One element in export coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportElement {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    /// Bottom-left based.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub opacity: f64,
    #[serde(flatten)]
    pub content: ExportContent,
}

/// A guide line for preview backends. Print backends skip these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportGuide {
    pub orientation: Orientation,
    /// x for vertical guides, flipped y for horizontal ones.
    pub position: f64,
    pub color: ExportColor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSnapshot {
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// Bottom to top; hidden layers are omitted.
    pub elements: Vec<ExportElement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<ExportGuide>,
}

impl ExportSnapshot {
    pub fn capture(store: &ElementStore, layers: &LayerOrder, canvas: Size) -> Self {
        let elements = layers
            .visible_ids()
            .filter_map(|id| store.get(id))
            .map(|element| export_element(element, canvas.height))
            .collect();
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
            elements,
            guides: Vec::new(),
        }
    }

    /// Attach guide overlays drawn in `color`.
    pub fn with_guides(mut self, guides: &[GuideLine], color: &Swatch) -> Self {
        let color = ExportColor::resolve(color, ColorMode::Hex);
        self.guides = guides
            .iter()
            .map(|guide| ExportGuide {
                orientation: guide.orientation,
                position: match guide.orientation {
                    Orientation::Vertical => guide.position,
                    Orientation::Horizontal => self.canvas_height - guide.position,
                },
                color,
            })
            .collect();
        self
    }
}

fn export_element(element: &Element, canvas_height: f64) -> ExportElement {
    let g = &element.geometry;
    let x = g.x;
    let y = canvas_height - g.y - g.height;
    let mode = element.color_mode;

    let content = match &element.style {
        ElementStyle::Text(style) => ExportContent::Text {
            text: style.text.clone(),
            font_size: style.font_size,
            font_family: style.font_family.clone(),
            font_stack: font_stack(&style.font_family).to_string(),
            text_align: style.text_align,
            line_height: style.line_height,
            color: ExportColor::resolve(&style.color, mode),
        },
        ElementStyle::Shape(style) => match element.element_type() {
            ElementType::Circle => ExportContent::Ellipse {
                center: Point::new(x + g.width / 2.0, y + g.height / 2.0),
                radius_x: g.width / 2.0,
                radius_y: g.height / 2.0,
                fill: ExportColor::resolve(&style.background, mode),
                stroke: ExportColor::resolve(&style.border, mode),
                border_width: style.border_width,
            },
            ElementType::Line => {
                let mid = y + g.height / 2.0;
                ExportContent::Line {
                    start: Point::new(x, mid),
                    end: Point::new(x + g.width, mid),
                    thickness: style.border_width,
                    color: ExportColor::resolve(&style.border, mode),
                }
            }
            _ => ExportContent::Rectangle {
                fill: ExportColor::resolve(&style.background, mode),
                stroke: ExportColor::resolve(&style.border, mode),
                border_width: style.border_width,
            },
        },
        ElementStyle::Image(style) => ExportContent::Image {
            url: style.image_url.clone(),
        },
    };

    ExportElement {
        id: element.id().to_string(),
        element_type: element.element_type(),
        x,
        y,
        width: g.width,
        height: g.height,
        rotation: g.rotation,
        opacity: element.opacity,
        content,
    }
}

/// An export backend (PDF writer, raster, JSON dump).
pub trait DocumentRenderer {
    type Output;
    type Error;

    fn render(&mut self, snapshot: &ExportSnapshot) -> Result<Self::Output, Self::Error>;
}

/// Renders the snapshot as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pub pretty: bool,
}

impl DocumentRenderer for JsonRenderer {
    type Output = String;
    type Error = serde_json::Error;

    fn render(&mut self, snapshot: &ExportSnapshot) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
    }
}

impl Editor {
    /// Snapshot of the printable document, without guides.
    pub fn export_snapshot(&self) -> ExportSnapshot {
        ExportSnapshot::capture(&self.store, &self.layers, self.viewport.canvas_size())
    }

    /// Snapshot including guide lines in the configured guide colour.
    pub fn preview_snapshot(&self) -> ExportSnapshot {
        let color = Swatch::from_hex(&self.config.colors.guide);
        self.export_snapshot().with_guides(&self.guides, &color)
    }

    /// Snapshot the document and hand it to `renderer`.
    pub fn export_with<R: DocumentRenderer>(&self, renderer: &mut R) -> Result<R::Output, R::Error> {
        let snapshot = self.export_snapshot();
        log::info!("Exporting {} elements", snapshot.elements.len());
        renderer.render(&snapshot)
    }
}
