//! Template wire format and conversion to and from editor state.
//!
//! Serialization emits every element field, substituting defaults for
//! fields an element type does not carry. Loading rebuilds the editor
//! through the normal creation path: fresh ids, type defaults for missing
//! fields, CMYK backfilled from hex, positions clamped into the canvas
//! window, and layer order remapped onto the new ids.

use crate::color::{Cmyk, ColorMode, Swatch, is_valid_hex};
use crate::config::{ColorConfig, ElementDefaults};
use crate::editor::Editor;
use crate::element::{
    Element, ElementId, ElementStyle, ElementType, ImageStyle, TextAlign, normalize_rotation,
};
use crate::error::EditorResult;
use crate::handles::clamp_origin;
use crate::layers::LayerOrder;
use crate::store::ElementStore;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lenient field decoders for values the server returns loosely typed
/// (numeric ids, decimal columns as strings, nulls for empty collections).
pub(crate) mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom("number out of range")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: {s:?}"))),
            Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
        }
    }

    pub fn f64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or(0.0))
    }

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.and_then(value_to_string))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        value_to_string(Value::deserialize(d)?).ok_or_else(|| D::Error::custom("unexpected null"))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.into_iter().filter_map(value_to_string).collect()),
            Some(other) => Err(D::Error::custom(format!("expected a list, got {other}"))),
        }
    }

    pub fn visibility<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, bool>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(BTreeMap::new()),
            // An empty PHP array serializes as [].
            Some(Value::Array(items)) if items.is_empty() => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => Ok(map
                .into_iter()
                .map(|(k, v)| {
                    let visible = match v {
                        Value::Bool(b) => b,
                        Value::Number(n) => n.as_f64() != Some(0.0),
                        Value::String(s) => !matches!(s.as_str(), "0" | "false"),
                        _ => true,
                    };
                    (k, visible)
                })
                .collect()),
            Some(other) => Err(D::Error::custom(format!("expected an object, got {other}"))),
        }
    }
}

/// One element on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateElement {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub text_align: Option<TextAlign>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub line_height: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub color_cmyk: Option<Cmyk>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub background_color_cmyk: Option<Cmyk>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub border_color_cmyk: Option<Cmyk>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub border_width: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub opacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub color_mode: Option<ColorMode>,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
}

/// A template as stored remotely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub width: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub height: f64,
    #[serde(
        rename = "client_id",
        alias = "clientId",
        default,
        deserialize_with = "lenient::opt_string"
    )]
    pub client_id: Option<String>,
    #[serde(alias = "layer_order", default, deserialize_with = "lenient::string_list")]
    pub layer_order: Vec<String>,
    #[serde(alias = "layer_visibility", default, deserialize_with = "lenient::visibility")]
    pub layer_visibility: BTreeMap<String, bool>,
    #[serde(default)]
    pub elements: Vec<TemplateElement>,
}

impl Template {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with the integer-typed columns truncated toward zero, as the
    /// remote store requires. Opacity stays fractional.
    pub fn to_integral(&self) -> Template {
        fn trunc(v: &mut Option<f64>) {
            *v = v.map(|v| if v.is_finite() { v.trunc() } else { 0.0 });
        }
        let mut template = self.clone();
        template.width = template.width.trunc();
        template.height = template.height.trunc();
        for element in &mut template.elements {
            trunc(&mut element.x);
            trunc(&mut element.y);
            trunc(&mut element.width);
            trunc(&mut element.height);
            trunc(&mut element.font_size);
            trunc(&mut element.line_height);
            trunc(&mut element.border_width);
            trunc(&mut element.rotation);
        }
        template
    }
}

/// Identity and ownership of a template being serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateInfo {
    pub id: Option<String>,
    pub name: String,
    pub client_id: Option<String>,
}

/// Whether element ids survive a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Mint a fresh id for every loaded element.
    #[default]
    Remint,
    /// Keep well-formed `element-<n>` ids from the template, minting only
    /// for missing, malformed or duplicate ones.
    Preserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub preserve_guides: bool,
    pub id_policy: IdPolicy,
}

/// What a load did beyond a straight copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Template id (if any) to new element id, in template order.
    pub id_map: Vec<(Option<String>, ElementId)>,
    /// Elements whose position was clamped into the canvas window.
    pub clamped: Vec<ElementId>,
    /// Template elements skipped, with the reason.
    pub skipped: Vec<String>,
    /// Layer-order entries that resolved to no live element.
    pub dropped_layer_ids: Vec<String>,
}

/// Convert the store and layer order into a wire template.
pub fn serialize(
    store: &ElementStore,
    layers: &LayerOrder,
    canvas: Size,
    info: TemplateInfo,
    colors: &ColorConfig,
) -> Template {
    let base = ElementDefaults::base(colors);
    Template {
        id: info.id,
        name: info.name,
        width: canvas.width,
        height: canvas.height,
        client_id: info.client_id,
        layer_order: layers.ids().iter().map(|id| id.to_string()).collect(),
        layer_visibility: layers
            .visibility()
            .iter()
            .map(|(id, visible)| (id.to_string(), *visible))
            .collect(),
        elements: store.iter().map(|e| element_to_wire(e, &base)).collect(),
    }
}

fn element_to_wire(element: &Element, base: &ElementDefaults) -> TemplateElement {
    let g = &element.geometry;
    let mut wire = TemplateElement {
        id: Some(element.id().to_string()),
        name: Some(element.name.clone()),
        element_type: element.element_type().as_str().to_string(),
        x: Some(g.x),
        y: Some(g.y),
        width: Some(g.width),
        height: Some(g.height),
        text: Some(String::new()),
        font_size: Some(base.font_size),
        font_family: Some(base.font_family.clone()),
        text_align: Some(base.text_align),
        line_height: Some(base.line_height),
        color: Some(base.color.hex.clone()),
        color_cmyk: Some(base.color.cmyk),
        background_color: Some(base.background.hex.clone()),
        background_color_cmyk: Some(base.background.cmyk),
        border_color: Some(base.border.hex.clone()),
        border_color_cmyk: Some(base.border.cmyk),
        border_width: Some(base.border_width),
        opacity: Some(element.opacity),
        rotation: Some(g.rotation),
        color_mode: Some(element.color_mode),
        image_url: None,
    };

    match &element.style {
        ElementStyle::Text(style) => {
            wire.text = Some(style.text.clone());
            wire.font_size = Some(style.font_size);
            wire.font_family = Some(style.font_family.clone());
            wire.text_align = Some(style.text_align);
            wire.line_height = Some(style.line_height);
            wire.color = Some(style.color.hex.clone());
            wire.color_cmyk = Some(style.color.cmyk);
        }
        ElementStyle::Shape(style) => {
            wire.background_color = Some(style.background.hex.clone());
            wire.background_color_cmyk = Some(style.background.cmyk);
            wire.border_color = Some(style.border.hex.clone());
            wire.border_color_cmyk = Some(style.border.cmyk);
            wire.border_width = Some(style.border_width);
        }
        ElementStyle::Image(style) => {
            wire.image_url = style.image_url.clone();
        }
    }
    wire
}

/// Resolve a wire colour pair over a default swatch.
///
/// CMYK is backfilled from hex when absent; hex is derived from CMYK when
/// only CMYK is present. Invalid hex keeps the default.
fn wire_swatch(hex: Option<&str>, cmyk: Option<Cmyk>, default: &Swatch) -> Swatch {
    match (hex.filter(|h| is_valid_hex(h)), cmyk) {
        (Some(hex), Some(cmyk)) => Swatch {
            hex: hex.to_string(),
            cmyk: Cmyk::new(cmyk.c, cmyk.m, cmyk.y, cmyk.k),
        },
        (Some(hex), None) => Swatch::from_hex(hex),
        (None, Some(cmyk)) => Swatch::from_cmyk(Cmyk::new(cmyk.c, cmyk.m, cmyk.y, cmyk.k)),
        (None, None) => {
            if let Some(invalid) = hex {
                log::warn!("Ignoring invalid colour {invalid:?} in template");
            }
            default.clone()
        }
    }
}

/// Older templates stored line height as a multiplier of the font size.
pub const LEGACY_LINE_HEIGHT_LIMIT: f64 = 8.0;

/// Convert a stored line height to pixels, expanding legacy multipliers.
fn legacy_line_height(value: f64, font_size: f64) -> f64 {
    if value < LEGACY_LINE_HEIGHT_LIMIT {
        (font_size * value).round()
    } else {
        value
    }
}

/// Copy present wire fields onto a freshly created element.
fn apply_wire(element: &mut Element, wire: &TemplateElement) {
    let g = &mut element.geometry;
    if let Some(v) = wire.x.filter(|v| v.is_finite()) {
        g.x = v;
    }
    if let Some(v) = wire.y.filter(|v| v.is_finite()) {
        g.y = v;
    }
    if let Some(v) = wire.width.filter(|v| v.is_finite()) {
        g.width = v;
    }
    if let Some(v) = wire.height.filter(|v| v.is_finite()) {
        g.height = v;
    }
    if let Some(v) = wire.rotation.filter(|v| v.is_finite()) {
        g.rotation = normalize_rotation(v);
    }
    if let Some(v) = wire.opacity.filter(|v| v.is_finite()) {
        element.opacity = v.clamp(0.0, 1.0);
    }
    element.color_mode = wire.color_mode.unwrap_or_default();

    match &mut element.style {
        ElementStyle::Text(style) => {
            if let Some(text) = &wire.text {
                style.text = text.clone();
            }
            if let Some(v) = wire.font_size.filter(|v| v.is_finite()) {
                style.font_size = v;
            }
            if let Some(family) = &wire.font_family {
                style.font_family = family.clone();
            }
            if let Some(align) = wire.text_align {
                style.text_align = align;
            }
            if let Some(v) = wire.line_height.filter(|v| v.is_finite() && *v > 0.0) {
                style.line_height = legacy_line_height(v, style.font_size);
            }
            style.color = wire_swatch(wire.color.as_deref(), wire.color_cmyk, &style.color);
        }
        ElementStyle::Shape(style) => {
            style.background = wire_swatch(
                wire.background_color.as_deref(),
                wire.background_color_cmyk,
                &style.background,
            );
            style.border = wire_swatch(
                wire.border_color.as_deref(),
                wire.border_color_cmyk,
                &style.border,
            );
            if let Some(v) = wire.border_width.filter(|v| v.is_finite()) {
                style.border_width = v;
            }
        }
        ElementStyle::Image(style) => {
            *style = ImageStyle {
                image_url: wire.image_url.clone().filter(|url| !url.is_empty()),
            };
        }
    }
}

impl Editor {
    /// Serialize the current document.
    pub fn to_template(&self, info: TemplateInfo) -> Template {
        serialize(
            &self.store,
            &self.layers,
            self.viewport.canvas_size(),
            info,
            &self.config.colors,
        )
    }

    /// Replace the document with a template's contents.
    pub fn load_template(&mut self, template: &Template, options: LoadOptions) -> LoadReport {
        self.clear(options.preserve_guides);
        if template.width > 0.0 && template.height > 0.0 {
            self.set_canvas_size(template.width, template.height);
        }
        let canvas = self.viewport.canvas_size();
        let buffer = self.config.constraints.boundary_buffer;
        let mut report = LoadReport::default();
        let mut lookup: HashMap<&str, ElementId> = HashMap::new();

        for wire in &template.elements {
            let element_type = match wire.element_type.parse::<ElementType>() {
                Ok(t) => t,
                Err(reason) => {
                    log::warn!("Skipping template element: {reason}");
                    report.skipped.push(reason);
                    continue;
                }
            };

            let id = match (options.id_policy, wire.id.as_deref()) {
                (IdPolicy::Preserve, Some(wire_id)) => {
                    let candidate = ElementId::new(wire_id);
                    if candidate.counter().is_some() && !self.store.contains(&candidate) {
                        self.store.reserve_id(&candidate);
                        candidate
                    } else {
                        self.store.mint_id()
                    }
                }
                _ => self.store.mint_id(),
            };
            let name = self.store.next_name(element_type);
            let defaults = ElementDefaults::for_type(element_type, &self.config.colors);
            let mut element = Element::new(id.clone(), name, element_type, Point::ZERO, &defaults);
            apply_wire(&mut element, wire);

            let g = &mut element.geometry;
            let (x, y) = (g.x, g.y);
            g.x = clamp_origin(g.x, g.width, canvas.width, buffer);
            g.y = clamp_origin(g.y, g.height, canvas.height, buffer);
            if g.x != x || g.y != y {
                log::debug!("Clamped {id} from ({x}, {y}) to ({}, {})", g.x, g.y);
                report.clamped.push(id.clone());
            }

            self.insert_element(element);
            if let Some(wire_id) = wire.id.as_deref() {
                lookup.entry(wire_id).or_insert_with(|| id.clone());
            }
            report.id_map.push((wire.id.clone(), id));
        }

        let resolve = |wire_id: &str| -> Option<ElementId> {
            lookup.get(wire_id).cloned().or_else(|| {
                let id = ElementId::new(wire_id);
                self.store.contains(&id).then_some(id)
            })
        };

        let mut entries = Vec::with_capacity(template.layer_order.len());
        for wire_id in &template.layer_order {
            match resolve(wire_id) {
                Some(id) => {
                    let visible = template.layer_visibility.get(wire_id).copied().unwrap_or(true);
                    entries.push((id, visible));
                }
                None => report.dropped_layer_ids.push(wire_id.clone()),
            }
        }
        let visibility: Vec<(ElementId, bool)> = template
            .layer_visibility
            .iter()
            .filter_map(|(wire_id, visible)| resolve(wire_id).map(|id| (id, *visible)))
            .collect();

        let duplicates = self.layers.restore(entries, self.store.ids());
        report
            .dropped_layer_ids
            .extend(duplicates.into_iter().map(|id| id.to_string()));
        for (id, visible) in visibility {
            self.layers.set_visible(&id, visible);
        }
        if !report.dropped_layer_ids.is_empty() {
            log::warn!(
                "Dropped {} unresolved layer entries: {:?}",
                report.dropped_layer_ids.len(),
                report.dropped_layer_ids
            );
        }

        self.select(None);
        log::info!(
            "Loaded template {:?} with {} elements",
            template.name,
            self.store.len()
        );
        report
    }
}
