//! Pagesmith Core Library
//!
//! Platform-agnostic layout engine for the Pagesmith print template editor:
//! element model, pointer gestures, snapping, layers, zoom, template
//! serialization and export snapshots.

pub mod color;
pub mod config;
pub mod editor;
pub mod element;
pub mod error;
pub mod export;
pub mod handles;
pub mod input;
pub mod interaction;
pub mod layers;
pub mod remote;
pub mod snap;
pub mod store;
pub mod template;
pub mod tools;
pub mod viewport;

pub use color::{Cmyk, ColorMode, Rgb, Swatch};
pub use config::{EditorConfig, ElementDefaults, RemoteConfig};
pub use editor::{ColorTarget, Editor, EditorEvent, PropertyEdit};
pub use element::{Element, ElementId, ElementType, Geometry, TextAlign};
pub use error::{EditorError, EditorResult};
pub use export::{DocumentRenderer, ExportColor, ExportSnapshot, JsonRenderer};
pub use handles::{HandleKind, ResizeHandle};
pub use input::{Modifiers, PointerEvent, PointerTarget};
pub use interaction::Gesture;
pub use layers::LayerOrder;
pub use snap::{GuideLine, Orientation, SiblingAlignment, SnapLine, SnapResult};
pub use template::{IdPolicy, LoadOptions, LoadReport, Template, TemplateInfo};
pub use tools::ToolKind;
pub use viewport::Viewport;
