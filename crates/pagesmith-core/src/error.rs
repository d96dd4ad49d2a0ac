//! Errors raised by editor operations.

use crate::element::ElementId;
use thiserror::Error;

/// Errors returned by [`crate::Editor`] operations.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Element not found: {0}")]
    ElementNotFound(ElementId),
    #[error("Cannot start {requested}: a {active} gesture is already active")]
    GestureInProgress {
        requested: &'static str,
        active: &'static str,
    },
    #[error("Layer index out of range: {index} (layer count {len})")]
    LayerIndexOutOfRange { index: usize, len: usize },
    #[error("Guide not found: {0}")]
    GuideNotFound(usize),
    #[error("Element {id} does not support {property}")]
    UnsupportedProperty {
        id: ElementId,
        property: &'static str,
    },
    #[error("Failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },
    #[error("Template error: {0}")]
    Template(#[from] serde_json::Error),
}

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
