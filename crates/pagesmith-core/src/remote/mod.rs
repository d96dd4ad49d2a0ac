//! Remote template and asset stores.

mod http;
mod memory;
mod session;

pub use http::HttpStore;
pub use memory::MemoryStore;
pub use session::{SessionError, SessionResult, TemplateSession, ValidationError};

use crate::config::RemoteConfig;
use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        /// Per-field validation messages (HTTP 422).
        errors: BTreeMap<String, Vec<String>>,
    },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Decode(e.to_string())
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future for async store operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Entry in a template listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    #[serde(deserialize_with = "crate::template::lenient::string")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "crate::template::lenient::opt_string")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub elements_count: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(deserialize_with = "crate::template::lenient::string")]
    pub id: String,
    pub name: String,
}

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveResponse {
    pub id: String,
    pub message: Option<String>,
}

/// A stored image belonging to a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Template persistence backend.
pub trait TemplateStore: Send + Sync {
    /// List templates, optionally filtered by a name substring.
    fn list(&self, search: Option<&str>) -> BoxFuture<'_, RemoteResult<Vec<TemplateSummary>>>;

    fn get(&self, id: &str) -> BoxFuture<'_, RemoteResult<Template>>;

    fn create(&self, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>>;

    fn update(&self, id: &str, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>>;

    fn delete(&self, id: &str) -> BoxFuture<'_, RemoteResult<()>>;

    fn list_clients(&self) -> BoxFuture<'_, RemoteResult<Vec<ClientInfo>>>;

    fn fetch_config(&self) -> BoxFuture<'_, RemoteResult<RemoteConfig>>;
}

/// Image asset backend.
pub trait AssetStore: Send + Sync {
    fn upload_image(
        &self,
        client_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> BoxFuture<'_, RemoteResult<UploadedImage>>;

    fn list_images(&self, client_id: &str) -> BoxFuture<'_, RemoteResult<Vec<UploadedImage>>>;

    fn delete_image(&self, path: &str) -> BoxFuture<'_, RemoteResult<()>>;
}
