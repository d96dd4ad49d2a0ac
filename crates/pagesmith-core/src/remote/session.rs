//! Save/load workflow for the template being edited.

use super::{RemoteError, SaveResponse, TemplateStore};
use crate::editor::Editor;
use crate::template::{LoadOptions, LoadReport, TemplateInfo};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Pre-save checks, in the order they are applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a template name")]
    MissingName,
    #[error("Please select a client")]
    MissingClient,
    #[error("Please enter a valid width")]
    InvalidWidth,
    #[error("Please enter a valid height")]
    InvalidHeight,
    #[error("Cannot save empty template. Please add some elements first.")]
    Empty,
    #[error("A template with this name already exists: {0}")]
    NameTaken(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Tracks which remote template the editor holds and saves it back.
///
/// `save` borrows the session mutably, so a session never has two saves in
/// flight.
pub struct TemplateSession<S: TemplateStore> {
    store: Arc<S>,
    template_id: Option<String>,
    template_name: Option<String>,
    client_id: Option<String>,
    last_saved: Option<Instant>,
}

impl<S: TemplateStore> TemplateSession<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            template_id: None,
            template_name: None,
            client_id: None,
            last_saved: None,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Id of the remote template, `None` until the first save or load.
    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn set_client(&mut self, client_id: Option<String>) {
        self.client_id = client_id.filter(|c| !c.is_empty());
    }

    pub fn last_saved(&self) -> Option<Instant> {
        self.last_saved
    }

    /// Point the session at an existing remote template without loading it.
    pub fn attach(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.template_id = Some(id.into());
        self.template_name = Some(name.into());
    }

    /// Detach from the remote template; the next save creates a new one.
    pub fn new_document(&mut self) {
        self.template_id = None;
        self.template_name = None;
        self.last_saved = None;
    }

    /// Local checks that need no network.
    pub fn validate(&self, editor: &Editor, name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.client_id.is_none() {
            return Err(ValidationError::MissingClient);
        }
        let canvas = editor.viewport().canvas_size();
        if canvas.width <= 0.0 {
            return Err(ValidationError::InvalidWidth);
        }
        if canvas.height <= 0.0 {
            return Err(ValidationError::InvalidHeight);
        }
        if editor.store().is_empty() {
            return Err(ValidationError::Empty);
        }
        Ok(())
    }

    /// Case-insensitive name lookup. A failed lookup counts as "free".
    async fn name_exists(&self, name: &str) -> bool {
        match self.store.list(None).await {
            Ok(templates) => {
                let name = name.to_lowercase();
                templates.iter().any(|t| t.name.to_lowercase() == name)
            }
            Err(e) => {
                log::warn!("Could not check template name: {e}");
                false
            }
        }
    }

    /// Validate, serialize and create or update the remote template.
    ///
    /// Editor state is never modified; on failure the session keeps its
    /// previous id and name.
    pub async fn save(&mut self, editor: &Editor, name: &str) -> SessionResult<SaveResponse> {
        let name = name.trim();
        self.validate(editor, name)?;

        let renamed = self.template_name.as_deref() != Some(name);
        if (self.template_id.is_none() || renamed) && self.name_exists(name).await {
            return Err(ValidationError::NameTaken(name.to_string()).into());
        }

        let template = editor.to_template(TemplateInfo {
            id: self.template_id.clone(),
            name: name.to_string(),
            client_id: self.client_id.clone(),
        });
        let response = match self.template_id.as_deref() {
            Some(id) => self.store.update(id, &template).await?,
            None => self.store.create(&template).await?,
        };

        log::info!(
            "Saved template {:?} as {} ({} elements)",
            name,
            response.id,
            template.elements.len()
        );
        self.template_id = Some(response.id.clone());
        self.template_name = Some(name.to_string());
        self.last_saved = Some(Instant::now());
        Ok(response)
    }

    /// Fetch a template and load it into the editor. The editor is only
    /// touched once the fetch has succeeded.
    pub async fn load(
        &mut self,
        editor: &mut Editor,
        id: &str,
        options: LoadOptions,
    ) -> SessionResult<LoadReport> {
        let template = self.store.get(id).await?;
        let report = editor.load_template(&template, options);
        self.template_id = Some(template.id.clone().unwrap_or_else(|| id.to_string()));
        self.template_name = Some(template.name.clone());
        if template.client_id.is_some() {
            self.client_id = template.client_id.clone();
        }
        self.last_saved = Some(Instant::now());
        Ok(report)
    }

    /// Delete a remote template. Deleting the current one detaches the
    /// session.
    pub async fn delete(&mut self, id: &str) -> SessionResult<()> {
        self.store.delete(id).await?;
        if self.template_id.as_deref() == Some(id) {
            self.new_document();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::remote::MemoryStore;
    use crate::remote::memory::tests::block_on;
    use kurbo::Point;

    fn session() -> TemplateSession<MemoryStore> {
        let mut session = TemplateSession::new(Arc::new(MemoryStore::new()));
        session.set_client(Some("1".into()));
        session
    }

    fn editor_with_text() -> Editor {
        let mut editor = Editor::default();
        editor.create_element(ElementType::Text, Point::new(10.0, 10.0));
        editor
    }

    #[test]
    fn test_validation_order() {
        let mut session = TemplateSession::new(Arc::new(MemoryStore::new()));
        let editor = Editor::default();
        assert_eq!(session.validate(&editor, "  "), Err(ValidationError::MissingName));
        assert_eq!(session.validate(&editor, "Flyer"), Err(ValidationError::MissingClient));
        session.set_client(Some("1".into()));
        assert_eq!(session.validate(&editor, "Flyer"), Err(ValidationError::Empty));
        assert_eq!(session.validate(&editor_with_text(), "Flyer"), Ok(()));
    }

    #[test]
    fn test_empty_client_is_missing() {
        let mut session = session();
        session.set_client(Some(String::new()));
        assert_eq!(session.client_id(), None);
    }

    #[test]
    fn test_save_creates_then_updates() {
        let mut session = session();
        let mut editor = editor_with_text();

        let first = block_on(session.save(&editor, " Flyer ")).unwrap();
        assert_eq!(session.template_id(), Some(first.id.as_str()));
        assert_eq!(session.template_name(), Some("Flyer"));
        assert!(session.last_saved().is_some());

        editor.create_element(ElementType::Circle, Point::ZERO);
        let second = block_on(session.save(&editor, "Flyer")).unwrap();
        assert_eq!(first.id, second.id);

        let stored = block_on(session.store().get(&first.id)).unwrap();
        assert_eq!(stored.elements.len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let store = Arc::new(MemoryStore::new());
        let editor = editor_with_text();

        let mut a = TemplateSession::new(store.clone());
        a.set_client(Some("1".into()));
        block_on(a.save(&editor, "Flyer")).unwrap();

        let mut b = TemplateSession::new(store);
        b.set_client(Some("1".into()));
        let err = block_on(b.save(&editor, "flyer")).unwrap_err();
        assert!(matches!(err, SessionError::Validation(ValidationError::NameTaken(_))));
        assert_eq!(b.template_id(), None);
    }

    #[test]
    fn test_load_into_editor() {
        let mut session = session();
        let editor = editor_with_text();
        let saved = block_on(session.save(&editor, "Flyer")).unwrap();

        let mut other = TemplateSession::new(session.store().clone());
        let mut target = Editor::default();
        let report = block_on(other.load(&mut target, &saved.id, LoadOptions::default())).unwrap();
        assert_eq!(report.id_map.len(), 1);
        assert_eq!(target.store().len(), 1);
        assert_eq!(other.template_name(), Some("Flyer"));
        assert_eq!(other.client_id(), Some("1"));
    }

    #[test]
    fn test_failed_load_leaves_editor() {
        let mut session = session();
        let mut editor = editor_with_text();
        assert!(block_on(session.load(&mut editor, "404", LoadOptions::default())).is_err());
        assert_eq!(editor.store().len(), 1);
    }

    #[test]
    fn test_delete_current_detaches() {
        let mut session = session();
        let editor = editor_with_text();
        let saved = block_on(session.save(&editor, "Flyer")).unwrap();
        block_on(session.delete(&saved.id)).unwrap();
        assert_eq!(session.template_id(), None);
    }
}
