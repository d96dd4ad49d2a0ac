//! In-memory store implementation.

use super::{
    AssetStore, BoxFuture, ClientInfo, RemoteError, RemoteResult, SaveResponse, TemplateStore,
    TemplateSummary, UploadedImage,
};
use crate::config::RemoteConfig;
use crate::template::Template;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    templates: BTreeMap<u64, Stored>,
    next_id: u64,
    /// Monotonic write counter, for newest-first listing.
    revision: u64,
    clients: Vec<ClientInfo>,
    images: HashMap<String, Vec<UploadedImage>>,
    config: RemoteConfig,
}

struct Stored {
    template: Template,
    revision: u64,
}

impl State {
    fn name_taken(&self, name: &str, except: Option<u64>) -> bool {
        let name = name.to_lowercase();
        self.templates
            .iter()
            .any(|(id, s)| Some(*id) != except && s.template.name.to_lowercase() == name)
    }
}

/// In-memory template and asset store for testing and offline use.
///
/// Mirrors the remote rules that matter to callers: unique names
/// (case-insensitive), numeric ids assigned in order, substring search.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

fn parse_id(id: &str) -> RemoteResult<u64> {
    id.parse()
        .map_err(|_| RemoteError::NotFound(format!("template {id}")))
}

fn name_conflict() -> RemoteError {
    let mut errors = BTreeMap::new();
    errors.insert(
        "name".to_string(),
        vec!["The name has already been taken.".to_string()],
    );
    RemoteError::Status {
        status: 422,
        message: "The name has already been taken.".into(),
        errors,
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the client list.
    pub fn with_clients(mut self, clients: impl IntoIterator<Item = ClientInfo>) -> Self {
        self.state_mut().clients = clients.into_iter().collect();
        self
    }

    pub fn with_config(mut self, config: RemoteConfig) -> Self {
        self.state_mut().config = config;
        self
    }

    /// Exclusive access while building. A poisoned lock is recovered and
    /// cleared.
    fn state_mut(&mut self) -> &mut State {
        if self.state.is_poisoned() {
            log::warn!("Recovering poisoned memory store lock");
            self.state.clear_poison();
        }
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RemoteResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| RemoteError::Other(format!("Lock error: {}", e)))
    }

    fn write(&self) -> RemoteResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| RemoteError::Other(format!("Lock error: {}", e)))
    }
}

impl TemplateStore for MemoryStore {
    fn list(&self, search: Option<&str>) -> BoxFuture<'_, RemoteResult<Vec<TemplateSummary>>> {
        let search = search.map(str::to_lowercase);
        Box::pin(async move {
            let state = self.read()?;
            let mut matches: Vec<(&u64, &Stored)> = state
                .templates
                .iter()
                .filter(|(_, s)| match &search {
                    Some(term) => s.template.name.to_lowercase().contains(term),
                    None => true,
                })
                .collect();
            matches.sort_by(|a, b| b.1.revision.cmp(&a.1.revision));
            Ok(matches
                .into_iter()
                .map(|(id, s)| TemplateSummary {
                    id: id.to_string(),
                    name: s.template.name.clone(),
                    client_id: s.template.client_id.clone(),
                    elements_count: Some(s.template.elements.len() as u64),
                    updated_at: None,
                })
                .collect())
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, RemoteResult<Template>> {
        let id = id.to_string();
        Box::pin(async move {
            let key = parse_id(&id)?;
            let state = self.read()?;
            state
                .templates
                .get(&key)
                .map(|s| s.template.clone())
                .ok_or_else(|| RemoteError::NotFound(format!("template {id}")))
        })
    }

    fn create(&self, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>> {
        let mut template = template.clone();
        Box::pin(async move {
            let mut state = self.write()?;
            if state.name_taken(&template.name, None) {
                return Err(name_conflict());
            }
            state.next_id += 1;
            state.revision += 1;
            let key = state.next_id;
            let revision = state.revision;
            template.id = Some(key.to_string());
            state.templates.insert(key, Stored { template, revision });
            Ok(SaveResponse {
                id: key.to_string(),
                message: Some("Template created successfully".into()),
            })
        })
    }

    fn update(&self, id: &str, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>> {
        let id = id.to_string();
        let mut template = template.clone();
        Box::pin(async move {
            let key = parse_id(&id)?;
            let mut state = self.write()?;
            if !state.templates.contains_key(&key) {
                return Err(RemoteError::NotFound(format!("template {id}")));
            }
            if state.name_taken(&template.name, Some(key)) {
                return Err(name_conflict());
            }
            state.revision += 1;
            let revision = state.revision;
            template.id = Some(id.clone());
            state.templates.insert(key, Stored { template, revision });
            Ok(SaveResponse {
                id,
                message: Some("Template updated successfully".into()),
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, RemoteResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let key = parse_id(&id)?;
            let mut state = self.write()?;
            state
                .templates
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| RemoteError::NotFound(format!("template {id}")))
        })
    }

    fn list_clients(&self) -> BoxFuture<'_, RemoteResult<Vec<ClientInfo>>> {
        Box::pin(async move { Ok(self.read()?.clients.clone()) })
    }

    fn fetch_config(&self) -> BoxFuture<'_, RemoteResult<RemoteConfig>> {
        Box::pin(async move { Ok(self.read()?.config.clone()) })
    }
}

impl AssetStore for MemoryStore {
    fn upload_image(
        &self,
        client_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> BoxFuture<'_, RemoteResult<UploadedImage>> {
        let client_id = client_id.to_string();
        let filename = filename.to_string();
        let mime = mime.to_string();
        Box::pin(async move {
            let mut state = self.write()?;
            if !state.clients.iter().any(|c| c.id == client_id) {
                return Err(RemoteError::NotFound(format!("client {client_id}")));
            }
            let path = format!("client_{client_id}/images/{filename}");
            let image = UploadedImage {
                url: format!("memory://{path}"),
                path,
                filename,
                size: bytes.len() as u64,
                mime_type: Some(mime),
            };
            let images = state.images.entry(client_id).or_default();
            images.retain(|i| i.path != image.path);
            images.push(image.clone());
            Ok(image)
        })
    }

    fn list_images(&self, client_id: &str) -> BoxFuture<'_, RemoteResult<Vec<UploadedImage>>> {
        let client_id = client_id.to_string();
        Box::pin(async move {
            let state = self.read()?;
            Ok(state.images.get(&client_id).cloned().unwrap_or_default())
        })
    }

    fn delete_image(&self, path: &str) -> BoxFuture<'_, RemoteResult<()>> {
        let path = path.to_string();
        Box::pin(async move {
            let mut state = self.write()?;
            for images in state.images.values_mut() {
                if let Some(index) = images.iter().position(|i| i.path == path) {
                    images.remove(index);
                    return Ok(());
                }
            }
            Err(RemoteError::NotFound(format!("image {path}")))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    fn template(name: &str) -> Template {
        Template {
            name: name.into(),
            width: 595.0,
            height: 842.0,
            client_id: Some("1".into()),
            ..Template::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let saved = block_on(store.create(&template("Flyer"))).unwrap();
        assert_eq!(saved.id, "1");
        let loaded = block_on(store.get("1")).unwrap();
        assert_eq!(loaded.name, "Flyer");
        assert_eq!(loaded.id.as_deref(), Some("1"));
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(block_on(store.get("7")), Err(RemoteError::NotFound(_))));
        assert!(matches!(block_on(store.get("abc")), Err(RemoteError::NotFound(_))));
        assert!(matches!(block_on(store.delete("7")), Err(RemoteError::NotFound(_))));
    }

    #[test]
    fn test_unique_names() {
        let store = MemoryStore::new();
        block_on(store.create(&template("Flyer"))).unwrap();
        let err = block_on(store.create(&template("FLYER"))).unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 422, .. }));

        // Renaming onto itself is fine.
        block_on(store.update("1", &template("flyer"))).unwrap();
    }

    #[test]
    fn test_list_search_newest_first() {
        let store = MemoryStore::new();
        block_on(store.create(&template("Summer flyer"))).unwrap();
        block_on(store.create(&template("Business card"))).unwrap();
        block_on(store.create(&template("Winter Flyer"))).unwrap();
        block_on(store.update("1", &template("Summer flyer"))).unwrap();

        let all = block_on(store.list(None)).unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);

        let flyers = block_on(store.list(Some("flyer"))).unwrap();
        assert_eq!(flyers.len(), 2);
    }

    #[test]
    fn test_builder_recovers_poisoned_lock() {
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            let handle = scope.spawn(|| {
                let _guard = store.state.write().unwrap();
                panic!("poison");
            });
            assert!(handle.join().is_err());
        });
        assert!(block_on(store.list_clients()).is_err());

        let store = store.with_clients([ClientInfo {
            id: "7".into(),
            name: "Globex".into(),
        }]);
        let clients = block_on(store.list_clients()).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Globex");
    }

    #[test]
    fn test_images() {
        let store = MemoryStore::new().with_clients([ClientInfo {
            id: "4".into(),
            name: "Acme".into(),
        }]);
        let image = block_on(store.upload_image("4", "logo.png", vec![0; 16], "image/png")).unwrap();
        assert_eq!(image.path, "client_4/images/logo.png");
        assert_eq!(image.size, 16);
        assert_eq!(block_on(store.list_images("4")).unwrap().len(), 1);

        block_on(store.delete_image(&image.path)).unwrap();
        assert!(block_on(store.list_images("4")).unwrap().is_empty());
        assert!(block_on(store.upload_image("9", "x.png", vec![], "image/png")).is_err());
    }
}
