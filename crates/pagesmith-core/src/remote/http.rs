//! REST client for the template and image API.

use super::{
    AssetStore, BoxFuture, ClientInfo, RemoteError, RemoteResult, SaveResponse, TemplateStore,
    TemplateSummary, UploadedImage,
};
use crate::config::RemoteConfig;
use crate::template::Template;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Template and asset store backed by the HTTP API at `base_url`
/// (e.g. `http://localhost:8000/api`).
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        log::debug!("{method} {url}");
        self.client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

/// Send a request and return the JSON body, mapping non-2xx responses to
/// [`RemoteError::Status`] or [`RemoteError::NotFound`].
async fn send(request: RequestBuilder) -> RemoteResult<Value> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(body);
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(message));
    }
    let errors = body
        .get("errors")
        .cloned()
        .and_then(|e| serde_json::from_value(e).ok())
        .unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        message,
        errors,
    })
}

fn decode<T: DeserializeOwned>(value: Value) -> RemoteResult<T> {
    Ok(serde_json::from_value(value)?)
}

/// Unwrap the `{success, data}` envelope of the image endpoints.
fn envelope_data(mut body: Value) -> RemoteResult<Value> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Request failed");
        return Err(RemoteError::Other(message.to_string()));
    }
    Ok(body.get_mut("data").map(Value::take).unwrap_or(Value::Null))
}

/// Pull the saved template id out of a create/update response, which nests
/// it under `template` (older servers return it at the top level).
fn save_response(body: &Value, fallback_id: Option<&str>) -> RemoteResult<SaveResponse> {
    let id = body
        .pointer("/template/id")
        .or_else(|| body.get("id"))
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .or_else(|| fallback_id.map(ToOwned::to_owned))
        .ok_or_else(|| RemoteError::Decode("save response carries no template id".into()))?;
    Ok(SaveResponse {
        id,
        message: body.get("message").and_then(Value::as_str).map(ToOwned::to_owned),
    })
}

impl TemplateStore for HttpStore {
    fn list(&self, search: Option<&str>) -> BoxFuture<'_, RemoteResult<Vec<TemplateSummary>>> {
        let mut request = self.request(Method::GET, "templates");
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            request = request.query(&[("search", term)]);
        }
        Box::pin(async move { decode(send(request).await?) })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, RemoteResult<Template>> {
        let request = self.request(Method::GET, &format!("templates/{id}"));
        Box::pin(async move { decode(send(request).await?) })
    }

    fn create(&self, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>> {
        let request = self
            .request(Method::POST, "templates")
            .json(&template.to_integral());
        Box::pin(async move { save_response(&send(request).await?, None) })
    }

    fn update(&self, id: &str, template: &Template) -> BoxFuture<'_, RemoteResult<SaveResponse>> {
        let id = id.to_string();
        let request = self
            .request(Method::PUT, &format!("templates/{id}"))
            .json(&template.to_integral());
        Box::pin(async move { save_response(&send(request).await?, Some(&id)) })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, RemoteResult<()>> {
        let request = self.request(Method::DELETE, &format!("templates/{id}"));
        Box::pin(async move {
            send(request).await?;
            Ok(())
        })
    }

    fn list_clients(&self) -> BoxFuture<'_, RemoteResult<Vec<ClientInfo>>> {
        let request = self.request(Method::GET, "clients");
        Box::pin(async move { decode(send(request).await?) })
    }

    fn fetch_config(&self) -> BoxFuture<'_, RemoteResult<RemoteConfig>> {
        let request = self.request(Method::GET, "config");
        Box::pin(async move { decode(send(request).await?) })
    }
}

impl AssetStore for HttpStore {
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
            let part = Part::bytes(bytes).file_name(filename).mime_str(&mime)?;
            let form = Form::new().part("image", part).text("client_id", client_id);
            let request = self.request(Method::POST, "images/upload").multipart(form);
            let image: UploadedImage = decode(envelope_data(send(request).await?)?)?;
            log::info!("Uploaded image {} ({} bytes)", image.path, image.size);
            Ok(image)
        })
    }

    fn list_images(&self, client_id: &str) -> BoxFuture<'_, RemoteResult<Vec<UploadedImage>>> {
        let request = self.request(Method::GET, &format!("images/client/{client_id}"));
        Box::pin(async move {
            match envelope_data(send(request).await?)? {
                Value::Null => Ok(Vec::new()),
                data => decode(data),
            }
        })
    }

    fn delete_image(&self, path: &str) -> BoxFuture<'_, RemoteResult<()>> {
        let request = self
            .request(Method::DELETE, "images")
            .json(&json!({ "path": path }));
        Box::pin(async move {
            envelope_data(send(request).await?)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimmed() {
        let store = HttpStore::with_client(Client::new(), "http://localhost:8000/api/");
        assert_eq!(store.base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn test_save_response_nested_id() {
        let body = json!({"message": "Template created successfully", "template": {"id": 42}});
        let saved = save_response(&body, None).unwrap();
        assert_eq!(saved.id, "42");
        assert_eq!(saved.message.as_deref(), Some("Template created successfully"));
    }

    #[test]
    fn test_save_response_fallbacks() {
        assert_eq!(save_response(&json!({"id": "9"}), None).unwrap().id, "9");
        assert_eq!(save_response(&json!({}), Some("3")).unwrap().id, "3");
        assert!(matches!(
            save_response(&json!({}), None),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn test_envelope() {
        let data = envelope_data(json!({"success": true, "data": {"url": "u"}})).unwrap();
        assert_eq!(data["url"], "u");
        assert!(matches!(
            envelope_data(json!({"success": false, "message": "Invalid client ID"})),
            Err(RemoteError::Other(m)) if m == "Invalid client ID"
        ));
    }

    #[test]
    fn test_decode_show_response() {
        let body = json!({
            "id": 5, "name": "Card", "width": 300, "height": 200, "client_id": 2,
            "client": {"id": 2, "name": "Acme"},
            "layer_order": ["element-1"], "layer_visibility": {"element-1": true},
            "elements": [{
                "id": 17, "template_id": 5, "name": "Text 1", "type": "text",
                "x": 10, "y": 20, "width": 120, "height": 30, "text": null,
                "opacity": "1.00", "lineHeight": "18.0", "colorCmyk": null,
                "imageUrl": null
            }],
            "created_at": "2024-01-01T00:00:00Z"
        });
        let template: Template = decode(body).unwrap();
        assert_eq!(template.id.as_deref(), Some("5"));
        assert_eq!(template.client_id.as_deref(), Some("2"));
        assert_eq!(template.layer_order, vec!["element-1".to_string()]);
        let element = &template.elements[0];
        assert_eq!(element.id.as_deref(), Some("17"));
        assert_eq!(element.opacity, Some(1.0));
        assert_eq!(element.text, None);
    }
}
