/// GitHub gist as the remote document store.
///
/// One private gist per board; the board travels as the gist file
/// `board.json`. The credential is a personal access token with the
/// `gist` scope.
use printboard_core::sync::{RemoteDocumentStore, SyncError};
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};

pub const GITHUB_API: &str = "https://api.github.com";
const GIST_DESCRIPTION: &str = "3D Print Board sync";
const USER_AGENT: &str = concat!("printboard-backend/", env!("CARGO_PKG_VERSION"));

pub struct GistStore {
    client: reqwest::Client,
    api_base: String,
}

impl GistStore {
    pub fn new() -> Self {
        Self::with_api_base(GITHUB_API)
    }

    /// Point at a different API root (GitHub Enterprise, test servers).
    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.api_base, id)
    }
}

impl Default for GistStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn send(builder: RequestBuilder, action: &str) -> Result<Response, SyncError> {
    let resp = builder
        .send()
        .await
        .map_err(|e| SyncError::Network(format!("{} failed: {}", action, e)))?;
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    log::warn!(
        "[printboard.gist] {} returned {}: {}",
        action,
        status,
        message
    );
    Err(SyncError::Remote { status, message })
}

async fn read_json(resp: Response, action: &str) -> Result<Value, SyncError> {
    resp.json()
        .await
        .map_err(|e| SyncError::Network(format!("{}: unreadable response: {}", action, e)))
}

/// Content of file `name` in a gist response body.
fn file_content(gist: &Value, name: &str) -> Option<String> {
    gist.get("files")?
        .get(name)?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

fn files_body(name: &str, content: &str) -> Value {
    json!({ "files": { name: { "content": content } } })
}

impl RemoteDocumentStore for GistStore {
    async fn create_document(
        &self,
        credential: &str,
        name: &str,
        initial: &str,
    ) -> Result<String, SyncError> {
        let mut body = files_body(name, initial);
        body["description"] = json!(GIST_DESCRIPTION);
        body["public"] = json!(false);

        let request = self.authorized(
            self.client.post(format!("{}/gists", self.api_base)),
            credential,
        );
        let resp = send(request.json(&body), "Create gist").await?;
        let gist = read_json(resp, "Create gist").await?;
        gist.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SyncError::Network("Create gist: response has no id".to_string()))
    }

    async fn write_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
        content: &str,
    ) -> Result<(), SyncError> {
        let request = self.authorized(self.client.patch(self.gist_url(document_id)), credential);
        send(request.json(&files_body(name, content)), "Upload").await?;
        Ok(())
    }

    async fn read_payload(
        &self,
        credential: &str,
        document_id: &str,
        name: &str,
    ) -> Result<Option<String>, SyncError> {
        let request = self.authorized(self.client.get(self.gist_url(document_id)), credential);
        let resp = send(request, "Download").await?;
        let gist = read_json(resp, "Download").await?;
        Ok(file_content(&gist, name))
    }
}
