//! HTTP gateway to the SignDev API
//!
//! Every request passes through [`ApiClient::apply_auth`], which reads the
//! bearer token from the shared [`SessionStore`] at send time.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::SessionStore;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Join a relative endpoint path onto the API root with exactly one `/`
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base, path)
}

/// Percent-encode a value used as a single path segment
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn build_url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and turn any non-2xx reply into [`ClientError::Api`]
    async fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> Result<Response> {
        debug!(method, path, "API request");
        let response = self.apply_auth(request).send().await.map_err(|e| {
            warn!(method, path, error = %e, "API request did not complete");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        warn!(
            method,
            path,
            status = status.as_u16(),
            reason = message.as_deref().unwrap_or(""),
            "API request rejected"
        );
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.build_url(path));
        let response = self.execute("GET", path, request).await?;
        read_json(response).await
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let request = self.client.get(self.build_url(path));
        let response = self.execute("GET", path, request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.execute("POST", path, request).await?;
        read_json(response).await
    }

    /// POST where the reply body is informational; unreadable bodies yield `T::default()`
    pub async fn post_json_lenient<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.execute("POST", path, request).await?;
        read_json_lenient(response).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.execute("POST", path, request).await?;
        read_json(response).await
    }

    /// PUT a multipart form, discarding the reply body
    pub async fn put_multipart(&self, path: &str, form: reqwest::multipart::Form) -> Result<()> {
        let request = self.client.put(self.build_url(path)).multipart(form);
        self.execute("PUT", path, request).await?;
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn read_json_lenient<T: DeserializeOwned + Default>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, "Ignoring unreadable response body");
            Ok(T::default())
        }
    }
}

/// Server-provided text from an error body: `error`, then `message`
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// A PDF part named `file`, as the upload endpoints expect
pub fn pdf_form(file_name: &str, bytes: Vec<u8>) -> Result<reqwest::multipart::Form> {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(crate::upload::PDF_MEDIA_TYPE)?;
    Ok(reqwest::multipart::Form::new().part("file", part))
}
