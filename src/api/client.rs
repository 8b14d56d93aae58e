//! HTTP implementation of [`ChatBackend`] on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;
use reqwest::header::ACCEPT;

use super::backend::{ApiError, ChatBackend};
use super::types::{ChatReply, ChatRequest, ChatResponse};

/// Chat backend reached over HTTP (`POST /chat`, `DELETE /history/{id}`).
pub struct HttpChatBackend {
    base_url: Url,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpChatBackend {
    /// Build a client for `base_url`. `timeout` bounds every request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("'{base_url}' cannot be a base URL")));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let endpoint = base_url.as_str().trim_end_matches('/').to_string();
        info!("Chat backend at {} (timeout {:?})", endpoint, timeout);

        Ok(Self {
            base_url,
            endpoint,
            timeout,
            client,
        })
    }

    /// Append path segments to the base URL, escaping each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("'{}' cannot be a base URL", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_transport(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let url = self.url(&["chat"])?;
        info!(
            "POST {} (message_len={}, session={})",
            url,
            request.message.len(),
            request.session_id.as_deref().unwrap_or("none")
        );

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        debug!("Chat response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Chat backend error: {} - {}", status, message);
            return Err(ApiError::Status { status, message });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?;
        debug!("Chat response body: {:?}", parsed);

        parsed.into_reply()
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), ApiError> {
        let url = self.url(&["history", session_id])?;
        info!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ApiError::Status { status, message });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HttpChatBackend::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let backend = HttpChatBackend::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:8000");
        assert_eq!(
            backend.url(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/chat"
        );
    }

    #[test]
    fn test_url_keeps_base_path_and_escapes_segments() {
        let backend = HttpChatBackend::new("http://localhost:8000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            backend.url(&["history", "a b/c"]).unwrap().as_str(),
            "http://localhost:8000/api/history/a%20b%2Fc"
        );
    }
}
