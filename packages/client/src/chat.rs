//! Chat operations

use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{ChatReply, SendMessageRequest, SessionDetail, SessionPage};
use crate::transport::ApiRequest;

/// Longest message the backend accepts
const MAX_MESSAGE_CHARS: usize = 5000;

/// Chat API, obtained from [`ApiClient::chat`]
pub struct ChatApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ChatApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Send a message, starting a new session when no session id is given
    pub async fn send(&self, message: &str, session_id: Option<Uuid>) -> ClientResult<ChatReply> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("Message must not be empty"));
        }
        if trimmed.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ClientError::validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let body = serde_json::to_value(SendMessageRequest {
            message: trimmed.to_string(),
            session_id,
        })?;

        let response = self
            .client
            .request(ApiRequest::post("/chat/send").with_body(body))
            .await?;
        response.decode()
    }

    /// List conversation sessions, newest first
    pub async fn sessions(&self, page: u32, page_size: u32) -> ClientResult<SessionPage> {
        let path = format!("/chat/sessions?page={}&page_size={}", page, page_size);
        let response = self.client.request(ApiRequest::get(path)).await?;
        response.decode()
    }

    /// Fetch one session together with its message history
    pub async fn session(&self, id: Uuid) -> ClientResult<SessionDetail> {
        let response = self
            .client
            .request(ApiRequest::get(format!("/chat/sessions/{}", id)))
            .await?;
        response.decode()
    }

    /// Delete a session and its messages
    pub async fn delete_session(&self, id: Uuid) -> ClientResult<()> {
        self.client
            .request(ApiRequest::delete(format!("/chat/sessions/{}", id)))
            .await?;
        Ok(())
    }
}
