//! Seva API client

use std::sync::Arc;

use crate::auth::AuthApi;
use crate::chat::ChatApi;
use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, FileCredentialStore, ACCESS_TOKEN_KEY};
use crate::error::{ClientError, ClientResult};
use crate::models::HealthStatus;
use crate::refresh::RefreshGate;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

/// Authenticated client for the Seva backend
///
/// All authenticated traffic funnels through [`ApiClient::request`], which
/// attaches the stored access token and transparently recovers from expired
/// tokens via the refresh gate.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn CredentialStore>,
    gate: RefreshGate,
}

impl ApiClient {
    /// Create a client with the default transport and credential store
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&config)?);
        let store: Arc<dyn CredentialStore> = match &config.credentials_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(FileCredentialStore::default()),
        };

        Ok(Self::with_parts(config, transport, store))
    }

    /// Create a client from explicit parts, for embedding and tests
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let gate = RefreshGate::new(Arc::clone(&transport), Arc::clone(&store));
        Self {
            config,
            transport,
            store,
            gate,
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The credential store backing this client
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Authentication operations
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    /// Chat operations
    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    /// Perform an authenticated request
    ///
    /// The stored access token is attached as a bearer header. A 401 on a
    /// request that has not been replayed yet enters the refresh protocol;
    /// every other error propagates unchanged.
    pub async fn request(&self, mut request: ApiRequest) -> ClientResult<ApiResponse> {
        if let Some(token) = self.store.get(ACCESS_TOKEN_KEY).await? {
            request.set_bearer(&token);
        }

        match self.transport.execute(&request).await {
            Err(ClientError::Unauthorized(reason)) if !request.retried => {
                tracing::debug!("Unauthorized response, starting recovery: {}", reason);
                self.gate.recover(request).await
            }
            other => other,
        }
    }

    /// Perform a request without authentication or refresh handling
    ///
    /// Used for login, registration, and other endpoints that must not
    /// trigger the refresh protocol on a 401.
    pub async fn request_unauthenticated(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        self.transport.execute(&request).await
    }

    /// Check backend reachability
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        // The health endpoint lives at the server root, outside the API prefix.
        let base = url::Url::parse(&self.config.api_base_url)
            .map_err(|e| ClientError::config(format!("Invalid API base URL: {}", e)))?;
        let health_url = base
            .join("/health")
            .map_err(|e| ClientError::config(format!("Invalid health URL: {}", e)))?;

        let response = self
            .request_unauthenticated(ApiRequest::get(health_url.as_str()))
            .await?;
        response.decode()
    }
}
