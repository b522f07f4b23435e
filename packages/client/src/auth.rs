//! Authentication operations

use crate::client::ApiClient;
use crate::credentials::{
    ACCESS_TOKEN_KEY, CACHED_USER_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS,
};
use crate::error::{ClientError, ClientResult};
use crate::models::{LoginRequest, RefreshRequest, RegisterRequest, TokenPair, User};
use crate::transport::ApiRequest;

/// Authentication API, obtained from [`ApiClient::auth`]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Register a new account
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<User> {
        let body = serde_json::to_value(RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        })?;

        let response = self
            .client
            .request_unauthenticated(ApiRequest::post("/auth/register").with_body(body))
            .await?;
        response.decode()
    }

    /// Log in and persist the issued token pair
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<TokenPair> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let response = self
            .client
            .request_unauthenticated(ApiRequest::post("/auth/login").with_body(body))
            .await?;
        let pair: TokenPair = response.decode()?;

        let store = self.client.credentials();
        store.set(ACCESS_TOKEN_KEY, &pair.access_token).await?;
        store.set(REFRESH_TOKEN_KEY, &pair.refresh_token).await?;

        tracing::info!("Logged in as {}", email);
        Ok(pair)
    }

    /// End the session
    ///
    /// The server call is best-effort; local credentials are cleared even
    /// when it fails.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Err(e) = self.client.request(ApiRequest::post("/auth/logout")).await {
            tracing::debug!("Logout request failed: {}", e);
        }

        self.client.credentials().remove_all(&SESSION_KEYS).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Fetch the current user
    ///
    /// On success the record is cached locally; a network failure falls back
    /// to the cached copy when one exists.
    pub async fn me(&self) -> ClientResult<User> {
        match self.client.request(ApiRequest::get("/auth/me")).await {
            Ok(response) => {
                let user: User = response.decode()?;
                match serde_json::to_string(&user) {
                    Ok(json) => {
                        if let Err(e) = self.client.credentials().set(CACHED_USER_KEY, &json).await
                        {
                            tracing::debug!("Could not cache user: {}", e);
                        }
                    }
                    Err(e) => tracing::debug!("Could not encode user for cache: {}", e),
                }
                Ok(user)
            }
            Err(err) if err.is_network_error() => {
                if let Some(user) = self.cached_user().await? {
                    tracing::debug!("Using cached user, server unreachable: {}", err);
                    return Ok(user);
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Exchange the stored refresh token for a fresh pair and persist it
    pub async fn refresh(&self) -> ClientResult<TokenPair> {
        let store = self.client.credentials();
        let refresh_token = store
            .get(REFRESH_TOKEN_KEY)
            .await?
            .ok_or_else(|| ClientError::session_expired("No refresh token available"))?;

        let body = serde_json::to_value(RefreshRequest { refresh_token })?;
        let response = self
            .client
            .request_unauthenticated(ApiRequest::post("/auth/refresh").with_body(body))
            .await?;
        let pair: TokenPair = response.decode()?;

        store.set(ACCESS_TOKEN_KEY, &pair.access_token).await?;
        store.set(REFRESH_TOKEN_KEY, &pair.refresh_token).await?;
        Ok(pair)
    }

    /// Whether an access token is currently stored
    pub async fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self
            .client
            .credentials()
            .get(ACCESS_TOKEN_KEY)
            .await?
            .is_some())
    }

    /// Decode the locally cached user without touching the network
    ///
    /// A corrupt cache entry is treated as absent.
    pub async fn cached_user(&self) -> ClientResult<Option<User>> {
        match self.client.credentials().get(CACHED_USER_KEY).await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(user) => Ok(Some(user)),
                Err(e) => {
                    tracing::debug!("Discarding corrupt cached user: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}
