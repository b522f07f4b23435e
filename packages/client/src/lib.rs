//! Seva API client SDK
//!
//! Networking layer shared by the Seva front-ends: credential storage, an
//! authenticated HTTP client, and transparent recovery from expired access
//! tokens through a serialized refresh exchange.

pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod refresh;
pub mod transport;

// Re-export commonly used types
pub use auth::AuthApi;
pub use chat::ChatApi;
pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_API_URL};
pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, ACCESS_TOKEN_KEY,
    CACHED_USER_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS,
};
pub use error::{ClientError, ClientResult};
pub use models::*;
pub use refresh::RefreshGate;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
