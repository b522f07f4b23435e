//! Shared client construction for CLI commands

use anyhow::Context;
use seva_client::{ApiClient, ClientConfig};

/// Build an API client from the saved configuration plus environment overrides
pub async fn build_client() -> anyhow::Result<ApiClient> {
    let mut config = ClientConfig::load()
        .await
        .context("Failed to load configuration")?;
    config.apply_env();

    ApiClient::new(config).context("Failed to initialize API client")
}
