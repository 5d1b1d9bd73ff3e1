//! HTTP client construction.

use reqwest::Client;

use crate::config::RunConfig;
use crate::error::{LabbookError, Result};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Build the reqwest client shared by discovery and archiving.
pub fn build_client(config: &RunConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(config.timeout)
        .build()
        .map_err(|e| LabbookError::Network(format!("failed to build HTTP client: {e}")))
}
