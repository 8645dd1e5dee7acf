use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ClientBuildError;

pub(crate) fn build_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<Client, ClientBuildError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .user_agent(user_agent)
        .build()?)
}

/// Ensure the base URL ends with exactly one slash so `join` appends to it
/// rather than replacing the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ClientBuildError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ClientBuildError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}
