use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::RemoteSettings;
use crate::metrics::Snapshot;

/// Best-effort HTTP writer for per-second snapshot payloads.
///
/// No request timeout is set; a slow send only delays the retry queue,
/// never the run itself.
pub struct RemoteSink {
    client: Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl RemoteSink {
    pub fn new(endpoint: String, bearer_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            bearer_token,
        }
    }

    pub fn from_settings(settings: &RemoteSettings) -> Self {
        Self::new(settings.endpoint.clone(), settings.bearer_token.clone())
    }

    pub async fn post(&self, snapshot: &Snapshot) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(snapshot);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("snapshot POST to {} failed", self.endpoint))?;

        response
            .error_for_status()
            .with_context(|| format!("snapshot POST to {} rejected", self.endpoint))?;
        Ok(())
    }
}
