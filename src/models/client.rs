//! Model directory client
//!
//! Read-only access to the models installed on the server. Neither
//! operation surfaces transport problems to the caller: a failed listing is
//! empty and a failed lookup is `None`, with the anomaly logged.

use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::types::{ModelInfo, ModelSummary, ShowResponse, TagsResponse};
use crate::streaming::OllamaClient;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Lists models and fetches their metadata
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    client: OllamaClient,
}

impl ModelDirectory {
    /// Create a directory client against `config.host`. Each request is
    /// bounded by the configured call deadline.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = OllamaClient::with_base_url(&config.host)?
            .with_request_timeout(Duration::from_millis(config.deadline_ms));
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: OllamaClient) -> Self {
        Self { client }
    }

    /// List installed models
    ///
    /// Calls GET /api/tags. Names are deduplicated, keeping server order.
    pub async fn list_models(&self) -> Vec<ModelSummary> {
        let response = match self.client.get_json("/api/tags").await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                return Vec::new();
            }
        };

        let tags: TagsResponse = match serde_json::from_value(response.clone()) {
            Ok(tags) => tags,
            Err(_) => {
                warn!("Unexpected response structure from /api/tags: {}", response);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let models: Vec<ModelSummary> = tags
            .models
            .into_iter()
            .filter_map(|entry| entry.name)
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .map(|name| ModelSummary { name })
            .collect();

        debug!(count = models.len(), "Listed models");
        models
    }

    /// Names of installed models
    pub async fn list_model_names(&self) -> Vec<String> {
        self.list_models()
            .await
            .into_iter()
            .map(|model| model.name)
            .collect()
    }

    /// Get metadata for one model
    ///
    /// Calls POST /api/show. Fails only for an empty name; an unreachable
    /// server, unknown model or empty reply yields `Ok(None)`.
    pub async fn get_model_info(&self, name: &str) -> Result<Option<ModelInfo>> {
        if name.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "model name is required".to_string(),
            ));
        }

        let response = match self.client.post_json("/api/show", &json!({ "model": name })).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to retrieve model info for {}: {}", name, e);
                return Ok(None);
            }
        };

        if is_empty_payload(&response) {
            warn!("Failed to retrieve model info for {}: API returned empty response", name);
            return Ok(None);
        }

        // Unexpected shapes inside `details` degrade to defaults
        let show: ShowResponse = serde_json::from_value(response).unwrap_or_default();
        Ok(Some(ModelInfo::from_show(name, show)))
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
