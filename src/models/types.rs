//! Type definitions for the Ollama model directory
//!
//! Wire shapes of `/api/tags` and `/api/show`, and the caller-facing
//! summaries built from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for metadata the server did not report
pub const UNKNOWN: &str = "Unknown";

/// One entry of a model listing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model name (e.g., "llama3.1:8b")
    pub name: String,
}

/// Metadata for a single model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Name as requested by the caller
    pub name: String,

    /// Model format (e.g., "gguf")
    pub format: String,

    /// Parameter size (e.g., "7B")
    pub parameter_size: String,

    /// Model families (e.g., ["llama"])
    pub supported_families: Vec<String>,
}

/// Response from Ollama /api/tags endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TagsResponse {
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagEntry {
    #[serde(default)]
    pub name: Option<String>,
}

/// Response from Ollama /api/show endpoint
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShowResponse {
    #[serde(default)]
    pub details: Option<ShowDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ShowDetails {
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub parameter_size: Option<String>,

    #[serde(default)]
    pub families: Option<Vec<String>>,
}

impl ModelInfo {
    /// Build from a show response; `name` always comes from the caller
    pub(crate) fn from_show(name: &str, show: ShowResponse) -> Self {
        let details = show.details.unwrap_or_default();
        let or_unknown = |field: Option<String>| {
            field
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string())
        };

        Self {
            name: name.to_string(),
            format: or_unknown(details.format),
            parameter_size: or_unknown(details.parameter_size),
            supported_families: details.families.unwrap_or_default(),
        }
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.format, self.parameter_size)?;
        if !self.supported_families.is_empty() {
            write!(f, " [{}]", self.supported_families.join(", "))?;
        }
        Ok(())
    }
}
