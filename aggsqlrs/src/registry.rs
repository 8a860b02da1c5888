use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::glob;
use serde::{Deserialize, Serialize};

use crate::error::{AggsqlError, Result};
use crate::models::AggregateRequest;

/// An aggregate request stored on disk under a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub request: AggregateRequest,
}

#[derive(Debug, Default, Clone)]
pub struct RequestRegistry {
    pub requests: HashMap<String, NamedRequest>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(requests: Vec<NamedRequest>) -> Self {
        let mut registry = RequestRegistry::new();
        for request in requests {
            registry.requests.insert(request.name.clone(), request);
        }
        registry
    }

    /// Load every `*.yml`, `*.yaml` and `*.json` file in `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(AggsqlError::InvalidRequest(format!(
                "requests directory not found: {}",
                dir.display()
            )));
        }

        let mut registry = RequestRegistry::new();
        for pattern in ["*.yml", "*.yaml", "*.json"] {
            for entry in glob(&format!("{}/{pattern}", dir.display()))
                .map_err(|e| AggsqlError::Other(e.into()))?
                .flatten()
            {
                registry.load_file(&entry)?;
            }
        }
        tracing::info!(dir = %dir.display(), requests = registry.requests.len(), "loaded aggregate requests");
        Ok(registry)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        let named: NamedRequest = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        tracing::debug!(name = %named.name, path = %path.display(), "loaded request file");
        if let Some(previous) = self.requests.insert(named.name.clone(), named) {
            return Err(AggsqlError::InvalidRequest(format!(
                "request '{}' is defined more than once (again in {})",
                previous.name,
                path.display()
            )));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AggregateRequest> {
        self.requests.get(name).map(|n| &n.request)
    }

    /// Request names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.requests.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
