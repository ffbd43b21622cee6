//! One hub per socket endpoint path

use crate::config::HubConfig;
use crate::hub::Hub;
use dashmap::DashMap;
use std::sync::Arc;

/// Maps endpoint paths to their hubs
///
/// Owned by the server instance and passed to whatever needs it; there is no
/// process-wide registry.
#[derive(Debug)]
pub struct HubRegistry {
    hubs: DashMap<String, Arc<Hub>>,
    config: HubConfig,
}

impl HubRegistry {
    /// Create a registry whose hubs use default settings
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a registry whose hubs share `config`
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            hubs: DashMap::new(),
            config,
        }
    }

    /// Get the hub for `path`, creating it on first use
    pub fn hub(&self, path: &str) -> Arc<Hub> {
        let entry = self.hubs.entry(path.to_string()).or_insert_with(|| {
            tracing::debug!(endpoint = %path, "hub created");
            Arc::new(Hub::with_config(path, self.config.clone()))
        });
        Arc::clone(&*entry)
    }

    /// Get the hub for `path` if one exists
    pub fn get(&self, path: &str) -> Option<Arc<Hub>> {
        self.hubs.get(path).map(|r| Arc::clone(r.value()))
    }

    /// Remove the hub for `path`
    pub fn remove(&self, path: &str) -> Option<Arc<Hub>> {
        self.hubs.remove(path).map(|(_, hub)| hub)
    }

    /// Registered endpoint paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.hubs.iter().map(|r| r.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Live connections across every hub
    pub fn total_connections(&self) -> usize {
        self.hubs.iter().map(|r| r.value().count()).sum()
    }
}

impl Default for HubRegistry {
    fn default() -> Self {
        Self::new()
    }
}
