//! Application state management

use std::sync::Arc;

use crate::{config::Config, repository::RecordStore, resource::ResourceEngine};

/// State shared by the service-level routes
///
/// Holds the configuration and every mounted resource engine, so probes can
/// reach each resource's store.
pub struct AppState<S> {
    config: Arc<Config>,
    resources: Arc<Vec<ResourceEngine<S>>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            resources: Arc::clone(&self.resources),
        }
    }
}

impl<S: RecordStore> AppState<S> {
    pub fn new(config: Config, resources: Vec<ResourceEngine<S>>) -> Self {
        Self {
            config: Arc::new(config),
            resources: Arc::new(resources),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resources(&self) -> &[ResourceEngine<S>] {
        &self.resources
    }

    /// Engine serving the given slug
    pub fn resource(&self, slug: &str) -> Option<&ResourceEngine<S>> {
        self.resources.iter().find(|r| r.descriptor().slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::repository::MemoryRecordStore;

    #[test]
    fn test_resource_lookup() {
        let state = AppState::new(
            Config::default(),
            vec![
                ResourceEngine::new(catalog::item_units(), MemoryRecordStore::new()),
                ResourceEngine::new(catalog::purchase_types(), MemoryRecordStore::new()),
            ],
        );
        let cloned = state.clone();
        assert_eq!(cloned.resources().len(), 2);
        assert!(cloned.resource("purchase-types").is_some());
        assert!(cloned.resource("vendors").is_none());
        assert_eq!(cloned.config().service.port, 8080);
    }
}
