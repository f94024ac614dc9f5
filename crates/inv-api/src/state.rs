//! Shared handler state.

use std::sync::Arc;

use inv_attachments::AttachmentStore;
use inv_registry::Registry;
use inv_service::{ItemService, SearchService};

#[derive(Clone)]
pub struct AppState {
    pub items: ItemService,
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(registry: Arc<dyn Registry>, store: Arc<dyn AttachmentStore>) -> Self {
        Self {
            items: ItemService::new(registry.clone(), store),
            search: Arc::new(SearchService::new(registry)),
        }
    }
}
