use std::sync::Arc;

use crate::services::FeedController;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<FeedController>,
}

impl AppState {
    pub fn new(controller: FeedController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}
