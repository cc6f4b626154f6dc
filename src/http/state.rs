//! Shared state handed to every Axum handler.

use crate::facade::RuntimeFacade;
use std::sync::Arc;

/// State cloned into every handler. Cheap to clone: everything of
/// substance lives behind the facade's own internal locking.
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<RuntimeFacade>,
    /// Shared token expected in `X-API-Key`. Empty disables the check.
    pub api_key: Arc<String>,
}

impl AppState {
    #[must_use]
    pub fn new(facade: RuntimeFacade, api_key: String) -> Self {
        Self {
            facade: Arc::new(facade),
            api_key: Arc::new(api_key),
        }
    }
}
