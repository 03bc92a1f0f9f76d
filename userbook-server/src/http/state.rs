//! Application state shared across handlers

use std::sync::Arc;

use crate::db::UserStore;

/// Shared application state.
///
/// Built once at startup; handlers get a cheap clone holding the same store
/// (and with it the same connection pool).
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(store: impl UserStore + 'static) -> Self {
        Self::from_shared(Arc::new(store))
    }

    pub fn from_shared(store: Arc<dyn UserStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    pub fn store(&self) -> &dyn UserStore {
        self.inner.store.as_ref()
    }
}
