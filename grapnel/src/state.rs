use grapnel_core::cache::ReflectionCache;
use std::sync::Arc;

/// Process-wide state shared across request handlers.
///
/// The reflection cache is the only cross-request mutable state in the backend; it is
/// constructed once here and cloned by reference into every handler.
#[derive(Clone, Default)]
pub struct AppState {
    pub cache: Arc<ReflectionCache>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
