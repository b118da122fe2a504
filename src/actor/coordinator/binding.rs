use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Currently bound surface uid. Unbound blocks dispatch.
///
/// Written by `bind` (normally once per surface, before the watcher
/// starts) and read before every send.
#[derive(Debug, Default)]
pub struct SurfaceBinding {
    uid: ArcSwapOption<String>,
}

impl SurfaceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `uid`, returning the previous binding if any.
    pub fn bind(&self, uid: impl Into<String>) -> Option<Arc<String>> {
        self.uid.swap(Some(Arc::new(uid.into())))
    }

    pub fn current(&self) -> Option<Arc<String>> {
        self.uid.load_full()
    }

    pub fn is_bound(&self) -> bool {
        self.uid.load().is_some()
    }
}
