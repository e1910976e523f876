//! Giphy reference resolution seam.

use std::sync::Arc;

/// Trait for rendering a stored giphy reference into a media URL.
pub trait GiphyStore: Send + Sync {
    /// Render the public URL for a giphy id.
    fn render_url(&self, giphy_id: &str) -> String;
}

/// Resolver using the public giphy CDN scheme.
#[derive(Clone, Default)]
pub struct CdnGiphyStore;

impl GiphyStore for CdnGiphyStore {
    fn render_url(&self, giphy_id: &str) -> String {
        format!("https://i.giphy.com/{giphy_id}")
    }
}

/// Shared giphy store handle.
pub type GiphyStoreService = Arc<dyn GiphyStore>;
