//! Post access authority seam.
//!
//! Group membership and privacy computation live in another service; the
//! comment engine only consumes its verdict.

use std::sync::Arc;

use agora_common::AppResult;
use agora_db::entities::post;
use async_trait::async_trait;

/// Trait for post read-access decisions.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Check that the viewer may read the post; `None` is anonymous.
    ///
    /// Implementations return `AppError::Forbidden` to deny access.
    async fn can_read_post(&self, viewer_id: Option<&str>, post: &post::Model) -> AppResult<()>;
}

/// Permissive implementation for tests and single-audience deployments.
#[derive(Clone, Default)]
pub struct AllowAllAuthority;

#[async_trait]
impl Authority for AllowAllAuthority {
    async fn can_read_post(&self, _viewer_id: Option<&str>, _post: &post::Model) -> AppResult<()> {
        Ok(())
    }
}

/// Shared authority handle.
pub type AuthorityService = Arc<dyn Authority>;
