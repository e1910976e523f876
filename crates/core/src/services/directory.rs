//! User directory seam.

use std::sync::Arc;

use agora_common::AppResult;
use async_trait::async_trait;
use serde::Serialize;

/// Resolved actor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

/// Trait for batch profile resolution.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve profiles for the given user ids; unknown ids are omitted.
    async fn find_all_by_ids(&self, ids: &[String]) -> AppResult<Vec<UserProfile>>;
}

/// Directory stub that resolves nobody.
#[derive(Clone, Default)]
pub struct NoOpDirectory;

#[async_trait]
impl UserDirectory for NoOpDirectory {
    async fn find_all_by_ids(&self, _ids: &[String]) -> AppResult<Vec<UserProfile>> {
        Ok(vec![])
    }
}

/// Shared directory handle.
pub type UserDirectoryService = Arc<dyn UserDirectory>;
