//! Mention audience validation seam.

use std::sync::Arc;

use agora_common::AppResult;
use async_trait::async_trait;

/// Trait for validating that mentioned users belong to the audience.
#[async_trait]
pub trait MentionPolicy: Send + Sync {
    /// Check every mentioned user against the post's audience groups.
    ///
    /// Implementations return `AppError::Validation` when a mentioned
    /// user cannot see content in any of the groups.
    async fn check_valid(
        &self,
        audience_group_ids: &[String],
        mentioned_user_ids: &[String],
    ) -> AppResult<()>;
}

/// Permissive implementation for tests.
#[derive(Clone, Default)]
pub struct AllowAllMentions;

#[async_trait]
impl MentionPolicy for AllowAllMentions {
    async fn check_valid(
        &self,
        _audience_group_ids: &[String],
        _mentioned_user_ids: &[String],
    ) -> AppResult<()> {
        Ok(())
    }
}

/// Shared mention policy handle.
pub type MentionPolicyService = Arc<dyn MentionPolicy>;
