//! Post repository.
//!
//! The comment engine touches posts in two ways: lookups for access and
//! comment-gate checks, and atomic maintenance of the denormalized
//! `comments_count`.

use std::sync::Arc;

use agora_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::entities::{post, Post};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Increment a post's comment count atomically (single UPDATE
    /// expression, no fetch). Runs on the caller's connection so it can
    /// join the comment write transaction.
    pub async fn increment_comments_count<C: ConnectionTrait>(
        conn: &C,
        post_id: &str,
        by: i32,
    ) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::CommentsCount,
                Expr::col(post::Column::CommentsCount).add(by),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement a post's comment count atomically, clamped at zero.
    pub async fn decrement_comments_count<C: ConnectionTrait>(
        conn: &C,
        post_id: &str,
        by: i32,
    ) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::CommentsCount,
                Expr::cust_with_values("GREATEST(comments_count - ?, 0)", [by]),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
