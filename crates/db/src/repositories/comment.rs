//! Comment repository.
//!
//! Owns the comment aggregate: the comment rows themselves, their mention
//! and reaction rows, and the denormalized counters on parents and posts.

use std::sync::Arc;

use agora_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, IntoCondition};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    TransactionTrait,
};

use crate::entities::{
    comment, comment_reaction, mention, Comment, CommentReaction, Mention,
};
use crate::pagination::{
    encode_cursor, CursorPage, CursorPaginator, PageMeta, PageResult, SortKey, SortOrder,
};
use crate::repositories::PostRepository;
use crate::visibility::visible_to;

/// Flat row produced by the annotation join.
///
/// Listing queries left-join the viewer's own reactions and the mention
/// rows, so one comment arrives once per (reaction × mention) combination.
/// The thread aggregator deduplicates the fan-out.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CommentRow {
    pub id: String,
    pub parent_id: Option<String>,
    pub post_id: String,
    pub content: Option<String>,
    pub total_reply: i32,
    pub edited: bool,
    pub is_hidden: bool,
    pub giphy_id: Option<String>,
    pub media_json: serde_json::Value,
    pub mentions: serde_json::Value,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: sea_orm::entity::prelude::DateTimeWithTimeZone,
    pub updated_at: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>,

    /// Joined owner-reaction (absent for anonymous viewers)
    pub reaction_id: Option<String>,
    pub reaction_name: Option<String>,
    pub reaction_created_at: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>,

    /// Joined mention row
    pub mention_user_id: Option<String>,
}

/// Scope and window for a comment page fetch.
#[derive(Debug, Clone)]
pub struct CommentPageFilter {
    /// Owning post.
    pub post_id: String,
    /// Parent scope; `None` lists root-level comments.
    pub parent_id: Option<String>,
    /// Requesting user, if any.
    pub viewer_id: Option<String>,
    /// Cursor window.
    pub page: CursorPage,
    /// Listing order.
    pub order: SortOrder,
}

/// Window centered on a target comment.
#[derive(Debug, Clone)]
pub struct AroundPage {
    /// Annotated rows; the target is present exactly once.
    pub rows: Vec<CommentRow>,
    /// Combined boundary metadata of both half-windows.
    pub meta: PageMeta,
    /// Position of the target among the distinct comments.
    pub target_index: usize,
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Find a comment by ID under the viewer's visibility predicate.
    pub async fn find_visible_by_id(
        &self,
        id: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find()
            .filter(comment::Column::Id.eq(id))
            .filter(visible_to(viewer_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Cursor-paginated, visibility-filtered window of annotated rows.
    pub async fn get_pagination(
        &self,
        filter: &CommentPageFilter,
    ) -> AppResult<PageResult<CommentRow>> {
        let page = self.page_models(filter).await?;
        let ids: Vec<String> = page.rows.iter().map(|m| m.id.clone()).collect();
        let rows = self
            .find_annotated(&ids, filter.viewer_id.as_deref(), filter.order)
            .await?;

        Ok(PageResult {
            rows,
            meta: page.meta,
        })
    }

    /// Window of annotated rows centered on `target`, in the target's own
    /// scope (same post, same parent level).
    ///
    /// The window size counts the target itself. Half-window queries are
    /// floored at limit 1 to stay well-formed; a row fetched for a
    /// zero-size half is discarded but still proves the window continues
    /// on that side.
    pub async fn get_around(
        &self,
        target: &comment::Model,
        viewer_id: Option<&str>,
        window: u64,
        order: SortOrder,
    ) -> AppResult<AroundPage> {
        let excluding_target = window.max(1) - 1;
        let trailing_count = excluding_target.div_ceil(2);
        let leading_count = excluding_target - trailing_count;

        let cursor = encode_cursor(&SortKey {
            created_at: target.created_at,
        });

        let filter_for = |page: CursorPage| CommentPageFilter {
            post_id: target.post_id.clone(),
            parent_id: target.parent_id.clone(),
            viewer_id: viewer_id.map(ToString::to_string),
            page,
            order,
        };

        // Leading rows precede the target in the requested order,
        // trailing rows follow it.
        let mut leading = self
            .page_models(&filter_for(CursorPage {
                before: Some(cursor.clone()),
                after: None,
                limit: leading_count.max(1),
            }))
            .await?;
        let mut trailing = self
            .page_models(&filter_for(CursorPage {
                before: None,
                after: Some(cursor.clone()),
                limit: trailing_count.max(1),
            }))
            .await?;

        let mut has_next_page = trailing.meta.has_next_page;
        let mut has_previous_page = leading.meta.has_previous_page;
        if trailing_count == 0 {
            has_next_page = !trailing.rows.is_empty();
            trailing.rows.clear();
            trailing.meta.end_cursor = None;
        }
        if leading_count == 0 {
            has_previous_page = !leading.rows.is_empty();
            leading.rows.clear();
            leading.meta.start_cursor = None;
        }

        let target_index = leading.rows.len();

        let mut ids: Vec<String> = leading.rows.iter().map(|m| m.id.clone()).collect();
        ids.push(target.id.clone());
        ids.extend(trailing.rows.iter().map(|m| m.id.clone()));

        let meta = PageMeta {
            start_cursor: leading.meta.start_cursor.or_else(|| Some(cursor.clone())),
            end_cursor: trailing.meta.end_cursor.or_else(|| Some(cursor.clone())),
            has_next_page,
            has_previous_page,
        };

        let rows = self.find_annotated(&ids, viewer_id, order).await?;

        Ok(AroundPage {
            rows,
            meta,
            target_index,
        })
    }

    /// Annotated rows for the direct children of each parent.
    ///
    /// Issues one `child_limit + 1` query per parent so each parent can
    /// compute its own `has_next_page`, then annotates the combined id
    /// set. Children always list newest-first.
    pub async fn get_children_rows(
        &self,
        parent_ids: &[String],
        viewer_id: Option<&str>,
        child_limit: u64,
    ) -> AppResult<Vec<CommentRow>> {
        if parent_ids.is_empty() || child_limit == 0 {
            return Ok(vec![]);
        }

        let mut ids = Vec::new();
        for parent_id in parent_ids {
            let children = Comment::find()
                .filter(comment::Column::ParentId.eq(parent_id))
                .filter(visible_to(viewer_id))
                .order_by_desc(comment::Column::CreatedAt)
                .limit(child_limit + 1)
                .all(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            ids.extend(children.into_iter().map(|c| c.id));
        }

        self.find_annotated(&ids, viewer_id, SortOrder::Desc).await
    }

    /// Insert a comment with its mention rows and maintain the
    /// denormalized counters, all in one transaction.
    pub async fn create(
        &self,
        model: comment::ActiveModel,
        mention_rows: Vec<mention::ActiveModel>,
    ) -> AppResult<comment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !mention_rows.is_empty() {
            Mention::insert_many(mention_rows)
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        PostRepository::increment_comments_count(&txn, &created.post_id, 1).await?;
        if let Some(parent_id) = &created.parent_id {
            Self::increment_total_reply(&txn, parent_id, 1).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(comment_id = %created.id, post_id = %created.post_id, "Created comment");
        Ok(created)
    }

    /// Update a comment row, replacing its mention rows when provided.
    pub async fn update(
        &self,
        model: comment::ActiveModel,
        mention_rows: Option<Vec<mention::ActiveModel>>,
    ) -> AppResult<comment::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(rows) = mention_rows {
            Mention::delete_many()
                .filter(mention::Column::EntityId.eq(updated.id.as_str()))
                .filter(mention::Column::MentionableType.eq(mention::MentionableType::Comment))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if !rows.is_empty() {
                Mention::insert_many(rows)
                    .exec(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Destroy a comment, cascading to its direct children and purging
    /// reactions and mentions for the whole id set, in one transaction.
    ///
    /// Children go first so the counters only ever reflect surviving
    /// rows, then the annotation purge, then the target row itself.
    /// Returns the number of comment rows removed.
    pub async fn destroy(&self, target: &comment::Model) -> AppResult<u64> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let child_ids: Vec<String> = Comment::find()
            .filter(comment::Column::ParentId.eq(target.id.as_str()))
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|c| c.id)
            .collect();

        if !child_ids.is_empty() {
            let removed = Comment::delete_many()
                .filter(comment::Column::ParentId.eq(target.id.as_str()))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .rows_affected;
            PostRepository::decrement_comments_count(&txn, &target.post_id, removed as i32).await?;
        }

        let mut purge_ids = child_ids.clone();
        purge_ids.push(target.id.clone());

        CommentReaction::delete_many()
            .filter(comment_reaction::Column::CommentId.is_in(purge_ids.clone()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Mention::delete_many()
            .filter(mention::Column::EntityId.is_in(purge_ids))
            .filter(mention::Column::MentionableType.eq(mention::MentionableType::Comment))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Comment::delete_by_id(target.id.as_str())
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        PostRepository::decrement_comments_count(&txn, &target.post_id, 1).await?;
        if let Some(parent_id) = &target.parent_id {
            Self::decrement_total_reply(&txn, parent_id, 1).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let removed = child_ids.len() as u64 + 1;
        tracing::debug!(comment_id = %target.id, removed, "Destroyed comment");
        Ok(removed)
    }

    /// Increment a parent's direct-reply count atomically (single UPDATE
    /// expression, no fetch).
    pub async fn increment_total_reply<C: ConnectionTrait>(
        conn: &C,
        comment_id: &str,
        by: i32,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::TotalReply,
                Expr::col(comment::Column::TotalReply).add(by),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement a parent's direct-reply count atomically, clamped at zero.
    pub async fn decrement_total_reply<C: ConnectionTrait>(
        conn: &C,
        comment_id: &str,
        by: i32,
    ) -> AppResult<()> {
        Comment::update_many()
            .col_expr(
                comment::Column::TotalReply,
                Expr::cust_with_values("GREATEST(total_reply - ?, 0)", [by]),
            )
            .filter(comment::Column::Id.eq(comment_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Page of bare models inside the scope; annotation happens separately.
    async fn page_models(
        &self,
        filter: &CommentPageFilter,
    ) -> AppResult<PageResult<comment::Model>> {
        let select = Comment::find().filter(Self::scope_condition(filter));

        CursorPaginator::new(filter.page.clone(), filter.order)
            .paginate(select, self.db.as_ref())
            .await
    }

    fn scope_condition(filter: &CommentPageFilter) -> Condition {
        let scoped = Condition::all().add(comment::Column::PostId.eq(filter.post_id.as_str()));
        let scoped = match &filter.parent_id {
            Some(parent_id) => scoped.add(comment::Column::ParentId.eq(parent_id.as_str())),
            None => scoped.add(comment::Column::ParentId.is_null()),
        };

        scoped.add(visible_to(filter.viewer_id.as_deref()))
    }

    /// Fetch the given comments with owner-reaction and mention fan-out.
    pub async fn find_annotated(
        &self,
        ids: &[String],
        viewer_id: Option<&str>,
        order: SortOrder,
    ) -> AppResult<Vec<CommentRow>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let viewer = viewer_id.map(ToString::to_string);
        let select = Comment::find()
            .filter(comment::Column::Id.is_in(ids.to_vec()))
            .join(
                JoinType::LeftJoin,
                comment::Relation::Reactions
                    .def()
                    .on_condition(move |_left, right| match viewer.clone() {
                        Some(uid) => Expr::col((right, comment_reaction::Column::CreatedBy))
                            .eq(uid)
                            .into_condition(),
                        // Anonymous viewers own no reactions; `created_by`
                        // is non-null so this never matches.
                        None => Expr::col((right, comment_reaction::Column::CreatedBy))
                            .is_null()
                            .into_condition(),
                    }),
            )
            .join(
                JoinType::LeftJoin,
                comment::Relation::Mentions
                    .def()
                    .on_condition(|_left, right| {
                        Expr::col((right, mention::Column::MentionableType))
                            .eq(mention::MentionableType::Comment)
                            .into_condition()
                    }),
            )
            .column_as(comment_reaction::Column::Id, "reaction_id")
            .column_as(comment_reaction::Column::ReactionName, "reaction_name")
            .column_as(comment_reaction::Column::CreatedAt, "reaction_created_at")
            .column_as(mention::Column::UserId, "mention_user_id")
            .order_by(comment::Column::CreatedAt, order.into_query_order());

        select
            .into_model::<CommentRow>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
