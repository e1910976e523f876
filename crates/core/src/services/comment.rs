//! Comment service.
//!
//! Exposes the threaded-comment operations: flat and around-id listings,
//! single fetch, create/reply, edit, and cascading destroy. Retrieval
//! paths share one visibility predicate and one cursor scheme; write
//! paths keep the denormalized counters consistent transactionally.

use std::collections::HashMap;
use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::entities::report_content_detail::TargetType;
use agora_db::entities::{comment, mention};
use agora_db::pagination::{CursorPage, PageMeta, SortOrder};
use agora_db::repositories::{
    CommentPageFilter, CommentRepository, CommentRow, PostRepository, ReportRepository,
};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::ActiveValue::Set;
use sea_orm::IntoActiveModel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use super::authority::{AllowAllAuthority, AuthorityService};
use super::directory::{NoOpDirectory, UserDirectoryService, UserProfile};
use super::giphy::{CdnGiphyStore, GiphyStore, GiphyStoreService};
use super::mention_policy::{AllowAllMentions, MentionPolicyService};
use super::thread;

/// A page of items plus boundary metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in the requested order.
    pub list: Vec<T>,
    /// Boundary metadata.
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Empty page with terminal metadata.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            list: Vec::new(),
            meta: PageMeta::default(),
        }
    }
}

/// An attached file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// An attached image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// An attached video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVideo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Media attachments grouped by kind; the shape stored in `media_json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaCollection {
    #[serde(default)]
    pub files: Vec<MediaFile>,
    #[serde(default)]
    pub images: Vec<MediaImage>,
    #[serde(default)]
    pub videos: Vec<MediaVideo>,
}

impl MediaCollection {
    /// Whether no media of any kind is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.images.is_empty() && self.videos.is_empty()
    }
}

/// One of the requesting user's own reactions on a comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReaction {
    pub id: String,
    pub reaction_name: String,
    pub created_at: Option<DateTimeWithTimeZone>,
}

/// One comment shaped for consumers: deduplicated annotations, resolved
/// actor, and an optional nested page of direct replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDetail {
    pub id: String,
    pub parent_id: Option<String>,
    pub post_id: String,
    pub content: Option<String>,
    pub giphy_id: Option<String>,
    pub giphy_url: Option<String>,
    pub media: MediaCollection,
    pub mentioned_user_ids: Vec<String>,
    pub total_reply: i32,
    pub edited: bool,
    pub owner_reactions: Vec<OwnerReaction>,
    pub actor: Option<UserProfile>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// Direct replies, present on root-level comments when requested.
    pub child: Option<Page<CommentDetail>>,
}

impl CommentDetail {
    /// Seed a detail object from the comment columns of a join row.
    /// Annotations accumulate as further fan-out rows fold in.
    pub(crate) fn from_row(row: &CommentRow, giphy: &dyn GiphyStore) -> Self {
        Self {
            id: row.id.clone(),
            parent_id: row.parent_id.clone(),
            post_id: row.post_id.clone(),
            content: row.content.clone(),
            giphy_id: row.giphy_id.clone(),
            giphy_url: row.giphy_id.as_deref().map(|id| giphy.render_url(id)),
            media: serde_json::from_value(row.media_json.clone()).unwrap_or_default(),
            mentioned_user_ids: Vec::new(),
            total_reply: row.total_reply,
            edited: row.edited,
            owner_reactions: Vec::new(),
            actor: None,
            created_by: row.created_by.clone(),
            updated_by: row.updated_by.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            child: None,
        }
    }
}

fn default_limit() -> u64 {
    10
}

fn default_child_limit() -> u64 {
    10
}

/// Input for listing comments (flat or children-of).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetCommentsInput {
    /// Post to list under.
    pub post_id: String,

    /// Parent comment; `None` lists root-level comments.
    pub parent_id: Option<String>,

    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u64,

    #[serde(default)]
    pub order: SortOrder,

    pub before: Option<String>,
    pub after: Option<String>,

    /// Replies bound under each root comment; 0 skips child binding.
    #[serde(default = "default_child_limit")]
    pub child_limit: u64,
}

/// Input for the around-id listing.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GetAroundInput {
    /// Total window size, target included.
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u64,

    /// Window size for the target's reply scope.
    #[serde(default = "default_child_limit")]
    pub target_child_limit: u64,
}

/// Input for creating a comment or a reply.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub post_id: String,

    /// Root comment being replied to, if any.
    pub parent_id: Option<String>,

    #[validate(length(max = 5000))]
    pub content: Option<String>,

    #[serde(default)]
    pub media: MediaCollection,

    /// Mentioned user IDs.
    #[serde(default)]
    pub mentions: Vec<String>,

    pub giphy_id: Option<String>,
}

/// Input for editing a comment. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    #[validate(length(max = 5000))]
    pub content: Option<String>,

    pub media: Option<MediaCollection>,

    /// Replacement mention list.
    pub mentions: Option<Vec<String>>,

    /// `Some(None)` clears the giphy reference.
    pub giphy_id: Option<Option<String>>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    report_repo: ReportRepository,
    authority: AuthorityService,
    directory: UserDirectoryService,
    mention_policy: MentionPolicyService,
    giphy: GiphyStoreService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service with permissive collaborator stubs.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            report_repo,
            authority: Arc::new(AllowAllAuthority),
            directory: Arc::new(NoOpDirectory),
            mention_policy: Arc::new(AllowAllMentions),
            giphy: Arc::new(CdnGiphyStore),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the authority collaborator.
    pub fn set_authority(&mut self, authority: AuthorityService) {
        self.authority = authority;
    }

    /// Set the user directory collaborator.
    pub fn set_directory(&mut self, directory: UserDirectoryService) {
        self.directory = directory;
    }

    /// Set the mention policy collaborator.
    pub fn set_mention_policy(&mut self, mention_policy: MentionPolicyService) {
        self.mention_policy = mention_policy;
    }

    /// Set the giphy store collaborator.
    pub fn set_giphy(&mut self, giphy: GiphyStoreService) {
        self.giphy = giphy;
    }

    /// List comments under a post, either root-level or under one parent.
    ///
    /// Root-level listings additionally bind a page of direct replies
    /// under each returned comment when `child_limit > 0`.
    pub async fn get_list(
        &self,
        viewer_id: Option<&str>,
        input: GetCommentsInput,
    ) -> AppResult<Page<CommentDetail>> {
        input.validate()?;

        // A post the viewer reported is gone from their point of view.
        if let Some(viewer) = viewer_id {
            let reported = self
                .report_repo
                .reported_target_ids(viewer, &[TargetType::Post, TargetType::Article])
                .await?;
            if reported.contains(&input.post_id) {
                return Ok(Page::empty());
            }
        }

        let post = self.post_repo.get_by_id(&input.post_id).await?;
        self.authority.can_read_post(viewer_id, &post).await?;
        if !post.can_comment {
            return Ok(Page::empty());
        }

        if let Some(parent_id) = &input.parent_id {
            self.comment_repo
                .find_visible_by_id(parent_id, viewer_id)
                .await?
                .ok_or_else(|| AppError::CommentNotFound(parent_id.clone()))?;
        }

        let filter = CommentPageFilter {
            post_id: input.post_id.clone(),
            parent_id: input.parent_id.clone(),
            viewer_id: viewer_id.map(ToString::to_string),
            page: CursorPage {
                before: input.before.clone(),
                after: input.after.clone(),
                limit: input.limit,
            },
            order: input.order,
        };
        let page = self.comment_repo.get_pagination(&filter).await?;
        let mut list = thread::fold_rows(&page.rows, self.giphy.as_ref());

        if input.parent_id.is_none() && input.child_limit > 0 && !list.is_empty() {
            let parent_ids: Vec<String> = list.iter().map(|c| c.id.clone()).collect();
            let child_rows = self
                .comment_repo
                .get_children_rows(&parent_ids, viewer_id, input.child_limit)
                .await?;
            thread::attach_children(&mut list, &child_rows, input.child_limit, self.giphy.as_ref());
        }

        self.bind_actors(&mut list).await?;

        Ok(Page {
            list,
            meta: page.meta,
        })
    }

    /// Window of comments centered on a target, the target included
    /// exactly once.
    ///
    /// A root target is centered among the post's root comments and gets
    /// a page of its replies attached. A reply target is centered among
    /// its siblings, and that window is nested under the parent, which is
    /// in turn centered among the root comments.
    pub async fn get_around_id(
        &self,
        viewer_id: Option<&str>,
        comment_id: &str,
        input: GetAroundInput,
    ) -> AppResult<Page<CommentDetail>> {
        input.validate()?;

        let target = self
            .comment_repo
            .find_visible_by_id(comment_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        let post = self.post_repo.get_by_id(&target.post_id).await?;
        self.authority.can_read_post(viewer_id, &post).await?;

        let Some(parent_id) = target.parent_id.clone() else {
            let around = self
                .comment_repo
                .get_around(&target, viewer_id, input.limit, SortOrder::Desc)
                .await?;
            let mut list = thread::fold_rows(&around.rows, self.giphy.as_ref());

            if input.target_child_limit > 0 {
                let child_rows = self
                    .comment_repo
                    .get_children_rows(
                        std::slice::from_ref(&target.id),
                        viewer_id,
                        input.target_child_limit,
                    )
                    .await?;
                let mut groups =
                    thread::group_children(&child_rows, input.target_child_limit, self.giphy.as_ref());
                if let Some(entry) = list.iter_mut().find(|c| c.id == target.id) {
                    entry.child = Some(groups.remove(&target.id).unwrap_or_else(Page::empty));
                }
            }

            self.bind_actors(&mut list).await?;
            return Ok(Page {
                list,
                meta: around.meta,
            });
        };

        // Reply target: center it among its siblings, then center the
        // parent at root level and nest the sibling window under it.
        let parent = self
            .comment_repo
            .find_visible_by_id(&parent_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(parent_id.clone()))?;

        let around_target = self
            .comment_repo
            .get_around(&target, viewer_id, input.target_child_limit, SortOrder::Desc)
            .await?;
        let child_page = Page {
            list: thread::fold_rows(&around_target.rows, self.giphy.as_ref()),
            meta: around_target.meta,
        };

        let around_parent = self
            .comment_repo
            .get_around(&parent, viewer_id, input.limit, SortOrder::Desc)
            .await?;
        let mut list = thread::fold_rows(&around_parent.rows, self.giphy.as_ref());
        if let Some(entry) = list.iter_mut().find(|c| c.id == parent.id) {
            entry.child = Some(child_page);
        }
        self.bind_actors(&mut list).await?;

        Ok(Page {
            list,
            meta: around_parent.meta,
        })
    }

    /// Fetch a single visible comment with annotations and, for root
    /// comments, an optional page of direct replies.
    pub async fn get_comment(
        &self,
        viewer_id: Option<&str>,
        comment_id: &str,
        child_limit: u64,
    ) -> AppResult<CommentDetail> {
        let model = self
            .comment_repo
            .find_visible_by_id(comment_id, viewer_id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        let rows = self
            .comment_repo
            .find_annotated(std::slice::from_ref(&model.id), viewer_id, SortOrder::Desc)
            .await?;
        let mut list = thread::fold_rows(&rows, self.giphy.as_ref());
        let mut detail = list
            .pop()
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))?;

        if child_limit > 0 && detail.parent_id.is_none() {
            let child_rows = self
                .comment_repo
                .get_children_rows(std::slice::from_ref(&model.id), viewer_id, child_limit)
                .await?;
            let mut groups = thread::group_children(&child_rows, child_limit, self.giphy.as_ref());
            detail.child = Some(groups.remove(&model.id).unwrap_or_else(Page::empty));
        }

        let mut singleton = [detail];
        self.bind_actors(&mut singleton).await?;
        let [detail] = singleton;

        Ok(detail)
    }

    /// Create a comment, or a reply when `parent_id` is given.
    ///
    /// The comment row, its mention rows, and both counter increments
    /// commit in one transaction.
    pub async fn create(
        &self,
        actor_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<CommentDetail> {
        input.validate()?;

        if input.content.as_deref().unwrap_or("").trim().is_empty()
            && input.media.is_empty()
            && input.giphy_id.is_none()
        {
            return Err(AppError::Validation(
                "a comment needs content, media, or a giphy".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(&input.post_id).await?;
        self.authority.can_read_post(Some(actor_id), &post).await?;
        if !post.can_comment {
            return Err(AppError::Forbidden(
                "commenting is disabled for this post".to_string(),
            ));
        }

        if let Some(parent_id) = &input.parent_id {
            let parent = self
                .comment_repo
                .find_visible_by_id(parent_id, Some(actor_id))
                .await?
                .ok_or_else(|| AppError::CommentNotFound(parent_id.clone()))?;
            if parent.post_id != input.post_id {
                return Err(AppError::BadRequest(
                    "parent comment belongs to another post".to_string(),
                ));
            }
            if parent.parent_id.is_some() {
                return Err(AppError::Validation(
                    "replies can only target root-level comments".to_string(),
                ));
            }
        }

        if !input.mentions.is_empty() {
            let audience: Vec<String> =
                serde_json::from_value(post.group_ids.clone()).unwrap_or_default();
            self.mention_policy
                .check_valid(&audience, &input.mentions)
                .await?;
        }

        let comment_id = self.id_gen.generate();
        let model = comment::ActiveModel {
            id: Set(comment_id.clone()),
            parent_id: Set(input.parent_id.clone()),
            post_id: Set(input.post_id.clone()),
            content: Set(input.content.clone()),
            giphy_id: Set(input.giphy_id.clone()),
            media_json: Set(json!(input.media)),
            mentions: Set(json!(input.mentions)),
            created_by: Set(actor_id.to_string()),
            ..Default::default()
        };
        let mention_rows = self.mention_rows_for(&comment_id, &input.mentions);

        let created = self.comment_repo.create(model, mention_rows).await?;

        self.get_comment(Some(actor_id), &created.id, 0).await
    }

    /// Edit a comment. Only the author may edit; mention rows are
    /// replaced transactionally when a new mention list is supplied.
    pub async fn update(
        &self,
        actor_id: &str,
        comment_id: &str,
        input: UpdateCommentInput,
    ) -> AppResult<CommentDetail> {
        input.validate()?;

        let existing = self.comment_repo.get_by_id(comment_id).await?;
        if existing.created_by != actor_id {
            return Err(AppError::Forbidden(
                "only the author can edit a comment".to_string(),
            ));
        }

        let post = self.post_repo.get_by_id(&existing.post_id).await?;
        self.authority.can_read_post(Some(actor_id), &post).await?;

        // The edit must not leave the comment empty.
        let next_content = input.content.clone().or_else(|| existing.content.clone());
        let next_media: MediaCollection = input.media.clone().unwrap_or_else(|| {
            serde_json::from_value(existing.media_json.clone()).unwrap_or_default()
        });
        let next_giphy = match &input.giphy_id {
            Some(value) => value.clone(),
            None => existing.giphy_id.clone(),
        };
        if next_content.as_deref().unwrap_or("").trim().is_empty()
            && next_media.is_empty()
            && next_giphy.is_none()
        {
            return Err(AppError::Validation(
                "a comment needs content, media, or a giphy".to_string(),
            ));
        }

        if let Some(mentions) = &input.mentions {
            if !mentions.is_empty() {
                let audience: Vec<String> =
                    serde_json::from_value(post.group_ids.clone()).unwrap_or_default();
                self.mention_policy.check_valid(&audience, mentions).await?;
            }
        }

        let mut model = existing.clone().into_active_model();
        if let Some(content) = input.content {
            model.content = Set(Some(content));
            model.edited = Set(true);
        }
        if let Some(media) = input.media {
            model.media_json = Set(json!(media));
        }
        if let Some(giphy_id) = input.giphy_id {
            model.giphy_id = Set(giphy_id);
        }
        if let Some(mentions) = &input.mentions {
            model.mentions = Set(json!(mentions));
        }
        model.updated_by = Set(Some(actor_id.to_string()));
        model.updated_at = Set(Some(chrono::Utc::now().into()));

        let mention_rows = input
            .mentions
            .as_ref()
            .map(|ids| self.mention_rows_for(comment_id, ids));

        let updated = self.comment_repo.update(model, mention_rows).await?;

        self.get_comment(Some(actor_id), &updated.id, 0).await
    }

    /// Destroy a comment and its direct replies. Only the author may
    /// delete. Returns the destroyed comment snapshot.
    pub async fn destroy(&self, actor_id: &str, comment_id: &str) -> AppResult<comment::Model> {
        let existing = self.comment_repo.get_by_id(comment_id).await?;
        if existing.created_by != actor_id {
            return Err(AppError::Forbidden(
                "only the author can delete a comment".to_string(),
            ));
        }

        self.comment_repo.destroy(&existing).await?;

        Ok(existing)
    }

    fn mention_rows_for(
        &self,
        comment_id: &str,
        mentioned_user_ids: &[String],
    ) -> Vec<mention::ActiveModel> {
        mentioned_user_ids
            .iter()
            .map(|user_id| mention::ActiveModel {
                id: Set(self.id_gen.generate()),
                entity_id: Set(comment_id.to_string()),
                user_id: Set(user_id.clone()),
                mentionable_type: Set(mention::MentionableType::Comment),
            })
            .collect()
    }

    /// Resolve and attach actor profiles across a list and its children.
    async fn bind_actors(&self, list: &mut [CommentDetail]) -> AppResult<()> {
        fn collect_ids(detail: &CommentDetail, ids: &mut Vec<String>) {
            ids.push(detail.created_by.clone());
            if let Some(child) = &detail.child {
                for item in &child.list {
                    collect_ids(item, ids);
                }
            }
        }

        fn assign(detail: &mut CommentDetail, profiles: &HashMap<String, UserProfile>) {
            detail.actor = profiles.get(&detail.created_by).cloned();
            if let Some(child) = &mut detail.child {
                for item in &mut child.list {
                    assign(item, profiles);
                }
            }
        }

        let mut ids = Vec::new();
        for detail in list.iter() {
            collect_ids(detail, &mut ids);
        }
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(());
        }

        let profiles = self.directory.find_all_by_ids(&ids).await?;
        if profiles.is_empty() {
            return Ok(());
        }
        let by_id: HashMap<String, UserProfile> =
            profiles.into_iter().map(|p| (p.id.clone(), p)).collect();

        for detail in list.iter_mut() {
            assign(detail, &by_id);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use agora_db::entities::post;
    use agora_db::pagination::{encode_cursor, SortKey};
    use chrono::TimeZone;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn ts(sec: u32) -> DateTimeWithTimeZone {
        chrono::Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, sec)
            .unwrap()
            .into()
    }

    fn test_post(can_comment: bool) -> post::Model {
        post::Model {
            id: "post1".to_string(),
            group_ids: json!(["g1"]),
            comments_count: 0,
            can_comment,
            is_hidden: false,
            created_by: "author1".to_string(),
            created_at: ts(0),
            updated_at: None,
        }
    }

    fn test_comment(id: &str, parent_id: Option<&str>, sec: u32) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            parent_id: parent_id.map(ToString::to_string),
            post_id: "post1".to_string(),
            content: Some(format!("comment {id}")),
            total_reply: 0,
            edited: false,
            is_hidden: false,
            giphy_id: None,
            media_json: json!({"files": [], "images": [], "videos": []}),
            mentions: json!([]),
            created_by: "author1".to_string(),
            updated_by: None,
            created_at: ts(sec),
            updated_at: None,
        }
    }

    fn mock_row(
        id: &str,
        parent_id: Option<&str>,
        sec: u32,
        reaction: Option<(&str, &str)>,
        mention: Option<&str>,
    ) -> BTreeMap<&'static str, Value> {
        btreemap! {
            "id" => Value::from(id),
            "parent_id" => parent_id.map_or(Value::String(None), |p| Value::from(p)),
            "post_id" => Value::from("post1"),
            "content" => Value::from(format!("comment {id}")),
            "total_reply" => Value::from(0i32),
            "edited" => Value::from(false),
            "is_hidden" => Value::from(false),
            "giphy_id" => Value::String(None),
            "media_json" => Value::from(json!({"files": [], "images": [], "videos": []})),
            "mentions" => Value::from(json!([])),
            "created_by" => Value::from("author1"),
            "updated_by" => Value::String(None),
            "created_at" => Value::from(ts(sec)),
            "updated_at" => Value::ChronoDateTimeWithTimeZone(None),
            "reaction_id" => reaction.map_or(Value::String(None), |(rid, _)| Value::from(rid)),
            "reaction_name" => reaction.map_or(Value::String(None), |(_, name)| Value::from(name)),
            "reaction_created_at" => reaction
                .map_or(Value::ChronoDateTimeWithTimeZone(None), |_| Value::from(ts(sec))),
            "mention_user_id" => mention.map_or(Value::String(None), |m| Value::from(m)),
        }
    }

    fn exec_ok(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            CommentRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            ReportRepository::new(db),
        )
    }

    fn list_input(parent_id: Option<&str>, limit: u64, child_limit: u64) -> GetCommentsInput {
        GetCommentsInput {
            post_id: "post1".to_string(),
            parent_id: parent_id.map(ToString::to_string),
            limit,
            order: SortOrder::Desc,
            before: None,
            after: None,
            child_limit,
        }
    }

    #[tokio::test]
    async fn test_get_list_descending_newest_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(true)]])
            .append_query_results([vec![
                test_comment("c5", None, 5),
                test_comment("c4", None, 4),
                test_comment("c3", None, 3),
                test_comment("c2", None, 2),
                test_comment("c1", None, 1),
            ]])
            .append_query_results([vec![
                mock_row("c5", None, 5, None, None),
                mock_row("c4", None, 4, None, None),
                mock_row("c3", None, 3, None, None),
                mock_row("c2", None, 2, None, None),
                mock_row("c1", None, 1, None, None),
            ]])
            .into_connection();

        let page = service(db)
            .get_list(None, list_input(None, 10, 0))
            .await
            .unwrap();

        let ids: Vec<&str> = page.list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c5", "c4", "c3", "c2", "c1"]);
        assert!(!page.meta.has_next_page);
        assert!(!page.meta.has_previous_page);
        assert_eq!(
            page.meta.start_cursor,
            Some(encode_cursor(&SortKey { created_at: ts(5) }))
        );
        assert_eq!(
            page.meta.end_cursor,
            Some(encode_cursor(&SortKey { created_at: ts(1) }))
        );
    }

    #[tokio::test]
    async fn test_get_list_binds_children_with_per_parent_next_flag() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(true)]])
            .append_query_results([vec![test_comment("root", None, 1)]])
            .append_query_results([vec![mock_row("root", None, 1, None, None)]])
            .append_query_results([vec![
                test_comment("c5", Some("root"), 7),
                test_comment("c4", Some("root"), 6),
                test_comment("c3", Some("root"), 5),
                test_comment("c2", Some("root"), 4),
            ]])
            .append_query_results([vec![
                mock_row("c5", Some("root"), 7, None, None),
                mock_row("c4", Some("root"), 6, None, None),
                mock_row("c3", Some("root"), 5, None, None),
                mock_row("c2", Some("root"), 4, None, None),
            ]])
            .into_connection();

        let page = service(db)
            .get_list(None, list_input(None, 10, 3))
            .await
            .unwrap();

        let child = page.list[0].child.as_ref().unwrap();
        let ids: Vec<&str> = child.list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c5", "c4", "c3"]);
        assert!(child.meta.has_next_page);
    }

    #[tokio::test]
    async fn test_get_list_is_empty_for_a_post_the_viewer_reported() {
        use agora_db::entities::report_content_detail;

        let report = report_content_detail::Model {
            id: "r1".to_string(),
            target_id: "post1".to_string(),
            target_type: TargetType::Post,
            created_by: "u1".to_string(),
            created_at: ts(0),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[report]])
            .into_connection();

        let page = service(db)
            .get_list(Some("u1"), list_input(None, 10, 0))
            .await
            .unwrap();

        assert!(page.list.is_empty());
        assert!(!page.meta.has_next_page);
    }

    #[tokio::test]
    async fn test_get_list_is_empty_when_commenting_disabled() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(false)]])
            .into_connection();

        let page = service(db)
            .get_list(None, list_input(None, 10, 0))
            .await
            .unwrap();

        assert!(page.list.is_empty());
    }

    #[tokio::test]
    async fn test_get_list_children_require_a_visible_parent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(true)]])
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let result = service(db)
            .get_list(None, list_input(Some("hidden-parent"), 10, 0))
            .await;

        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_around_id_centers_the_target() {
        // Roots c1..c5 at t1 < .. < t5; a window of 3 around c3 is
        // [c4, c3, c2] with more rows on both sides.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment("c3", None, 3)]])
            .append_query_results([[test_post(true)]])
            // leading half: fetched ascending, limit 1 + 1
            .append_query_results([vec![
                test_comment("c4", None, 4),
                test_comment("c5", None, 5),
            ]])
            // trailing half: fetched descending, limit 1 + 1
            .append_query_results([vec![
                test_comment("c2", None, 2),
                test_comment("c1", None, 1),
            ]])
            .append_query_results([vec![
                mock_row("c4", None, 4, None, None),
                mock_row("c3", None, 3, None, None),
                mock_row("c2", None, 2, None, None),
            ]])
            .into_connection();

        let page = service(db)
            .get_around_id(
                None,
                "c3",
                GetAroundInput {
                    limit: 3,
                    target_child_limit: 0,
                },
            )
            .await
            .unwrap();

        let ids: Vec<&str> = page.list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c4", "c3", "c2"]);
        assert_eq!(ids.iter().filter(|id| **id == "c3").count(), 1);
        assert!(page.meta.has_next_page);
        assert!(page.meta.has_previous_page);
    }

    #[tokio::test]
    async fn test_get_around_id_missing_target_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let result = service(db)
            .get_around_id(
                None,
                "gone",
                GetAroundInput {
                    limit: 3,
                    target_child_limit: 0,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_root_comment_round_trips_through_fetch() {
        let created = test_comment("c1", None, 1);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(true)]])
            .append_query_results([[created.clone()]])
            .append_query_results([[created]])
            .append_query_results([vec![mock_row("c1", None, 1, None, None)]])
            .append_exec_results([exec_ok(1)])
            .into_connection();

        let detail = service(db)
            .create(
                "author1",
                CreateCommentInput {
                    post_id: "post1".to_string(),
                    parent_id: None,
                    content: Some("comment c1".to_string()),
                    media: MediaCollection::default(),
                    mentions: vec![],
                    giphy_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.id, "c1");
        assert!(detail.owner_reactions.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_reply_to_a_reply() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(true)]])
            .append_query_results([[test_comment("c2", Some("c1"), 2)]])
            .into_connection();

        let result = service(db)
            .create(
                "author1",
                CreateCommentInput {
                    post_id: "post1".to_string(),
                    parent_id: Some("c2".to_string()),
                    content: Some("nested".to_string()),
                    media: MediaCollection::default(),
                    mentions: vec![],
                    giphy_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_an_empty_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db)
            .create(
                "author1",
                CreateCommentInput {
                    post_id: "post1".to_string(),
                    parent_id: None,
                    content: Some("   ".to_string()),
                    media: MediaCollection::default(),
                    mentions: vec![],
                    giphy_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_requires_the_author() {
        let mut other = test_comment("c1", None, 1);
        other.created_by = "someone-else".to_string();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[other]])
            .into_connection();

        let result = service(db)
            .update("author1", "c1", UpdateCommentInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_destroy_requires_the_author() {
        let mut other = test_comment("c1", None, 1);
        other.created_by = "someone-else".to_string();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[other]])
            .into_connection();

        let result = service(db).destroy("author1", "c1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_destroy_returns_the_snapshot() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment("c1", None, 1)]])
            .append_query_results([Vec::<comment::Model>::new()])
            .append_exec_results([exec_ok(0), exec_ok(0), exec_ok(1), exec_ok(1)])
            .into_connection();

        let snapshot = service(db).destroy("author1", "c1").await.unwrap();

        assert_eq!(snapshot.id, "c1");
    }
}
