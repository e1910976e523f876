//! Thread aggregation.
//!
//! Listing queries return flat rows duplicated by the outer joins (one
//! row per comment × owner-reaction × mention). The functions here fold
//! that fan-out back into one object per comment and group child rows
//! under their parents with per-parent pagination.

use std::collections::HashMap;

use agora_db::pagination::{encode_cursor, PageMeta, SortKey};
use agora_db::repositories::CommentRow;

use super::comment::{CommentDetail, OwnerReaction, Page};
use super::giphy::GiphyStore;

/// Fold join-duplicated rows into one object per comment.
///
/// First-seen order is preserved and never re-sorted. Reactions dedup by
/// reaction id, mentions by user id, so folding the same rows again
/// yields the same structure regardless of join fan-out.
#[must_use]
pub fn fold_rows(rows: &[CommentRow], giphy: &dyn GiphyStore) -> Vec<CommentDetail> {
    let mut details: Vec<CommentDetail> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let slot = if let Some(&existing) = index.get(&row.id) {
            existing
        } else {
            index.insert(row.id.clone(), details.len());
            details.push(CommentDetail::from_row(row, giphy));
            details.len() - 1
        };
        let detail = &mut details[slot];

        if let (Some(reaction_id), Some(reaction_name)) = (&row.reaction_id, &row.reaction_name) {
            if !detail.owner_reactions.iter().any(|r| &r.id == reaction_id) {
                detail.owner_reactions.push(OwnerReaction {
                    id: reaction_id.clone(),
                    reaction_name: reaction_name.clone(),
                    created_at: row.reaction_created_at,
                });
            }
        }

        if let Some(user_id) = &row.mention_user_id {
            if !detail.mentioned_user_ids.iter().any(|m| m == user_id) {
                detail.mentioned_user_ids.push(user_id.clone());
            }
        }
    }

    details
}

/// Group folded child rows into per-parent pages.
///
/// Each parent's group is trimmed to `limit` and carries its own
/// `has_next_page`; the child queries fetch `limit + 1` rows per parent
/// for exactly this purpose.
#[must_use]
pub fn group_children(
    child_rows: &[CommentRow],
    limit: u64,
    giphy: &dyn GiphyStore,
) -> HashMap<String, Page<CommentDetail>> {
    let mut buckets: HashMap<String, Vec<CommentDetail>> = HashMap::new();
    for child in fold_rows(child_rows, giphy) {
        if let Some(parent_id) = child.parent_id.clone() {
            buckets.entry(parent_id).or_default().push(child);
        }
    }

    buckets
        .into_iter()
        .map(|(parent_id, mut list)| {
            let has_next_page = list.len() as u64 > limit;
            if has_next_page {
                list.pop();
            }
            let meta = PageMeta {
                start_cursor: list.first().map(|c| {
                    encode_cursor(&SortKey {
                        created_at: c.created_at,
                    })
                }),
                end_cursor: list.last().map(|c| {
                    encode_cursor(&SortKey {
                        created_at: c.created_at,
                    })
                }),
                has_next_page,
                has_previous_page: false,
            };
            (parent_id, Page { list, meta })
        })
        .collect()
}

/// Attach a child page to every parent; parents without children get an
/// empty page.
pub fn attach_children(
    parents: &mut [CommentDetail],
    child_rows: &[CommentRow],
    limit: u64,
    giphy: &dyn GiphyStore,
) {
    let mut groups = group_children(child_rows, limit, giphy);
    for parent in parents.iter_mut() {
        parent.child = Some(groups.remove(&parent.id).unwrap_or_else(Page::empty));
    }
}
