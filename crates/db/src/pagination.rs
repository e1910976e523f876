//! Cursor-based pagination.
//!
//! A cursor is an opaque, URL-safe token encoding the sort key of a
//! boundary row. Clients must treat it as a black box; the payload is not
//! stable across schema changes.

use agora_common::{AppError, AppResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};

/// Sort key encoded into an opaque cursor.
///
/// `created_at` is the single ordering field; it is unique within a
/// listing scope, so no tie-break column is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SortKey {
    /// Creation timestamp of the boundary row.
    pub created_at: DateTimeWithTimeZone,
}

/// Encode a sort key into an opaque URL-safe cursor.
#[must_use]
pub fn encode_cursor(key: &SortKey) -> String {
    // Serializing a plain timestamp struct cannot fail.
    let body = serde_json::to_vec(key).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(body)
}

/// Decode an opaque cursor back into its sort key.
///
/// Fails closed: malformed base64, UTF-8, JSON, or unknown payload fields
/// all yield [`AppError::InvalidCursor`].
pub fn decode_cursor(cursor: &str) -> AppResult<SortKey> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| AppError::InvalidCursor)?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::InvalidCursor)
}

/// Sort order for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// The opposite order.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Convert to the query builder's order.
    #[must_use]
    pub fn into_query_order(self) -> sea_orm::Order {
        match self {
            Self::Asc => sea_orm::Order::Asc,
            Self::Desc => sea_orm::Order::Desc,
        }
    }
}

/// Cursor window parameters for a page request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorPage {
    /// Return rows preceding this cursor in the requested order.
    pub before: Option<String>,
    /// Return rows following this cursor in the requested order.
    pub after: Option<String>,
    /// Maximum number of rows to return.
    pub limit: u64,
}

/// Pagination metadata for a returned page.
///
/// Boundary cursors are computed from the first and last returned rows,
/// never from the probe row dropped during window detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// A page of rows plus boundary metadata.
#[derive(Debug, Clone)]
pub struct PageResult<T> {
    /// Rows in the caller's requested order.
    pub rows: Vec<T>,
    /// Boundary metadata.
    pub meta: PageMeta,
}

/// Entities orderable by a unique cursor column.
pub trait CursorKeyed: EntityTrait {
    /// Column the cursor encodes.
    fn cursor_column() -> Self::Column;

    /// Extract the sort key from a fetched row.
    fn cursor_key(model: &Self::Model) -> SortKey;
}

/// Windowed fetch over an ordered, filtered select, without a COUNT query.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    page: CursorPage,
    order: SortOrder,
}

impl CursorPaginator {
    /// Create a paginator for one page request.
    #[must_use]
    pub const fn new(page: CursorPage, order: SortOrder) -> Self {
        Self { page, order }
    }

    /// Fetch one page, re-normalized to the requested order.
    ///
    /// Fetches `limit + 1` rows to detect whether the window continues in
    /// the fetch direction; the extra row is dropped before metadata is
    /// computed. Running the same request twice without intervening writes
    /// yields identical rows and boundaries.
    pub async fn paginate<E, C>(&self, select: Select<E>, db: &C) -> AppResult<PageResult<E::Model>>
    where
        E: CursorKeyed,
        C: ConnectionTrait,
    {
        if self.page.after.is_some() && self.page.before.is_some() {
            return Err(AppError::BadRequest(
                "`before` and `after` are mutually exclusive".to_string(),
            ));
        }

        let limit = self.page.limit.max(1);
        let backwards = self.page.before.is_some();

        let boundary = match (&self.page.after, &self.page.before) {
            (Some(cursor), None) | (None, Some(cursor)) => Some(decode_cursor(cursor)?),
            _ => None,
        };

        let mut query = select;
        if let Some(key) = boundary {
            // `after` advances past the boundary in the requested order,
            // `before` rewinds behind it.
            let advances = matches!(
                (backwards, self.order),
                (false, SortOrder::Asc) | (true, SortOrder::Desc)
            );
            query = if advances {
                query.filter(E::cursor_column().gt(key.created_at))
            } else {
                query.filter(E::cursor_column().lt(key.created_at))
            };
        }

        // Backward pages are fetched in reverse so LIMIT counts rows
        // adjacent to the cursor, then flipped back.
        let fetch_order = if backwards {
            self.order.reversed()
        } else {
            self.order
        };

        let mut rows = query
            .order_by(E::cursor_column(), fetch_order.into_query_order())
            .limit(limit + 1)
            .all(db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let has_more = rows.len() as u64 > limit;
        if has_more {
            rows.pop();
        }
        if backwards {
            rows.reverse();
        }

        let meta = PageMeta {
            start_cursor: rows.first().map(|m| encode_cursor(&E::cursor_key(m))),
            end_cursor: rows.last().map(|m| encode_cursor(&E::cursor_key(m))),
            has_next_page: backwards || has_more,
            has_previous_page: self.page.after.is_some() || (backwards && has_more),
        };

        Ok(PageResult { rows, meta })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::comment;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, EntityTrait, MockDatabase};
    use serde_json::json;

    fn ts(sec: u32) -> DateTimeWithTimeZone {
        chrono::Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, sec)
            .unwrap()
            .into()
    }

    fn test_comment(id: &str, sec: u32) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            parent_id: None,
            post_id: "post1".to_string(),
            content: Some(format!("comment {id}")),
            total_reply: 0,
            edited: false,
            is_hidden: false,
            giphy_id: None,
            media_json: json!({"files": [], "images": [], "videos": []}),
            mentions: json!([]),
            created_by: "user1".to_string(),
            updated_by: None,
            created_at: ts(sec),
            updated_at: None,
        }
    }

    #[test]
    fn test_cursor_round_trip() {
        let key = SortKey { created_at: ts(42) };
        let cursor = encode_cursor(&key);
        let decoded = decode_cursor(&cursor).unwrap();

        assert_eq!(decoded, key);
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let cursor = encode_cursor(&SortKey { created_at: ts(7) });

        assert!(!cursor.contains('+'));
        assert!(!cursor.contains('/'));
        assert!(!cursor.contains('='));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_cursor("not a cursor!!!"),
            Err(AppError::InvalidCursor)
        ));
    }

    #[test]
    fn test_decode_rejects_valid_base64_with_bad_payload() {
        let cursor = URL_SAFE_NO_PAD.encode(b"{\"unexpected\": 1}");
        assert!(matches!(decode_cursor(&cursor), Err(AppError::InvalidCursor)));
    }

    #[test]
    fn test_decode_rejects_truncated_cursor() {
        let cursor = encode_cursor(&SortKey { created_at: ts(9) });
        let truncated = &cursor[..cursor.len() / 2];
        assert!(matches!(decode_cursor(truncated), Err(AppError::InvalidCursor)));
    }

    #[tokio::test]
    async fn test_first_page_trims_probe_row_and_flags_next() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                test_comment("c3", 3),
                test_comment("c2", 2),
                test_comment("c1", 1),
            ]])
            .into_connection();

        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: None,
                limit: 2,
            },
            SortOrder::Desc,
        );
        let page = paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].id, "c3");
        assert_eq!(page.rows[1].id, "c2");
        assert!(page.meta.has_next_page);
        assert!(!page.meta.has_previous_page);
        assert_eq!(
            page.meta.start_cursor,
            Some(encode_cursor(&SortKey { created_at: ts(3) }))
        );
        assert_eq!(
            page.meta.end_cursor,
            Some(encode_cursor(&SortKey { created_at: ts(2) }))
        );
    }

    #[tokio::test]
    async fn test_terminal_page_has_no_next() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment("c2", 2), test_comment("c1", 1)]])
            .into_connection();

        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: None,
                limit: 2,
            },
            SortOrder::Desc,
        );
        let page = paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        assert_eq!(page.rows.len(), 2);
        assert!(!page.meta.has_next_page);
        assert!(!page.meta.has_previous_page);
    }

    #[tokio::test]
    async fn test_empty_page_has_null_cursors_and_false_flags() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: None,
                limit: 5,
            },
            SortOrder::Desc,
        );
        let page = paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        assert!(page.rows.is_empty());
        assert_eq!(page.meta, PageMeta::default());
    }

    #[tokio::test]
    async fn test_after_page_flags_previous() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment("c1", 1)]])
            .into_connection();

        let cursor = encode_cursor(&SortKey { created_at: ts(2) });
        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: Some(cursor),
                limit: 2,
            },
            SortOrder::Desc,
        );
        let page = paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        assert_eq!(page.rows.len(), 1);
        assert!(page.meta.has_previous_page);
        assert!(!page.meta.has_next_page);
    }

    #[tokio::test]
    async fn test_before_page_is_renormalized_to_requested_order() {
        // Backward fetch runs ascending for a descending listing; the mock
        // returns fetch-order rows and the paginator flips them back.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[
                test_comment("c3", 3),
                test_comment("c4", 4),
                test_comment("c5", 5),
            ]])
            .into_connection();

        let cursor = encode_cursor(&SortKey { created_at: ts(2) });
        let paginator = CursorPaginator::new(
            CursorPage {
                before: Some(cursor),
                after: None,
                limit: 2,
            },
            SortOrder::Desc,
        );
        let page = paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].id, "c4");
        assert_eq!(page.rows[1].id, "c3");
        assert!(page.meta.has_next_page);
        assert!(page.meta.has_previous_page);
    }

    #[tokio::test]
    async fn test_before_and_after_together_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let cursor = encode_cursor(&SortKey { created_at: ts(2) });
        let paginator = CursorPaginator::new(
            CursorPage {
                before: Some(cursor.clone()),
                after: Some(cursor),
                limit: 2,
            },
            SortOrder::Desc,
        );
        let result = paginator.paginate(comment::Entity::find(), &db).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_malformed_cursor_fails_closed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: Some("????".to_string()),
                limit: 2,
            },
            SortOrder::Desc,
        );
        let result = paginator.paginate(comment::Entity::find(), &db).await;

        assert!(matches!(result, Err(AppError::InvalidCursor)));
    }

    #[tokio::test]
    async fn test_window_comparison_direction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let cursor = encode_cursor(&SortKey { created_at: ts(2) });
        let paginator = CursorPaginator::new(
            CursorPage {
                before: None,
                after: Some(cursor),
                limit: 2,
            },
            SortOrder::Desc,
        );
        paginator
            .paginate(comment::Entity::find(), &db)
            .await
            .unwrap();

        // Descending + `after` walks to strictly older rows.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("\"created_at\" <"));
        assert!(log.contains("ORDER BY \"comments\".\"created_at\" DESC"));
    }
}
