//! Visibility predicate shared by every comment retrieval path.

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{ColumnTrait, Condition};

use crate::entities::{comment, report_content_detail, report_content_detail::TargetType};

/// Predicate excluding hidden comments and comments the viewer reported.
///
/// Flat listing, around listing, children listing, and single fetch must
/// all compose exactly this predicate: cursors computed under one
/// predicate are only valid under the same one.
#[must_use]
pub fn visible_to(viewer_id: Option<&str>) -> Condition {
    let mut cond = Condition::all().add(comment::Column::IsHidden.eq(false));

    if let Some(viewer) = viewer_id {
        let reported = Query::select()
            .column((
                report_content_detail::Entity,
                report_content_detail::Column::TargetId,
            ))
            .from(report_content_detail::Entity)
            .and_where(
                Expr::col((
                    report_content_detail::Entity,
                    report_content_detail::Column::TargetId,
                ))
                .equals((comment::Entity, comment::Column::Id)),
            )
            .and_where(
                Expr::col((
                    report_content_detail::Entity,
                    report_content_detail::Column::TargetType,
                ))
                .eq(TargetType::Comment),
            )
            .and_where(
                Expr::col((
                    report_content_detail::Entity,
                    report_content_detail::Column::CreatedBy,
                ))
                .eq(viewer),
            )
            .to_owned();

        cond = cond.add(Condition::all().add(Expr::exists(reported)).not());
    }

    cond
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn render(viewer_id: Option<&str>) -> String {
        comment::Entity::find()
            .filter(visible_to(viewer_id))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_always_excludes_hidden_comments() {
        let sql = render(None);
        assert!(sql.contains("\"is_hidden\" = FALSE"));
    }

    #[test]
    fn test_anonymous_viewer_skips_report_exclusion() {
        let sql = render(None);
        assert!(!sql.contains("EXISTS"));
    }

    #[test]
    fn test_viewer_reports_are_excluded_via_not_exists() {
        let sql = render(Some("u1"));
        assert!(sql.contains("NOT (EXISTS"));
        assert!(sql.contains("report_content_details"));
        assert!(sql.contains("'COMMENT'"));
        assert!(sql.contains("'u1'"));
    }

    #[test]
    fn test_predicate_is_identical_across_scopes() {
        // The same composed predicate must appear whatever scope filters
        // are added around it.
        let flat = render(Some("u1"));
        let children = comment::Entity::find()
            .filter(comment::Column::ParentId.eq("c1"))
            .filter(visible_to(Some("u1")))
            .build(DbBackend::Postgres)
            .to_string();

        let marker = "NOT (EXISTS";
        let flat_tail = &flat[flat.find(marker).unwrap()..];
        let children_tail = &children[children.find(marker).unwrap()..];
        assert_eq!(flat_tail, children_tail);
    }
}
