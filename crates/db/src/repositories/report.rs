//! Reported-content repository (read-only).

use std::sync::Arc;

use agora_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::{report_content_detail, report_content_detail::TargetType, ReportContentDetail};

/// Reported-content repository.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// IDs of the targets a user has reported, restricted to the given
    /// target kinds.
    pub async fn reported_target_ids(
        &self,
        user_id: &str,
        target_types: &[TargetType],
    ) -> AppResult<Vec<String>> {
        let rows = ReportContentDetail::find()
            .filter(report_content_detail::Column::CreatedBy.eq(user_id))
            .filter(report_content_detail::Column::TargetType.is_in(target_types.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.target_id).collect())
    }
}
