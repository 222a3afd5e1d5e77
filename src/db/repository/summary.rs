//! Day aggregation repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{DaySummary, UserId};

/// Repository trait for the day-based aggregation query.
///
/// A day summary rolls up every task due on `date` together with its
/// sub-records: nutrition totals across meal logs, pages read, gym rounds
/// completed and shopping list progress.
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    /// Aggregate one calendar day of tasks for a user.
    async fn fetch_day_summary(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<DaySummary>;
}
