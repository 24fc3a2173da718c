//! # Dashboard
//!
//! Loads a snapshot of the store and hands it to
//! [`fomezero_core::dashboard::compute`]. Nothing here writes.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::ReceivablesResult;
use crate::Receivables;
use fomezero_core::dashboard::{compute, DashboardSnapshot, DashboardStats};
use fomezero_core::DateRange;

impl Receivables {
    /// Dashboard report for `range` as of now.
    pub async fn dashboard_stats(&self, range: DateRange) -> ReceivablesResult<DashboardStats> {
        self.dashboard_stats_at(range, Utc::now()).await
    }

    /// Dashboard report for `range` as of `now`.
    pub async fn dashboard_stats_at(
        &self,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> ReceivablesResult<DashboardStats> {
        let customers = self.db.customers().list_all().await?;
        let snacks = self.db.snacks().list_all().await?;
        let sales = self.db.sales().list_all().await?;
        let credits = self.db.credits().list_all().await?;

        debug!(
            customers = customers.len(),
            sales = sales.len(),
            ledger_entries = credits.len(),
            start = ?range.start,
            end = ?range.end,
            "Computing dashboard"
        );

        let snapshot = DashboardSnapshot {
            customers: &customers,
            snacks: &snacks,
            sales: &sales,
            credits: &credits,
        };
        Ok(compute(&snapshot, range, now, &self.policy))
    }
}
