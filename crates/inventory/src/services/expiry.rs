//! Proactive expiry scanning across the catalog.
//!
//! Read-only: the scanner lists active stock whose expiry falls inside the
//! look-ahead window and buckets it by urgency. Flipping a batch to
//! `Expired` is a separate administrative action
//! ([`crate::db::BatchRepository::mark_expired`]), never done here.

use chrono::{Days, Utc};

use crate::config::{Config, DEFAULT_EXPIRY_SCAN_DAYS};
use crate::db::{BatchRepository, ExpiringBatch, RepositoryError};
use crate::models::{ExpiryAlertEntry, ExpiryUrgency};

/// Lists batches nearing expiry for dashboards and notifications.
pub struct ExpiryScanner<'a, R> {
    repo: &'a R,
    default_days_ahead: u32,
}

impl<'a, R: BatchRepository> ExpiryScanner<'a, R> {
    /// Create a scanner backed by the given repository, with the standard
    /// 30-day default window.
    #[must_use]
    pub const fn new(repo: &'a R) -> Self {
        Self {
            repo,
            default_days_ahead: DEFAULT_EXPIRY_SCAN_DAYS,
        }
    }

    /// Create a scanner whose default window comes from configuration
    /// (`EXPIRY_SCAN_DAYS`).
    #[must_use]
    pub const fn from_config(repo: &'a R, config: &Config) -> Self {
        Self {
            repo,
            default_days_ahead: config.expiry_scan_days,
        }
    }

    /// Scan with the scanner's default window.
    ///
    /// # Errors
    ///
    /// Same as [`scan_expiring`](Self::scan_expiring).
    pub async fn scan(&self) -> Result<Vec<ExpiryAlertEntry>, RepositoryError> {
        self.scan_expiring(self.default_days_ahead).await
    }

    /// Active batches with remaining stock expiring within `days_ahead`
    /// days (inclusive), soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails. A query failure is an
    /// error, never an empty list.
    pub async fn scan_expiring(
        &self,
        days_ahead: u32,
    ) -> Result<Vec<ExpiryAlertEntry>, RepositoryError> {
        let today = Utc::now().date_naive();
        let until = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "expiry window overflow: {days_ahead} days ahead"
                ))
            })?;

        let rows = self.repo.expiring_batches(today, until).await?;
        let entries = rows
            .into_iter()
            .filter_map(|row| entry_from(row, today))
            .collect();
        Ok(entries)
    }
}

fn entry_from(row: ExpiringBatch, today: chrono::NaiveDate) -> Option<ExpiryAlertEntry> {
    let exp_date = row.batch.exp_date?;
    let days_until_expiry = (exp_date - today).num_days();
    Some(ExpiryAlertEntry {
        batch_id: row.batch.id,
        product_id: row.batch.product_id,
        product_name: row.product_name,
        batch_number: row.batch.batch_number,
        quantity: row.batch.quantity,
        exp_date,
        days_until_expiry,
        urgency: ExpiryUrgency::for_days_until(days_until_expiry),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBatchRepository;
    use crate::services::test_support::batch;
    use chrono::Duration;
    use stockroom_core::{BatchStatus, ProductId};

    fn repo_with_expiring(days_out: &[(i32, i64)]) -> MemoryBatchRepository {
        let repo = MemoryBatchRepository::new();
        let today = Utc::now().date_naive();
        for &(id, days) in days_out {
            let mut b = batch(id, 1, 10);
            b.exp_date = Some(today + Duration::days(days));
            repo.insert(b);
        }
        repo
    }

    #[tokio::test]
    async fn test_scan_orders_by_expiry_and_buckets_urgency() {
        let repo = repo_with_expiring(&[(1, 20), (2, 3), (3, 10)]);
        repo.set_product_name(ProductId::new(1), "Widget");

        let entries = ExpiryScanner::new(&repo)
            .scan_expiring(30)
            .await
            .expect("scan");

        let order: Vec<i32> = entries.iter().map(|e| e.batch_id.as_i32()).collect();
        assert_eq!(order, vec![2, 3, 1]);

        let urgencies: Vec<ExpiryUrgency> = entries.iter().map(|e| e.urgency).collect();
        assert_eq!(
            urgencies,
            vec![
                ExpiryUrgency::Critical,
                ExpiryUrgency::High,
                ExpiryUrgency::Medium
            ]
        );
        assert!(entries.iter().all(|e| e.product_name.as_deref() == Some("Widget")));
    }

    #[tokio::test]
    async fn test_scan_window_is_inclusive() {
        let repo = repo_with_expiring(&[(1, 30), (2, 31), (3, 0)]);

        let entries = ExpiryScanner::new(&repo)
            .scan_expiring(30)
            .await
            .expect("scan");
        let ids: Vec<i32> = entries.iter().map(|e| e.batch_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_scan_skips_inactive_and_undated_batches() {
        let repo = repo_with_expiring(&[(1, 5)]);
        let mut depleted = batch(2, 1, 0);
        depleted.status = BatchStatus::Depleted;
        depleted.exp_date = Some(Utc::now().date_naive() + Duration::days(5));
        repo.insert(depleted);
        repo.insert(batch(3, 1, 10)); // no expiry date

        let entries = ExpiryScanner::new(&repo)
            .scan_expiring(30)
            .await
            .expect("scan");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|e| e.batch_id.as_i32()), Some(1));
    }

    #[tokio::test]
    async fn test_configured_window_bounds_default_scan() {
        let repo = repo_with_expiring(&[(1, 5), (2, 20)]);
        let config = Config {
            database_url: secrecy::SecretString::from("postgres://unused".to_string()),
            expiry_scan_days: 7,
        };

        let entries = ExpiryScanner::from_config(&repo, &config)
            .scan()
            .await
            .expect("scan");
        let ids: Vec<i32> = entries.iter().map(|e| e.batch_id.as_i32()).collect();
        assert_eq!(ids, vec![1]);

        // Without config the scanner falls back to the 30-day window.
        let entries = ExpiryScanner::new(&repo).scan().await.expect("scan");
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_store_fault_is_an_error_not_an_empty_list() {
        let repo = repo_with_expiring(&[(1, 5)]);
        repo.set_unavailable(true);

        let result = ExpiryScanner::new(&repo).scan_expiring(30).await;
        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
    }
}
