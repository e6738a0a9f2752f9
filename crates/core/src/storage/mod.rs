pub mod error;
pub mod memory;
pub mod seed;

pub use error::StoreError;
pub use memory::InMemoryRepository;

use crate::domain::{Company, CompanyFilter, CompanyFinancialDataset, FinancialMetrics, Upsert};
use chrono::{DateTime, Utc};

/// Source of company financial datasets. Handlers only see this trait, so a
/// persistent store can replace the in-memory one without touching them.
#[async_trait::async_trait]
pub trait FinancialDataRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Companies in dataset order.
    async fn list_companies(&self, filter: CompanyFilter) -> Result<Vec<Company>, StoreError>;

    async fn list_datasets(&self) -> Result<Vec<CompanyFinancialDataset>, StoreError>;

    /// Case-insensitive ticker lookup.
    async fn find_by_ticker(
        &self,
        ticker: &str,
    ) -> Result<Option<CompanyFinancialDataset>, StoreError>;

    /// Stores `metrics` under its (year, quarter) period, replacing any entry
    /// with the same period.
    async fn upsert_metrics(
        &self,
        ticker: &str,
        metrics: FinancialMetrics,
        now: DateTime<Utc>,
    ) -> Result<(CompanyFinancialDataset, Upsert), StoreError>;
}
