use crate::domain::{
    normalize_ticker, Company, CompanyFilter, CompanyFinancialDataset, FinancialMetrics, Upsert,
};
use crate::storage::seed;
use crate::storage::{FinancialDataRepository, StoreError};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use validator::Validate;

/// Process-lifetime collection built once from a validated seed.
#[derive(Debug)]
pub struct InMemoryRepository {
    datasets: RwLock<Vec<CompanyFinancialDataset>>,
}

impl InMemoryRepository {
    pub fn from_datasets(datasets: Vec<CompanyFinancialDataset>) -> anyhow::Result<Self> {
        seed::validate_collection(&datasets)?;
        Ok(Self {
            datasets: RwLock::new(datasets),
        })
    }

    pub async fn len(&self) -> usize {
        self.datasets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.datasets.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl FinancialDataRepository for InMemoryRepository {
    fn backend_name(&self) -> &'static str {
        "in_memory"
    }

    async fn list_companies(&self, filter: CompanyFilter) -> Result<Vec<Company>, StoreError> {
        let datasets = self.datasets.read().await;
        Ok(datasets
            .iter()
            .map(|d| &d.company)
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn list_datasets(&self) -> Result<Vec<CompanyFinancialDataset>, StoreError> {
        Ok(self.datasets.read().await.clone())
    }

    async fn find_by_ticker(
        &self,
        ticker: &str,
    ) -> Result<Option<CompanyFinancialDataset>, StoreError> {
        let ticker = normalize_ticker(ticker);
        let datasets = self.datasets.read().await;
        Ok(datasets.iter().find(|d| d.ticker() == ticker).cloned())
    }

    async fn upsert_metrics(
        &self,
        ticker: &str,
        metrics: FinancialMetrics,
        now: DateTime<Utc>,
    ) -> Result<(CompanyFinancialDataset, Upsert), StoreError> {
        let ticker = normalize_ticker(ticker);
        if let Err(errs) = metrics.validate() {
            return Err(StoreError::Rejected {
                ticker,
                detail: errs.to_string(),
            });
        }

        let mut datasets = self.datasets.write().await;
        let Some(dataset) = datasets.iter_mut().find(|d| d.ticker() == ticker) else {
            return Err(StoreError::NotFound { ticker });
        };

        let period = metrics.period();
        let outcome = dataset.upsert_metrics(metrics, now);
        tracing::debug!(%ticker, %period, ?outcome, "metrics stored");
        Ok((dataset.clone(), outcome))
    }
}
