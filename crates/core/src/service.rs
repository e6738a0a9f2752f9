use crate::domain::{
    normalize_ticker, Company, CompanyFilter, CompanyFinancialDataset, FinancialMetrics,
};
use crate::storage::{FinancialDataRepository, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// What a metrics submission does to stored state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Validate and echo; storage is left untouched.
    #[default]
    Acknowledge,
    /// Validate, then upsert into the repository.
    Apply,
}

impl FromStr for UpdateMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acknowledge" | "ack" => Ok(Self::Acknowledge),
            "apply" => Ok(Self::Apply),
            other => anyhow::bail!("unknown update mode {other:?} (expected acknowledge|apply)"),
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acknowledge => f.write_str("acknowledge"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Company not found: {ticker}")]
    NotFound { ticker: String },

    #[error("invalid metrics: {0}")]
    Invalid(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { ticker } => Self::NotFound { ticker },
            StoreError::Rejected { detail, .. } => Self::Invalid(detail),
            StoreError::Backend(e) => Self::Storage(e),
        }
    }
}

/// Acknowledgement for an accepted metrics submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsAck {
    pub message: String,
    pub data: FinancialMetrics,
}

#[derive(Clone)]
pub struct FinancialDataService {
    repo: Arc<dyn FinancialDataRepository>,
    update_mode: UpdateMode,
}

impl FinancialDataService {
    pub fn new(repo: Arc<dyn FinancialDataRepository>, update_mode: UpdateMode) -> Self {
        Self { repo, update_mode }
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn backend_name(&self) -> &'static str {
        self.repo.backend_name()
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.repo.list_companies(CompanyFilter::All).await?)
    }

    pub async fn list_clients(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.repo.list_companies(CompanyFilter::Clients).await?)
    }

    pub async fn list_competitors(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.repo.list_companies(CompanyFilter::Competitors).await?)
    }

    pub async fn list_financial_data(&self) -> Result<Vec<CompanyFinancialDataset>, ServiceError> {
        Ok(self.repo.list_datasets().await?)
    }

    pub async fn financial_data_by_ticker(
        &self,
        ticker: &str,
    ) -> Result<CompanyFinancialDataset, ServiceError> {
        self.repo
            .find_by_ticker(ticker)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                ticker: normalize_ticker(ticker),
            })
    }

    /// `metrics` must already have passed schema validation.
    pub async fn submit_metrics(
        &self,
        ticker: &str,
        metrics: FinancialMetrics,
    ) -> Result<MetricsAck, ServiceError> {
        let ticker = normalize_ticker(ticker);
        let period = metrics.period();

        if self.update_mode == UpdateMode::Apply {
            let (_, outcome) = self
                .repo
                .upsert_metrics(&ticker, metrics.clone(), Utc::now())
                .await?;
            tracing::info!(%ticker, %period, ?outcome, "metrics update applied");
        } else {
            tracing::info!(%ticker, %period, "metrics update acknowledged");
        }

        Ok(MetricsAck {
            message: format!("Financial data updated for {ticker}"),
            data: metrics,
        })
    }
}
