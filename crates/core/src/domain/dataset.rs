use crate::domain::company::Company;
use crate::domain::metrics::{FinancialMetrics, MetricsPeriod};
use anyhow::{ensure, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFinancialDataset {
    pub company: Company,
    /// Chronological as supplied; may be empty.
    #[serde(default)]
    pub financial_metrics: Vec<FinancialMetrics>,
    pub last_updated: DateTime<Utc>,
}

/// What `upsert_metrics` did with the incoming period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced,
    Appended,
}

impl CompanyFinancialDataset {
    pub fn ticker(&self) -> &str {
        &self.company.ticker
    }

    pub fn find_period(&self, period: MetricsPeriod) -> Option<&FinancialMetrics> {
        self.financial_metrics.iter().find(|m| m.period() == period)
    }

    /// Schema rules on the company and each metrics entry, plus period uniqueness.
    pub fn check(&self) -> anyhow::Result<()> {
        self.company
            .validate()
            .with_context(|| format!("invalid company {}", self.company.ticker))?;

        let mut seen = BTreeSet::<MetricsPeriod>::new();
        for metrics in &self.financial_metrics {
            let period = metrics.period();
            metrics
                .validate()
                .with_context(|| format!("invalid metrics for {} {period}", self.company.ticker))?;
            ensure!(
                seen.insert(period),
                "duplicate metrics period {period} for {}",
                self.company.ticker
            );
        }

        Ok(())
    }

    /// Replaces the entry sharing the incoming period, or appends a new one.
    pub fn upsert_metrics(&mut self, metrics: FinancialMetrics, now: DateTime<Utc>) -> Upsert {
        let period = metrics.period();
        let outcome = match self
            .financial_metrics
            .iter_mut()
            .find(|m| m.period() == period)
        {
            Some(existing) => {
                *existing = metrics;
                Upsert::Replaced
            }
            None => {
                self.financial_metrics.push(metrics);
                Upsert::Appended
            }
        };
        self.last_updated = now;
        outcome
    }
}
