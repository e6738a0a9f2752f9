pub mod company;
pub mod dataset;
pub mod metrics;

pub use company::{normalize_ticker, Company, CompanyFilter};
pub use dataset::{CompanyFinancialDataset, Upsert};
pub use metrics::{FinancialMetrics, MetricsPeriod};
