use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// One reporting snapshot for a company. Percent-style fields are stored as
/// percentages (45.6 means 45.6%), ratios as plain multiples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_finite"))]
pub struct FinancialMetrics {
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    /// Absent for annual figures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, max = 4))]
    pub quarter: Option<u8>,

    // Basic financials
    pub revenue: f64,
    pub revenue_growth_rate: f64,
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_income_margin: f64,
    pub ebitda_margin: f64,
    pub eps: f64,

    // Capital efficiency
    pub roe: f64,
    pub roa: f64,
    pub roic: f64,
    pub asset_turnover_ratio: f64,

    // Cost structure
    pub cogs_as_percent_of_revenue: f64,
    pub sga_as_percent_of_revenue: f64,
    pub rd_and_capex_as_percent_of_revenue: f64,

    // Growth
    #[serde(rename = "revenueGrowthRateYoY")]
    pub revenue_growth_rate_yoy: f64,
    #[serde(rename = "revenueGrowthRate3YearCAGR")]
    pub revenue_growth_rate_3year_cagr: f64,
    pub net_income_growth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_share_growth: Option<f64>,

    // Liquidity & solvency
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub debt_to_equity: f64,
    pub interest_coverage_ratio: f64,

    // Valuation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_ebitda: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_sales: Option<f64>,
}

impl FinancialMetrics {
    pub fn period(&self) -> MetricsPeriod {
        MetricsPeriod {
            year: self.year,
            quarter: self.quarter,
        }
    }

    /// Every numeric field by its wire name. Optional fields report `None` when absent.
    pub fn numeric_fields(&self) -> [(&'static str, Option<f64>); 26] {
        [
            ("revenue", Some(self.revenue)),
            ("revenueGrowthRate", Some(self.revenue_growth_rate)),
            ("grossMargin", Some(self.gross_margin)),
            ("operatingMargin", Some(self.operating_margin)),
            ("netIncomeMargin", Some(self.net_income_margin)),
            ("ebitdaMargin", Some(self.ebitda_margin)),
            ("eps", Some(self.eps)),
            ("roe", Some(self.roe)),
            ("roa", Some(self.roa)),
            ("roic", Some(self.roic)),
            ("assetTurnoverRatio", Some(self.asset_turnover_ratio)),
            ("cogsAsPercentOfRevenue", Some(self.cogs_as_percent_of_revenue)),
            ("sgaAsPercentOfRevenue", Some(self.sga_as_percent_of_revenue)),
            (
                "rdAndCapexAsPercentOfRevenue",
                Some(self.rd_and_capex_as_percent_of_revenue),
            ),
            ("revenueGrowthRateYoY", Some(self.revenue_growth_rate_yoy)),
            (
                "revenueGrowthRate3YearCAGR",
                Some(self.revenue_growth_rate_3year_cagr),
            ),
            ("netIncomeGrowth", Some(self.net_income_growth)),
            ("marketShareGrowth", self.market_share_growth),
            ("currentRatio", Some(self.current_ratio)),
            ("quickRatio", Some(self.quick_ratio)),
            ("debtToEquity", Some(self.debt_to_equity)),
            ("interestCoverageRatio", Some(self.interest_coverage_ratio)),
            ("marketCap", self.market_cap),
            ("peRatio", self.pe_ratio),
            ("evEbitda", self.ev_ebitda),
            ("priceToSales", self.price_to_sales),
        ]
    }
}

fn validate_finite(metrics: &FinancialMetrics) -> Result<(), ValidationError> {
    let bad: Vec<&str> = metrics
        .numeric_fields()
        .into_iter()
        .filter_map(|(name, v)| match v {
            Some(v) if !v.is_finite() => Some(name),
            _ => None,
        })
        .collect();

    if bad.is_empty() {
        return Ok(());
    }

    let mut err = ValidationError::new("non_finite");
    err.message = Some(format!("fields must be finite numbers: {}", bad.join(", ")).into());
    err.add_param("fields".into(), &bad);
    Err(err)
}

/// (year, quarter) key identifying one reporting snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricsPeriod {
    pub year: i32,
    pub quarter: Option<u8>,
}

impl fmt::Display for MetricsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quarter {
            Some(q) => write!(f, "{}-Q{}", self.year, q),
            None => write!(f, "{}", self.year),
        }
    }
}
