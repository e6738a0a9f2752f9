use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

const MAX_TICKER_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_company"))]
pub struct Company {
    #[validate(length(min = 1, max = 10))]
    pub ticker: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub industry: String,
    #[validate(range(min = 0.0))]
    pub market_cap: f64,
    pub is_client: bool,

    // Profile fields shown on the dashboard's company page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_landscape: Option<String>,
}

/// Which side of the client/competitor partition to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyFilter {
    All,
    Clients,
    Competitors,
}

impl CompanyFilter {
    pub fn matches(self, company: &Company) -> bool {
        match self {
            CompanyFilter::All => true,
            CompanyFilter::Clients => company.is_client,
            CompanyFilter::Competitors => !company.is_client,
        }
    }
}

/// Lookup key form of a ticker: surrounding whitespace dropped, upper-cased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn is_ticker_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

fn validate_company(company: &Company) -> Result<(), ValidationError> {
    if company.ticker.len() > MAX_TICKER_LEN || !company.ticker.chars().all(is_ticker_char) {
        let mut err = ValidationError::new("ticker_format");
        err.message = Some(
            format!(
                "ticker `{}` must be upper-case letters, digits, '.' or '-'",
                company.ticker
            )
            .into(),
        );
        return Err(err);
    }

    if !company.market_cap.is_finite() {
        let mut err = ValidationError::new("non_finite");
        err.message = Some("marketCap must be a finite number".into());
        return Err(err);
    }

    if company.name.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("name must not be blank".into());
        return Err(err);
    }

    Ok(())
}
