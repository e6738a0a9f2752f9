use crate::domain::CompanyFinancialDataset;
use anyhow::{ensure, Context};
use std::collections::BTreeSet;
use std::path::Path;

const EMBEDDED_SEED: &str = include_str!("../../seed/financial_data.json");

pub fn load_embedded() -> anyhow::Result<Vec<CompanyFinancialDataset>> {
    parse(EMBEDDED_SEED).context("embedded seed is malformed")
}

pub fn load_from_path(path: &Path) -> anyhow::Result<Vec<CompanyFinancialDataset>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse(&text).with_context(|| format!("seed file {} is malformed", path.display()))
}

/// Embedded seed unless a path is given.
pub fn load(path: Option<&Path>) -> anyhow::Result<Vec<CompanyFinancialDataset>> {
    match path {
        Some(p) => load_from_path(p),
        None => load_embedded(),
    }
}

fn parse(text: &str) -> anyhow::Result<Vec<CompanyFinancialDataset>> {
    let datasets = serde_json::from_str::<Vec<CompanyFinancialDataset>>(text)
        .context("seed is not a valid dataset array")?;
    validate_collection(&datasets)?;
    Ok(datasets)
}

/// Per-dataset rules plus ticker uniqueness across the collection.
pub fn validate_collection(datasets: &[CompanyFinancialDataset]) -> anyhow::Result<()> {
    let mut tickers = BTreeSet::<&str>::new();
    for dataset in datasets {
        dataset.check()?;
        ensure!(
            tickers.insert(dataset.ticker()),
            "duplicate ticker in seed: {}",
            dataset.ticker()
        );
    }
    Ok(())
}
