//! Plain-text rendering of solver results for the console.

use crate::domain::allocation::AllocationTable;
use crate::domain::model::PortfolioMetrics;
use tabled::{Table, builder::Builder};

/// Figures printed alongside one allocation.
pub struct SolveSummary<'a> {
    pub title: &'a str,
    pub allocation: &'a AllocationTable,
    /// Annualised expected return (fraction).
    pub annual_return: f64,
    /// Annualised variance.
    pub risk: f64,
    /// Capital the user intends to invest.
    pub capital: f64,
}

/// Ticker / percentage table, percentages rounded to 2 decimals.
pub fn format_allocation(allocation: &AllocationTable) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Ticker", "Allocation (%)"]);
    for (ticker, pct) in allocation.percentages() {
        builder.push_record([ticker, format!("{:.2}", pct)]);
    }
    Table::from(builder).to_string()
}

pub fn format_summary(summary: &SolveSummary<'_>) -> String {
    let weight_sum = summary.allocation.weight_sum();

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    builder.push_record([
        "Expected Annual Return".to_string(),
        format!("{:.2}%", summary.annual_return * 100.0),
    ]);
    builder.push_record([
        "Portfolio Risk (variance)".to_string(),
        format!("{:.2}%", summary.risk * 100.0),
    ]);
    builder.push_record(["Sum of Weights".to_string(), format!("{:.4}", weight_sum)]);
    builder.push_record([
        "Required Investment".to_string(),
        format!("${:.2}", summary.allocation.required_capital(summary.capital)),
    ]);

    format!(
        "=== {} ===\n{}\n{}\n",
        summary.title,
        Table::from(builder),
        format_allocation(summary.allocation)
    )
}

pub fn format_metrics(metrics: &PortfolioMetrics) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    builder.push_record([
        "Annual Return".to_string(),
        format!("{:.2}%", metrics.annual_return * 100.0),
    ]);
    builder.push_record([
        "Volatility".to_string(),
        format!("{:.2}%", metrics.volatility * 100.0),
    ]);
    builder.push_record([
        "Variance".to_string(),
        format!("{:.4}", metrics.variance),
    ]);
    builder.push_record([
        "Sharpe Ratio".to_string(),
        format!("{:.2}", metrics.sharpe_ratio),
    ]);
    Table::from(builder).to_string()
}
