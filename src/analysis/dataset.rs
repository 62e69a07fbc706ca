use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tokio::task::spawn_blocking;

use crate::types::{
    AccountRecord, AnalysisResult, ChartKind, DefaultRateDocument, Dimension, Filter, Measure,
    RatePoint, RateSeries,
};
use crate::utils::{filter_records, group_totals};

/// Errors raised while loading or summarizing a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid dataset format: expected an array of records or a category map")]
    InvalidFormat,
    #[error("unknown grouping: {0}")]
    UnknownGrouping(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("dataset load task failed: {0}")]
    Task(String),
}

/// A loaded dataset, in one of the two supported file shapes.
#[derive(Debug, Clone)]
pub enum Dataset {
    /// Flat array of per-account records
    Accounts(Vec<AccountRecord>),
    /// Pre-computed default rates keyed by category name
    DefaultRates(DefaultRateDocument),
}

/// Load and parse a dataset file asynchronously.
///
/// The file read and JSON parse run on a blocking task; this is the only
/// asynchronous step of the pipeline. Failures are terminal for the render
/// cycle: the caller logs them and draws nothing.
pub async fn load_dataset_async(path: String) -> Result<Dataset, DatasetError> {
    spawn_blocking(move || {
        let text = std::fs::read_to_string(&path)?;
        parse_dataset(&text)
    })
    .await
    .map_err(|e| DatasetError::Task(e.to_string()))?
}

/// Parse a dataset document from JSON text.
///
/// An array deserializes as account records; an object is read as a
/// default-rates document. Anything else is rejected.
pub fn parse_dataset(text: &str) -> Result<Dataset, DatasetError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(_) => {
            let records: Vec<AccountRecord> = serde_json::from_value(value)?;
            Ok(Dataset::Accounts(records))
        }
        Value::Object(map) => {
            let mut categories = Vec::with_capacity(map.len());
            for (name, entry) in &map {
                let Value::Array(items) = entry else {
                    return Err(DatasetError::InvalidFormat);
                };
                categories.push(RateSeries {
                    name: name.clone(),
                    points: rate_points(name, items),
                });
            }
            Ok(Dataset::DefaultRates(DefaultRateDocument { categories }))
        }
        _ => Err(DatasetError::InvalidFormat),
    }
}

/// Extract the `{<category>, default_rate}` pairs of one series.
///
/// The label key is named after the category; exports that renamed it are
/// handled by falling back to the first textual field. Items without a rate
/// or a label are skipped.
fn rate_points(category: &str, items: &[Value]) -> Vec<RatePoint> {
    let mut points = Vec::with_capacity(items.len());
    for item in items {
        let Some(rate) = item.get("default_rate").and_then(Value::as_f64) else {
            log::warn!("Skipping {} entry without a default_rate", category);
            continue;
        };
        let label = item
            .get(category)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| first_text_field(item));
        let Some(label) = label else {
            log::warn!("Skipping {} entry without a label field", category);
            continue;
        };
        points.push(RatePoint {
            label,
            default_rate: rate,
        });
    }
    points
}

fn first_text_field(item: &Value) -> Option<String> {
    item.as_object()?.iter().find_map(|(key, value)| {
        if key == "default_rate" {
            None
        } else {
            value.as_str().map(str::to_string)
        }
    })
}

/// Distinct late-payment counts present in the dataset, ascending.
///
/// Populates the late-payments sub-filter dropdown.
pub fn available_late_payment_counts(records: &[AccountRecord]) -> Vec<u32> {
    let mut counts: Vec<u32> = Vec::new();
    for record in records {
        if let Some(n) = record.late_payments {
            if !counts.contains(&n) {
                counts.push(n);
            }
        }
    }
    counts.sort_unstable();
    counts
}

/// Distinct credit-utilization categories, in first-seen order.
///
/// Populates the CUR sub-filter dropdown.
pub fn available_cur_categories(records: &[AccountRecord]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for record in records {
        if let Some(category) = record.cur_sept_category.as_deref() {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
    }
    categories
}

/// Summarize a record dataset for one grouping and sub-filter selection.
///
/// This is the synchronous filter → aggregate pass behind every chart
/// redraw. The grouping name comes from the UI selection; an unrecognized
/// one yields `UnknownGrouping` and no chart is drawn.
pub fn summarize(
    records: &[AccountRecord],
    grouping: &str,
    filter: &Filter,
) -> Result<AnalysisResult, DatasetError> {
    let start_time = Instant::now();

    let dimension = Dimension::from_label(grouping)
        .ok_or_else(|| DatasetError::UnknownGrouping(grouping.to_string()))?;

    let subset = filter_records(records, filter);
    let groups = group_totals(&subset, dimension, Measure::Accounts);
    let total_accounts: u64 = groups.iter().map(|(_, value)| *value).sum();

    Ok(AnalysisResult {
        record_count: subset.len(),
        total_accounts,
        groups: groups
            .into_iter()
            .map(|(key, value)| (key.to_string(), value as f64))
            .collect(),
        chart: dimension.chart_kind(),
        title: format!("Accounts by {}", dimension.label()),
        x_label: dimension.axis_label().to_string(),
        y_label: "Count".to_string(),
        percent_axis: false,
        elapsed_time: start_time.elapsed().as_secs_f64(),
    })
}

/// Summarize one category of a default-rates document.
pub fn summarize_rates(
    doc: &DefaultRateDocument,
    category: &str,
) -> Result<AnalysisResult, DatasetError> {
    let start_time = Instant::now();

    let series = doc
        .series(category)
        .ok_or_else(|| DatasetError::UnknownCategory(category.to_string()))?;

    let chart = if series.name == "age_group" {
        ChartKind::Line
    } else {
        ChartKind::Bar
    };

    Ok(AnalysisResult {
        record_count: series.points.len(),
        total_accounts: 0,
        groups: series
            .points
            .iter()
            .map(|point| (point.label.clone(), point.default_rate))
            .collect(),
        chart,
        title: format!(
            "Default Rates by {}",
            category.replace('_', " ").to_uppercase()
        ),
        x_label: category.replace('_', " "),
        y_label: "Default Rate".to_string(),
        percent_axis: true,
        elapsed_time: start_time.elapsed().as_secs_f64(),
    })
}
