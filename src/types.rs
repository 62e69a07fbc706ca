//! # Common Types
//!
//! This module contains the common types used throughout the application for
//! representing loan account records, grouping dimensions, filter predicates,
//! and chart-ready summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single pre-aggregated loan account record.
///
/// Records are read-only once fetched; the `count` field carries the number of
/// accounts the row stands for. Categorical fields are optional: a missing
/// field groups under `"Unknown"` and never matches an equality filter, and
/// the fields were not always present in older exports. The serde aliases absorb
/// the field-name drift between exports (`gender` vs `sex`, `marital_status`
/// vs `marriage`, `age_group` vs `age_bin`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Count of delinquent payment cycles for the account
    #[serde(default)]
    pub late_payments: Option<u32>,
    #[serde(default, alias = "gender")]
    pub sex: Option<String>,
    #[serde(default, alias = "marital_status")]
    pub marriage: Option<String>,
    #[serde(default, alias = "age_group")]
    pub age_bin: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    /// Credit utilization ratio bucket (September snapshot)
    #[serde(default, alias = "cur_category")]
    pub cur_sept_category: Option<String>,
    /// Pre-aggregated weight: how many accounts this row represents
    #[serde(default)]
    pub count: u64,
}

impl AccountRecord {
    /// The record's value for a grouping dimension, or `None` when the field
    /// is absent from the source row.
    pub fn key(&self, dimension: Dimension) -> Option<GroupKey> {
        match dimension {
            Dimension::LatePayments => self.late_payments.map(GroupKey::Count),
            Dimension::Gender => self.sex.clone().map(GroupKey::Label),
            Dimension::Marriage => self.marriage.clone().map(GroupKey::Label),
            Dimension::AgeBin => self.age_bin.clone().map(GroupKey::Label),
            Dimension::Education => self.education.clone().map(GroupKey::Label),
            Dimension::CurCategory => self.cur_sept_category.clone().map(GroupKey::Label),
        }
    }

    /// Grouping key with absent fields folded into an `"Unknown"` group.
    pub fn group_key(&self, dimension: Dimension) -> GroupKey {
        self.key(dimension)
            .unwrap_or_else(|| GroupKey::Label("Unknown".to_string()))
    }
}

/// The grouping dimensions exposed by the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    LatePayments,
    Gender,
    Marriage,
    AgeBin,
    Education,
    CurCategory,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::LatePayments,
        Dimension::Gender,
        Dimension::Marriage,
        Dimension::AgeBin,
        Dimension::Education,
        Dimension::CurCategory,
    ];

    /// Display label used in the grouping dropdown.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::LatePayments => "Late Payments",
            Dimension::Gender => "Gender",
            Dimension::Marriage => "Marital Status",
            Dimension::AgeBin => "Age Group",
            Dimension::Education => "Education",
            Dimension::CurCategory => "Credit Utilization",
        }
    }

    /// Field name in the dataset file.
    pub fn field_name(self) -> &'static str {
        match self {
            Dimension::LatePayments => "late_payments",
            Dimension::Gender => "sex",
            Dimension::Marriage => "marriage",
            Dimension::AgeBin => "age_bin",
            Dimension::Education => "education",
            Dimension::CurCategory => "cur_sept_category",
        }
    }

    /// Axis label for the category axis.
    pub fn axis_label(self) -> &'static str {
        match self {
            Dimension::LatePayments => "Number of Late Payments",
            Dimension::Gender => "Gender",
            Dimension::Marriage => "Marital Status",
            Dimension::AgeBin => "Age Group",
            Dimension::Education => "Education Level",
            Dimension::CurCategory => "Credit Utilization Ratio",
        }
    }

    /// Parse a dropdown label or dataset field name.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(label) || d.field_name() == label)
    }

    /// Chart used when grouping by this dimension.
    pub fn chart_kind(self) -> ChartKind {
        match self {
            Dimension::Gender | Dimension::Marriage => ChartKind::Pie,
            Dimension::AgeBin => ChartKind::Line,
            _ => ChartKind::Bar,
        }
    }

    /// Late payment counts are sorted ascending; every other dimension keeps
    /// first-seen order.
    pub fn key_order(self) -> KeyOrder {
        match self {
            Dimension::LatePayments => KeyOrder::NumericAscending,
            _ => KeyOrder::FirstSeen,
        }
    }
}

/// A grouping-key value: either a numeric count or a categorical label.
///
/// The derived `Ord` sorts numeric keys ascending and before labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Count(u32),
    Label(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Count(n) => write!(f, "{}", n),
            GroupKey::Label(s) => write!(f, "{}", s),
        }
    }
}

/// Ordering policy for aggregated group keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    FirstSeen,
    NumericAscending,
}

/// A sub-filter predicate: accept everything, or keep records whose field
/// equals a literal value. Records missing the field never match.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Equals(Dimension, GroupKey),
}

impl Filter {
    pub fn matches(&self, record: &AccountRecord) -> bool {
        match self {
            Filter::All => true,
            Filter::Equals(dimension, value) => {
                record.key(*dimension).map_or(false, |key| key == *value)
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Equals(dimension, value) => {
                write!(f, "{}={}", dimension.field_name(), value)
            }
        }
    }
}

/// The summary statistic computed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Number of records in the group
    Records,
    /// Sum of the pre-aggregated `count` weights
    Accounts,
}

/// Chart used to render a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Bar,
    Pie,
    Line,
}

/// A key used for caching summaries based on grouping and sub-filter.
///
/// This struct is used as a key in the cache to store summaries for specific
/// combinations of grouping dimension and active filter.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CacheKey {
    /// The selected grouping (dropdown label or rate-document category)
    pub grouping: String,
    /// The active sub-filter, rendered as `field=value` (or `all`)
    pub filter: String,
}

/// The chart-ready result of summarizing a dataset view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisResult {
    /// Number of records in the filtered subset
    pub record_count: usize,
    /// Total accounts across all groups
    pub total_accounts: u64,
    /// Ordered mapping from group label to value
    pub groups: Vec<(String, f64)>,
    /// Chart used to render the groups
    pub chart: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Format the value axis as percentages
    pub percent_axis: bool,
    /// Time taken to compute the summary, in seconds
    pub elapsed_time: f64,
}

/// One point of a default-rates series: a category value and its default rate
/// in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RatePoint {
    pub label: String,
    pub default_rate: f64,
}

/// A named default-rates series, e.g. `education` with one point per level.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSeries {
    pub name: String,
    pub points: Vec<RatePoint>,
}

/// The pre-computed default-rates document shape: category name mapped to
/// `{<category>, default_rate}` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultRateDocument {
    pub categories: Vec<RateSeries>,
}

impl DefaultRateDocument {
    pub fn series(&self, name: &str) -> Option<&RateSeries> {
        self.categories.iter().find(|series| series.name == name)
    }
}
