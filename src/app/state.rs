use chrono::{DateTime, Utc};
use eframe::App as EApp;
use egui::TextureHandle;
use std::sync::{Arc, Mutex};

use crate::analysis::{
    available_cur_categories, available_late_payment_counts, summarize, summarize_rates,
    CacheManager, Dataset,
};
use crate::types::{AnalysisResult, CacheKey, Dimension, Filter, GroupKey};

/// Main application state
#[derive(Clone)]
pub struct App {
    pub dataset_path: String,
    /// The immutable dataset handle shared with background tasks
    pub dataset: Option<Arc<Dataset>>,
    pub record_count: usize,
    pub total_accounts: u64,
    pub groups: Vec<(String, f64)>,
    pub chart_path: String,
    pub chart_texture: Option<TextureHandle>,
    pub current_grouping: String,
    pub selected_late_payments: String,
    pub selected_cur_category: String,
    pub available_late_payment_counts: Vec<u32>,
    pub available_cur_categories: Vec<String>,
    pub available_rate_categories: Vec<String>,
    pub summary_cache: CacheManager,
    pub update_needed: bool,
    pub is_loading: bool,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_summary_time: Option<f64>,
    pub analysis_result: Option<AnalysisResult>,
    pub error_message: Option<String>,
}

impl App {
    /// Install a freshly loaded dataset and compute the initial summary.
    pub fn update_with_dataset(&mut self, dataset: Dataset) {
        match &dataset {
            Dataset::Accounts(records) => {
                self.available_late_payment_counts = available_late_payment_counts(records);
                self.available_cur_categories = available_cur_categories(records);
                self.available_rate_categories.clear();
                self.current_grouping = Dimension::LatePayments.label().to_string();
            }
            Dataset::DefaultRates(doc) => {
                self.available_late_payment_counts.clear();
                self.available_cur_categories.clear();
                self.available_rate_categories =
                    doc.categories.iter().map(|series| series.name.clone()).collect();
                self.current_grouping = self
                    .available_rate_categories
                    .first()
                    .cloned()
                    .unwrap_or_default();
            }
        }

        self.selected_late_payments = "All".to_string();
        self.selected_cur_category = "All".to_string();
        self.dataset = Some(Arc::new(dataset));
        self.loaded_at = Some(Utc::now());
        self.error_message = None;
        self.summary_cache.clear();
        self.refresh_summary();
    }

    /// The single active sub-filter predicate derived from the dropdowns.
    pub fn active_filter(&self) -> Filter {
        if self.selected_late_payments != "All" {
            if let Ok(n) = self.selected_late_payments.parse::<u32>() {
                return Filter::Equals(Dimension::LatePayments, GroupKey::Count(n));
            }
        }
        if self.selected_cur_category != "All" {
            return Filter::Equals(
                Dimension::CurCategory,
                GroupKey::Label(self.selected_cur_category.clone()),
            );
        }
        Filter::All
    }

    /// Recompute the summary for the current selections, consulting the
    /// cache first. Failures leave an error message and clear the chart.
    pub fn refresh_summary(&mut self) {
        let Some(dataset) = self.dataset.clone() else {
            return;
        };

        let filter = self.active_filter();
        let cache_key = CacheKey {
            grouping: self.current_grouping.clone(),
            filter: filter.to_string(),
        };

        if let Some(result) = self.summary_cache.get(&cache_key) {
            let result = result.clone();
            self.update_with_result(result);
            return;
        }

        let outcome = match dataset.as_ref() {
            Dataset::Accounts(records) => summarize(records, &self.current_grouping, &filter),
            Dataset::DefaultRates(doc) => summarize_rates(doc, &self.current_grouping),
        };

        match outcome {
            Ok(result) => {
                self.summary_cache.store(cache_key, result.clone());
                self.update_with_result(result);
            }
            Err(e) => {
                log::warn!("Failed to summarize dataset: {}", e);
                self.error_message = Some(e.to_string());
                self.analysis_result = None;
                self.groups.clear();
                self.update_needed = true;
            }
        }
    }

    /// Update the app state with a computed summary
    pub fn update_with_result(&mut self, result: AnalysisResult) {
        self.record_count = result.record_count;
        self.total_accounts = result.total_accounts;
        self.groups = result.groups.clone();
        self.last_summary_time = Some(result.elapsed_time);
        self.error_message = None;
        self.update_needed = true;
        self.analysis_result = Some(result);
    }

    /// Get a cached summary for the given grouping and filter token
    pub fn get_cached_result(&self, grouping: &str, filter: &str) -> Option<AnalysisResult> {
        let cache_key = CacheKey {
            grouping: grouping.to_string(),
            filter: filter.to_string(),
        };
        self.summary_cache.get(&cache_key).cloned()
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            dataset_path: String::new(),
            dataset: None,
            record_count: 0,
            total_accounts: 0,
            groups: Vec::new(),
            chart_path: "loan_chart.png".to_string(),
            chart_texture: None,
            current_grouping: Dimension::LatePayments.label().to_string(),
            selected_late_payments: "All".to_string(),
            selected_cur_category: "All".to_string(),
            available_late_payment_counts: Vec::new(),
            available_cur_categories: Vec::new(),
            available_rate_categories: Vec::new(),
            summary_cache: CacheManager::new(),
            update_needed: false,
            is_loading: false,
            loaded_at: None,
            last_summary_time: None,
            analysis_result: None,
            error_message: None,
        }
    }
}

/// Thread-safe wrapper around App for use with eframe
pub struct AppWrapper {
    pub app: Arc<Mutex<App>>,
}

impl EApp for AppWrapper {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Ok(mut app) = self.app.lock() {
            super::ui::draw_ui(&mut app, ctx, Arc::clone(&self.app));
        } else {
            log::error!("Failed to acquire app lock in update");
        }
    }
}
