//! # Loan Default Statistics Visualization Library
//!
//! `loanstats` is a library for exploring and visualizing loan default
//! statistics. It loads a pre-computed JSON dataset of per-account records
//! (or a pre-computed default-rates document) and renders bar, pie, and line
//! charts driven by dropdown filter controls.
//!
//! ## Features
//!
//! - Load flat account-record datasets or default-rates documents
//! - Group accounts by gender, education, marital status, age group,
//!   credit-utilization category, or late-payment count
//! - Sub-filter by late-payment count or credit-utilization category
//! - Render bar, pie, and line charts
//! - Caching of computed summaries and rendered charts
//!
//! ## Example
//!
//! ```no_run
//! use loanstats::LoanStatsApp;
//! use std::sync::{Arc, Mutex};
//! use eframe::NativeOptions;
//!
//! // Create a new application instance
//! let app = Arc::new(Mutex::new(LoanStatsApp::default()));
//! let app_wrapper = loanstats::app::AppWrapper { app };
//!
//! // Run the application with eframe
//! eframe::run_native(
//!     "Loan Default Statistics",
//!     NativeOptions::default(),
//!     Box::new(|_cc| Ok(Box::new(app_wrapper))),
//! ).unwrap();
//! ```

pub mod analysis;
pub mod app;
pub mod plotting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::App as LoanStatsApp;
pub use types::{AnalysisResult, CacheKey};
