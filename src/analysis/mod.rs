mod cache;
pub mod dataset;


pub use cache::CacheManager;
pub use dataset::{
    available_cur_categories, available_late_payment_counts, load_dataset_async, parse_dataset,
    summarize, summarize_rates, Dataset, DatasetError,
};
