use loanstats::analysis::{load_dataset_async, Dataset, DatasetError};
use loanstats::app::App;
use loanstats::types::{ChartKind, Dimension};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn setup_test_dataset() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();

    let records = serde_json::json!([
        {"late_payments": 0, "sex": "M", "marriage": "Married", "age_bin": "25-34",
         "education": "University", "cur_sept_category": "Low", "count": 120},
        {"late_payments": 0, "sex": "F", "marriage": "Single", "age_bin": "18-24",
         "education": "High School", "cur_sept_category": "Low", "count": 95},
        {"late_payments": 1, "sex": "M", "marriage": "Single", "age_bin": "35-44",
         "education": "Graduate", "cur_sept_category": "Medium", "count": 40},
        {"late_payments": 2, "sex": "F", "marriage": "Married", "age_bin": "25-34",
         "education": "University", "cur_sept_category": "Medium", "count": 31},
        {"late_payments": 2, "sex": "M", "marriage": "Other", "age_bin": "45-54",
         "education": "High School", "cur_sept_category": "High", "count": 18},
        {"late_payments": 3, "sex": "F", "marriage": "Single", "age_bin": "25-34",
         "education": "University", "cur_sept_category": "High", "count": 9}
    ]);

    let path = temp_dir.path().join("data.json");
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
    let path = path.to_str().unwrap().to_string();

    (temp_dir, path)
}

#[tokio::test]
async fn test_full_workflow() {
    let (temp_dir, dataset_path) = setup_test_dataset();

    // Initialize app
    let app = Arc::new(Mutex::new(App::default()));
    {
        let mut app = app.lock().unwrap();
        app.dataset_path = dataset_path.clone();
    }

    // Test dataset loading
    {
        let mut app = app.lock().unwrap();
        assert_eq!(app.record_count, 0);
        assert!(app.groups.is_empty());

        let dataset = load_dataset_async(dataset_path.clone()).await.unwrap();
        app.update_with_dataset(dataset);

        // Verify the initial summary and dropdown contents
        assert_eq!(app.record_count, 6);
        assert_eq!(app.total_accounts, 313);
        assert_eq!(app.current_grouping, "Late Payments");
        assert_eq!(app.available_late_payment_counts, vec![0, 1, 2, 3]);
        assert_eq!(
            app.available_cur_categories,
            vec!["Low".to_string(), "Medium".to_string(), "High".to_string()]
        );

        // Late-payment groups come back in ascending key order
        let labels: Vec<&str> = app.groups.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, vec!["0", "1", "2", "3"]);
        assert_eq!(app.groups[0].1, 215.0);
    }

    // Test grouping selection
    {
        let mut app = app.lock().unwrap();
        app.current_grouping = "Gender".to_string();
        app.refresh_summary();

        let result = app.analysis_result.as_ref().unwrap();
        assert_eq!(result.chart, ChartKind::Pie);
        assert_eq!(
            result.groups,
            vec![("M".to_string(), 178.0), ("F".to_string(), 135.0)]
        );
    }

    // Test sub-filtering
    {
        let mut app = app.lock().unwrap();
        app.selected_late_payments = "2".to_string();
        app.refresh_summary();

        // Only the two late_payments == 2 records remain
        assert_eq!(app.record_count, 2);
        assert_eq!(app.total_accounts, 49);

        // Switching to the CUR filter resets the late-payments filter
        app.selected_late_payments = "All".to_string();
        app.selected_cur_category = "High".to_string();
        app.refresh_summary();
        assert_eq!(app.record_count, 2);
        assert_eq!(app.total_accounts, 27);
    }

    // Test chart generation for every grouping
    {
        let mut app = app.lock().unwrap();
        app.chart_path = temp_dir
            .path()
            .join("test_chart.png")
            .to_str()
            .unwrap()
            .to_string();
        app.selected_cur_category = "All".to_string();

        for dimension in Dimension::ALL {
            app.current_grouping = dimension.label().to_string();
            app.refresh_summary();
            assert!(loanstats::plotting::generate_plot(&app).is_ok());
            assert!(fs::metadata(&app.chart_path).is_ok());
        }
    }

    // Test caching
    {
        let app = app.lock().unwrap();
        assert!(app.get_cached_result("Gender", "all").is_some());
        assert!(app.get_cached_result("Gender", "late_payments=2").is_some());
        assert!(app.get_cached_result("Gender", "late_payments=7").is_none());
    }
}

#[tokio::test]
async fn test_error_handling() {
    // Test missing dataset file
    {
        let result = load_dataset_async("/nonexistent/data.json".to_string()).await;
        assert!(result.is_err());
    }

    // Test a document that is neither an array nor a category map
    {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "\"not a dataset\"").unwrap();

        let result = load_dataset_async(path.to_str().unwrap().to_string()).await;
        assert!(matches!(result, Err(DatasetError::InvalidFormat)));
    }

    // Test unknown grouping: the error is surfaced and no chart data remains
    {
        let (_temp_dir, dataset_path) = setup_test_dataset();
        let dataset = load_dataset_async(dataset_path).await.unwrap();

        let mut app = App::default();
        app.update_with_dataset(dataset);
        app.current_grouping = "Favorite Color".to_string();
        app.refresh_summary();

        assert!(app.error_message.is_some());
        assert!(app.groups.is_empty());
        assert!(app.analysis_result.is_none());
    }
}

#[tokio::test]
async fn test_default_rates_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let doc = serde_json::json!({
        "gender": [
            {"gender": "M", "default_rate": 24.17},
            {"gender": "F", "default_rate": 20.78}
        ],
        "age_group": [
            {"age_group": "18-24", "default_rate": 8.72},
            {"age_group": "25-34", "default_rate": 6.31},
            {"age_group": "35-44", "default_rate": 5.48}
        ]
    });
    let path = temp_dir.path().join("default_rates.json");
    fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

    let dataset = load_dataset_async(path.to_str().unwrap().to_string())
        .await
        .unwrap();
    assert!(matches!(dataset, Dataset::DefaultRates(_)));

    let mut app = App::default();
    app.update_with_dataset(dataset);

    // Record-dataset sub-filters are disabled for rate documents
    assert!(app.available_late_payment_counts.is_empty());
    assert!(app.available_cur_categories.is_empty());
    assert_eq!(
        app.available_rate_categories,
        vec!["age_group".to_string(), "gender".to_string()]
    );

    app.current_grouping = "age_group".to_string();
    app.refresh_summary();
    let result = app.analysis_result.as_ref().unwrap();
    assert_eq!(result.chart, ChartKind::Line);
    assert!(result.percent_axis);
    assert_eq!(result.groups.len(), 3);

    app.chart_path = temp_dir
        .path()
        .join("rates_chart.png")
        .to_str()
        .unwrap()
        .to_string();
    assert!(loanstats::plotting::generate_plot(&app).is_ok());
}
