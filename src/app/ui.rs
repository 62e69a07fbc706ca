use egui::{ComboBox, Context};
use image::ImageReader;
use std::sync::{Arc, Mutex};

use super::App;
use crate::analysis::load_dataset_async;
use crate::types::{ChartKind, Dimension};

/// Draw the main application UI
pub fn draw_ui(app: &mut App, ctx: &Context, app_arc: Arc<Mutex<App>>) {
    egui::SidePanel::left("side_panel").show(ctx, |ui| {
        ui.heading("Display Options");
        ui.separator();

        // Grouping selection: dimensions for record datasets, category names
        // for default-rates documents
        let prev_grouping = app.current_grouping.clone();
        if !app.available_rate_categories.is_empty() {
            ui.label("Category:");
            ComboBox::new("category_selector", "")
                .selected_text(&app.current_grouping)
                .show_ui(ui, |ui| {
                    for category in &app.available_rate_categories {
                        ui.selectable_value(
                            &mut app.current_grouping,
                            category.clone(),
                            category,
                        );
                    }
                });
        } else {
            ui.label("Group by:");
            ComboBox::new("grouping_selector", "")
                .selected_text(&app.current_grouping)
                .show_ui(ui, |ui| {
                    for dimension in Dimension::ALL {
                        ui.selectable_value(
                            &mut app.current_grouping,
                            dimension.label().to_string(),
                            dimension.label(),
                        );
                    }
                });
        }
        if prev_grouping != app.current_grouping {
            app.refresh_summary();
        }

        // Sub-filters only exist for record datasets
        if !app.available_late_payment_counts.is_empty() {
            ui.label("Late payments:");
            let prev_selection = app.selected_late_payments.clone();
            ComboBox::new("late_payments_selector", "")
                .selected_text(&app.selected_late_payments)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut app.selected_late_payments, "All".to_string(), "All");
                    for count in &app.available_late_payment_counts {
                        let value = count.to_string();
                        ui.selectable_value(
                            &mut app.selected_late_payments,
                            value.clone(),
                            value,
                        );
                    }
                });

            if prev_selection != app.selected_late_payments {
                // Only one sub-filter may be active at a time
                if app.selected_late_payments != "All" {
                    app.selected_cur_category = "All".to_string();
                }
                app.refresh_summary();
            }
        }

        if !app.available_cur_categories.is_empty() {
            ui.label("Credit utilization:");
            let prev_selection = app.selected_cur_category.clone();
            ComboBox::new("cur_selector", "")
                .selected_text(&app.selected_cur_category)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut app.selected_cur_category, "All".to_string(), "All");
                    for category in &app.available_cur_categories {
                        ui.selectable_value(
                            &mut app.selected_cur_category,
                            category.clone(),
                            category,
                        );
                    }
                });

            if prev_selection != app.selected_cur_category {
                if app.selected_cur_category != "All" {
                    app.selected_late_payments = "All".to_string();
                }
                app.refresh_summary();
            }
        }
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.heading("Loan Default Statistics");
        ui.separator();

        ui.label("Enter the path to a JSON dataset:");
        ui.text_edit_singleline(&mut app.dataset_path);

        if ui.button("Load").clicked() && !app.is_loading {
            let dataset_path = app.dataset_path.clone();
            let app_clone = app_arc.clone();
            app.is_loading = true;

            tokio::spawn(async move {
                match load_dataset_async(dataset_path).await {
                    Ok(dataset) => {
                        let mut app = app_clone.lock().unwrap();
                        app.update_with_dataset(dataset);
                    }
                    Err(e) => {
                        log::error!("Failed to load dataset: {}", e);
                        let mut app = app_clone.lock().unwrap();
                        app.error_message = Some(e.to_string());
                    }
                }
                let mut app = app_clone.lock().unwrap();
                app.is_loading = false;
            });
        }

        if app.is_loading {
            ui.label("Loading... Please wait.");
            ui.spinner();
        }

        if let Some(error) = &app.error_message {
            ui.colored_label(egui::Color32::LIGHT_RED, error);
        }

        ui.separator();
        ui.label(format!("Records: {}", app.record_count));
        ui.label(format!("Total accounts: {}", app.total_accounts));
        if let Some(loaded_at) = app.loaded_at {
            ui.label(format!("Loaded at {}", loaded_at.format("%H:%M:%S")));
        }
        if let Some(elapsed) = app.last_summary_time {
            ui.label(format!("Summary computed in {:.2}ms", elapsed * 1000.0));
        }

        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if let Some(texture) = &app.chart_texture {
                ui.image(texture);
            }
            if let Some(result) = &app.analysis_result {
                if result.chart == ChartKind::Pie {
                    ui.separator();
                    for (label, value) in &result.groups {
                        ui.label(format!("{}: {:.0}", label, value));
                    }
                }
            }
        });
    });

    // Redraw the chart if needed
    if app.update_needed {
        if app.groups.is_empty() {
            app.chart_texture = None;
        } else if let Err(e) = crate::plotting::generate_plot(app) {
            log::error!("Plotting error: {}", e);
        } else {
            load_chart_texture(app, ctx);
        }
        app.update_needed = false;
    }
}

fn load_chart_texture(app: &mut App, ctx: &Context) {
    if let Ok(image) = ImageReader::open(&app.chart_path).and_then(|reader| {
        reader
            .decode()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }) {
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image.to_rgba8();
        let pixels = pixels.as_flat_samples();
        let texture = ctx.load_texture(
            "chart_texture",
            egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice()),
            egui::TextureOptions::LINEAR,
        );
        app.chart_texture = Some(texture);
    } else {
        log::error!("Failed to load chart image");
    }
}
