use lru::LruCache;
use once_cell::sync::Lazy;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as TokioMutex;

use super::styles::{series_color, ChartTheme};
use crate::app::App;
use crate::types::{AnalysisResult, ChartKind};

type PlotError = Box<dyn Error + Send + Sync>;

// Global plot cache with a 5-minute expiration
static PLOT_CACHE: Lazy<Arc<TokioMutex<LruCache<PlotCacheKey, (Vec<u8>, Instant)>>>> =
    Lazy::new(|| {
        Arc::new(TokioMutex::new(LruCache::new(NonZeroUsize::new(10).unwrap()))) // Cache up to 10 plots
    });

#[derive(Hash, Eq, PartialEq)]
struct PlotCacheKey {
    grouping: String,
    filter: String,
    percent_axis: bool,
    data_hash: u64,
}

impl PlotCacheKey {
    fn new(app: &App) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        let mut percent_axis = false;
        if let Some(result) = &app.analysis_result {
            for (label, value) in &result.groups {
                label.hash(&mut hasher);
                value.to_bits().hash(&mut hasher);
            }
            percent_axis = result.percent_axis;
        }

        Self {
            grouping: app.current_grouping.clone(),
            filter: app.active_filter().to_string(),
            percent_axis,
            data_hash: hasher.finish(),
        }
    }
}

// Helper function to wrap errors
fn wrap_err<E>(e: E) -> PlotError
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    e.into()
}

/// Generate a chart based on the current app state, with caching
pub async fn generate_plot_async(app: App) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
    let cache_key = PlotCacheKey::new(&app);

    // Try to get from cache first
    if let Some((plot_data, timestamp)) = PLOT_CACHE.lock().await.get(&cache_key) {
        if timestamp.elapsed() < Duration::from_secs(300) {
            // 5 minutes
            return Ok(plot_data.clone());
        }
    }

    // Render a new chart in a blocking task
    let plot_data = tokio::task::spawn_blocking(move || {
        let buffer;
        {
            let root = BitMapBackend::new(&app.chart_path, (640, 480)).into_drawing_area();
            generate_plot_internal(&app, &root)?;
            root.present()?;

            // Read the file back into the buffer
            buffer = std::fs::read(&app.chart_path)?;
            // Clean up the temporary file
            let _ = std::fs::remove_file(&app.chart_path);
        }
        Ok::<_, PlotError>(buffer)
    })
    .await??;

    // Cache the result
    PLOT_CACHE
        .lock()
        .await
        .put(cache_key, (plot_data.clone(), Instant::now()));

    Ok(plot_data)
}

/// Render the current summary to the app's chart path
pub fn generate_plot(app: &App) -> Result<(), PlotError> {
    let root = BitMapBackend::new(&app.chart_path, (640, 480)).into_drawing_area();
    generate_plot_internal(app, &root)?;
    root.present()?;
    Ok(())
}

/// Internal function to render the chart
pub fn generate_plot_internal(
    app: &App,
    root_area: &DrawingArea<BitMapBackend, Shift>,
) -> Result<(), PlotError> {
    let theme = ChartTheme::default();
    root_area.fill(&theme.background_color).map_err(wrap_err)?;

    let Some(result) = app.analysis_result.as_ref() else {
        return Ok(());
    };
    if result.groups.is_empty() {
        return Ok(());
    }

    match result.chart {
        ChartKind::Bar => draw_bar_chart(root_area, result, &theme),
        ChartKind::Pie => draw_pie_chart(root_area, result, &theme),
        ChartKind::Line => draw_line_chart(root_area, result, &theme),
    }
}

fn draw_bar_chart(
    root_area: &DrawingArea<BitMapBackend, Shift>,
    result: &AnalysisResult,
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let values: Vec<f64> = result.groups.iter().map(|(_, value)| *value).collect();
    let (_, max_val) = calculate_adaptive_range(&values);

    let mut chart_builder = ChartBuilder::on(root_area)
        .caption(
            &result.title,
            ("sans-serif", 30).into_font().color(&theme.text_color),
        )
        .margin(10)
        .set_all_label_area_size(50)
        .build_cartesian_2d(0f64..result.groups.len() as f64, 0f64..max_val)?;

    configure_category_mesh(&mut chart_builder, result, theme)?;

    let bar_width = 0.8;
    let bar_color = series_color(0);
    chart_builder
        .draw_series(result.groups.iter().enumerate().map(|(i, (_, value))| {
            let x0 = i as f64 + (1.0 - bar_width) / 2.0;
            let x1 = x0 + bar_width;
            Rectangle::new([(x0, 0.0), (x1, *value)], bar_color.mix(0.7).filled())
        }))?
        .label(&result.y_label)
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], bar_color.mix(0.7).filled())
        });

    Ok(())
}

fn draw_line_chart(
    root_area: &DrawingArea<BitMapBackend, Shift>,
    result: &AnalysisResult,
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let values: Vec<f64> = result.groups.iter().map(|(_, value)| *value).collect();
    let (_, max_val) = calculate_adaptive_range(&values);

    let mut chart_builder = ChartBuilder::on(root_area)
        .caption(
            &result.title,
            ("sans-serif", 30).into_font().color(&theme.text_color),
        )
        .margin(10)
        .set_all_label_area_size(50)
        .build_cartesian_2d(0f64..result.groups.len() as f64, 0f64..max_val)?;

    configure_category_mesh(&mut chart_builder, result, theme)?;

    let points: Vec<(f64, f64)> = result
        .groups
        .iter()
        .enumerate()
        .map(|(i, (_, value))| (i as f64, *value))
        .collect();

    // Draw a subtle glow effect under the main line
    let glow_color = RGBColor(100, 149, 237).mix(0.3);
    chart_builder.draw_series(LineSeries::new(points.clone(), glow_color.stroke_width(4)))?;

    let line_color = RGBColor(135, 206, 250);
    chart_builder
        .draw_series(LineSeries::new(points, line_color.stroke_width(2)))?
        .label(&result.y_label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_color));

    Ok(())
}

fn draw_pie_chart(
    root_area: &DrawingArea<BitMapBackend, Shift>,
    result: &AnalysisResult,
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let total: f64 = result.groups.iter().map(|(_, value)| *value).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let root_area = root_area
        .titled(
            &result.title,
            ("sans-serif", 30).into_font().color(&theme.text_color),
        )
        .map_err(wrap_err)?;
    let (width, height) = root_area.dim_in_pixel();
    // Leave room for the legend along the right edge
    let center = (width as i32 / 2 - 60, height as i32 / 2);
    let radius = (height.min(width) as i32 / 2 - 30).max(10) as f64;

    let mut start_angle = -std::f64::consts::FRAC_PI_2;
    for (i, (label, value)) in result.groups.iter().enumerate() {
        let sweep = value / total * std::f64::consts::TAU;
        let steps = ((sweep * radius) as usize / 4).max(2);

        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for step in 0..=steps {
            let angle = start_angle + sweep * step as f64 / steps as f64;
            points.push((
                center.0 + (radius * angle.cos()).round() as i32,
                center.1 + (radius * angle.sin()).round() as i32,
            ));
        }
        root_area
            .draw(&Polygon::new(points, series_color(i).filled()))
            .map_err(wrap_err)?;

        // Slice label at the mid angle
        let mid_angle = start_angle + sweep / 2.0;
        let label_pos = (
            center.0 + (radius * 0.65 * mid_angle.cos()).round() as i32,
            center.1 + (radius * 0.65 * mid_angle.sin()).round() as i32,
        );
        root_area
            .draw(&Text::new(
                label.clone(),
                label_pos,
                ("sans-serif", 15).into_font().color(&theme.text_color),
            ))
            .map_err(wrap_err)?;

        start_angle += sweep;
    }

    // Legend along the right edge
    for (i, (label, value)) in result.groups.iter().enumerate() {
        let x = width as i32 - 130;
        let y = 20 + i as i32 * 22;
        root_area
            .draw(&Rectangle::new(
                [(x, y), (x + 14, y + 14)],
                series_color(i).filled(),
            ))
            .map_err(wrap_err)?;
        root_area
            .draw(&Text::new(
                format!("{} ({:.0})", label, value),
                (x + 20, y + 2),
                ("sans-serif", 14).into_font().color(&theme.text_color),
            ))
            .map_err(wrap_err)?;
    }

    Ok(())
}

/// Configure the shared category-axis mesh for bar and line charts
fn configure_category_mesh(
    chart_builder: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    result: &AnalysisResult,
    theme: &ChartTheme,
) -> Result<(), PlotError> {
    let labels: Vec<String> = result.groups.iter().map(|(label, _)| label.clone()).collect();
    let x_label_formatter = move |x: &f64| {
        let idx = x.round() as usize;
        if (x - idx as f64).abs() < 1e-6 && idx < labels.len() {
            labels[idx].clone()
        } else {
            String::new()
        }
    };

    let mut mesh = chart_builder.configure_mesh();
    mesh.light_line_style(TRANSPARENT)
        .bold_line_style(theme.grid_color)
        .axis_style(theme.axis_color)
        .x_desc(&result.x_label)
        .y_desc(&result.y_label)
        .label_style(("sans-serif", 15).into_font().color(&theme.text_color))
        .x_labels(result.groups.len().min(12))
        .x_label_formatter(&x_label_formatter)
        // Rotate x labels for better readability
        .x_label_style(
            ("sans-serif", 15)
                .into_font()
                .color(&theme.text_color)
                .transform(FontTransform::Rotate90)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        );

    if result.percent_axis {
        mesh.y_label_formatter(&|y| format!("{:.2}%", y));
    } else {
        // Use K/M formatting for large numbers
        mesh.y_label_formatter(&|y| {
            if y.abs() >= 1_000_000.0 {
                format!("{:.1}M", y / 1_000_000.0)
            } else if y.abs() >= 1_000.0 {
                format!("{:.1}K", y / 1_000.0)
            } else {
                format!("{:.0}", y)
            }
        });
    }

    mesh.draw()?;

    Ok(())
}

/// Value-axis range with p95 outlier clipping, so one dominant group does
/// not flatten the rest of the chart.
pub(super) fn calculate_adaptive_range(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Exclude at least the top value when estimating the normal range
    let p95_idx = (sorted.len() * 95 / 100).min(sorted.len().saturating_sub(2));
    let normal_max = sorted[p95_idx];
    let absolute_max = sorted[sorted.len() - 1];

    if absolute_max > normal_max * 2.0 {
        (0.0, (normal_max * 1.2).max(1.0))
    } else {
        (0.0, (absolute_max * 1.1).max(1.0))
    }
}
