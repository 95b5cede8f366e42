//! ## Dashboard Stage
//!
//! Renders static SVG charts from the processed data:
//!
//! - `daily_trip_volume.svg`: trips per day summed across vendors (from the summary CSV),
//! - `trip_distance_distribution.svg`: histogram of trip distances (from the cleaned CSV),
//! - `fare_amount_distribution.svg`: histogram of fare amounts (from the cleaned CSV).

use crate::exceptions::{ensure_dir, EtlError, EtlResult};
use crate::schema::{read_rows, CleanedTrip, TripSummary};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DAILY_VOLUME_CHART: &str = "daily_trip_volume.svg";
pub const DISTANCE_CHART: &str = "trip_distance_distribution.svg";
pub const FARE_CHART: &str = "fare_amount_distribution.svg";
pub const HISTOGRAM_BINS: usize = 50;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const SALMON: RGBColor = RGBColor(250, 128, 114);

fn chart_err<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::ChartError(e.to_string())
}

/// Sums `trips_count` per date across vendors, ordered by date.
pub fn daily_volume(summaries: &[TripSummary]) -> Vec<(String, i64)> {
    let mut daily: BTreeMap<&str, i64> = BTreeMap::new();
    for s in summaries {
        *daily.entry(s.pickup_date.as_str()).or_default() += s.trips_count;
    }
    daily.into_iter().map(|(d, n)| (d.to_string(), n)).collect()
}

/// One histogram bin: `[lower, upper)` and its count.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Splits the range of `values` into `bins` equal-width bins. The maximum falls in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

fn draw_daily_volume(path: &Path, daily: &[(String, i64)]) -> EtlResult<()> {
    let root = SVGBackend::new(path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let max_y = daily.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    let max_x = (daily.len() as i32 - 1).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Trip Volume (all vendors)", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..max_x, 0i64..(max_y + max_y / 10 + 1))
        .map_err(chart_err)?;
    let label = |x: &i32| {
        daily
            .get(*x as usize)
            .map(|(d, _)| d.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Number of Trips")
        .x_labels(daily.len().clamp(2, 16))
        .x_label_formatter(&label)
        .draw()
        .map_err(chart_err)?;
    let points: Vec<(i32, i64)> = daily
        .iter()
        .enumerate()
        .map(|(i, (_, n))| (i as i32, *n))
        .collect();
    chart
        .draw_series(LineSeries::new(points.clone(), &BLUE))
        .map_err(chart_err)?;
    chart
        .draw_series(points.into_iter().map(|p| Circle::new(p, 3, BLUE.filled())))
        .map_err(chart_err)?;
    root.present().map_err(chart_err)?;
    Ok(())
}

fn draw_histogram(path: &Path, title: &str, x_desc: &str, bins: &[Bin], color: RGBColor) -> EtlResult<()> {
    let root = SVGBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let (lo, hi) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.lower, last.upper),
        _ => (0.0, 1.0),
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(lo..hi, 0f64..max_count * 1.1)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Frequency")
        .draw()
        .map_err(chart_err)?;
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], color.filled())
        }))
        .map_err(chart_err)?;
    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], BLACK.stroke_width(1))
        }))
        .map_err(chart_err)?;
    root.present().map_err(chart_err)?;
    Ok(())
}

/// Renders the three charts into `output_dir` and returns their paths.
pub fn build_charts(cleaned_csv: &Path, summary_csv: &Path, output_dir: &Path) -> EtlResult<Vec<PathBuf>> {
    ensure_dir(output_dir)?;
    let summaries: Vec<TripSummary> = read_rows(summary_csv)?;
    let trips: Vec<CleanedTrip> = read_rows(cleaned_csv)?;

    let volume_path = output_dir.join(DAILY_VOLUME_CHART);
    draw_daily_volume(&volume_path, &daily_volume(&summaries))?;

    let distances: Vec<f64> = trips.iter().map(|t| t.trip_distance).collect();
    let distance_path = output_dir.join(DISTANCE_CHART);
    draw_histogram(
        &distance_path,
        "Distribution of Trip Distances",
        "Trip Distance (miles)",
        &histogram(&distances, HISTOGRAM_BINS),
        SKY_BLUE,
    )?;

    let fares: Vec<f64> = trips.iter().map(|t| t.fare_amount).collect();
    let fare_path = output_dir.join(FARE_CHART);
    draw_histogram(
        &fare_path,
        "Distribution of Fare Amounts",
        "Fare Amount (USD)",
        &histogram(&fares, HISTOGRAM_BINS),
        SALMON,
    )?;

    Ok(vec![volume_path, distance_path, fare_path])
}
