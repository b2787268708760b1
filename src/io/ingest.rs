//! CSV ingest and conditioning.
//!
//! This module turns a heterogeneous cycling-data CSV into a clean
//! `(cycle, capacity)` series that is safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (drop bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness, no re-ordering)
//! - **Separation of concerns**: no fitting logic here
//!
//! Conditioning rules:
//! - headers are matched case- and whitespace-insensitively (`" Cycle "` and
//!   `"CAPACITY"` resolve to `cycle` / `capacity`); no other aliasing
//! - a row is dropped when any column is empty, the cycle is negative or not
//!   integer-valued, or the capacity is non-positive/non-finite
//! - surviving rows keep their input order; the conditioner never sorts

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{CyclePoint, CycleSeries};
use crate::error::AppError;

/// Summary stats about the points actually used for fitting.
#[derive(Debug, Clone, Copy)]
pub struct SeriesStats {
    pub n_points: usize,
    pub cycle_min: u32,
    pub cycle_max: u32,
    pub capacity_min: f64,
    pub capacity_max: f64,
}

/// A row-level problem encountered during conditioning.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Conditioning output: the clean series + stats + row diagnostics.
#[derive(Debug, Clone)]
pub struct ConditionedData {
    pub series: CycleSeries,
    pub stats: SeriesStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load and condition a cycling CSV into a `CycleSeries`.
pub fn load_cycle_series(path: &Path) -> Result<ConditionedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::contract(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::contract(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let cycle_idx = header_map["cycle"];
    let capacity_idx = header_map["capacity"];
    let n_columns = headers.len();

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match condition_row(&record, cycle_idx, capacity_idx, n_columns) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = points.len();
    let stats = compute_stats(&points).ok_or_else(|| {
        AppError::no_data("No valid rows remain after conditioning.")
    })?;

    Ok(ConditionedData {
        series: CycleSeries::new(points),
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿cycle"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    if !header_map.contains_key("cycle") {
        return Err(AppError::contract("Missing required column: `cycle`"));
    }
    if !header_map.contains_key("capacity") {
        return Err(AppError::contract("Missing required column: `capacity`"));
    }
    Ok(())
}

fn condition_row(
    record: &StringRecord,
    cycle_idx: usize,
    capacity_idx: usize,
    n_columns: usize,
) -> Result<CyclePoint, String> {
    // A missing value in *any* column drops the row, matching the contract
    // of the conditioner (extra metadata columns included).
    for col in 0..n_columns {
        let empty = record.get(col).map(str::trim).is_none_or(str::is_empty);
        if empty {
            return Err(format!("Missing value in column {}", col + 1));
        }
    }

    let cycle_raw = record
        .get(cycle_idx)
        .map(str::trim)
        .ok_or_else(|| "Missing `cycle` value.".to_string())?;
    let capacity_raw = record
        .get(capacity_idx)
        .map(str::trim)
        .ok_or_else(|| "Missing `capacity` value.".to_string())?;

    let cycle = parse_cycle(cycle_raw)?;

    let capacity: f64 = capacity_raw
        .parse()
        .map_err(|_| format!("Invalid `capacity` value '{capacity_raw}'."))?;
    if !capacity.is_finite() {
        return Err("Non-finite `capacity` value.".to_string());
    }
    if capacity <= 0.0 {
        return Err(format!("Non-positive capacity {capacity} (bad reading)."));
    }

    Ok(CyclePoint { cycle, capacity })
}

/// Parse an integer-like cycle number.
///
/// Exports frequently store cycle counts as reals (`"12.0"`); those are
/// accepted as long as the value is a non-negative integer.
fn parse_cycle(raw: &str) -> Result<u32, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `cycle` value '{raw}'."))?;
    if !value.is_finite() {
        return Err("Non-finite `cycle` value.".to_string());
    }
    if value < 0.0 {
        return Err(format!("Negative cycle number {value}."));
    }
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(format!("Cycle number {value} is not a valid integer."));
    }
    Ok(value as u32)
}

fn compute_stats(points: &[CyclePoint]) -> Option<SeriesStats> {
    let first = points.first()?;
    let mut stats = SeriesStats {
        n_points: points.len(),
        cycle_min: first.cycle,
        cycle_max: first.cycle,
        capacity_min: first.capacity,
        capacity_max: first.capacity,
    };

    for p in points {
        stats.cycle_min = stats.cycle_min.min(p.cycle);
        stats.cycle_max = stats.cycle_max.max(p.cycle);
        stats.capacity_min = stats.capacity_min.min(p.capacity);
        stats.capacity_max = stats.capacity_max.max(p.capacity);
    }

    Some(stats)
}
