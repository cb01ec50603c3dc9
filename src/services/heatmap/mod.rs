//! Yearly calendar heatmaps of the category fields.
//!
//! Colors and legend order come from the fixed domain of each field, so a
//! value is drawn in the same color whatever else was recorded that year.

pub mod canvas;
pub mod glyphs;
pub mod grid;

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::category::{CategoryField, CategoryRecord};
use crate::services::scanner;

use grid::HeatmapGrid;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Written(PathBuf),
    /// Nothing recorded for the field in that year; no file touched.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Written,
    Skipped,
    Failed,
}

/// Result of generating one field's heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub field: CategoryField,
    pub status: FieldStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn file_name(year: i32, field: CategoryField) -> String {
    format!("{year}_{}.png", field.as_str())
}

/// Inverse of [`file_name`]; anything else is rejected.
pub fn parse_file_name(name: &str) -> Option<(i32, CategoryField)> {
    let stem = name.strip_suffix(".png")?;
    let (year, field) = stem.split_once('_')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((year.parse().ok()?, CategoryField::parse(field)?))
}

/// Renders the `field` heatmap for `year` to `out_path` as PNG.
pub fn render(
    records: &[CategoryRecord],
    year: i32,
    field: CategoryField,
    out_path: &Path,
) -> AppResult<RenderOutcome> {
    let grid = HeatmapGrid::build(records, year, field)
        .ok_or_else(|| AppError::Validation(format!("Year {year} is out of range")))?;
    if grid.is_empty() {
        tracing::info!(year = year, field = %field, "No data for heatmap, skipping");
        return Ok(RenderOutcome::Skipped);
    }

    let domain = field.domain();
    let palette: Vec<[u8; 3]> = domain.iter().map(|(_, color)| *color).collect();
    let legend: Vec<canvas::LegendEntry> = grid
        .observed()
        .into_iter()
        .filter_map(|idx| domain.get(idx).copied())
        .collect();

    let img = canvas::draw(&grid, &palette, &legend);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    img.save_with_format(out_path, ImageFormat::Png)?;

    tracing::info!(path = %out_path.display(), "Heatmap saved");
    Ok(RenderOutcome::Written(out_path.to_path_buf()))
}

/// Writes heatmaps for every category field into one output directory.
#[derive(Debug, Clone)]
pub struct HeatmapGenerator {
    out_dir: PathBuf,
}

impl HeatmapGenerator {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    #[cfg(test)]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn path_for(&self, year: i32, field: CategoryField) -> PathBuf {
        self.out_dir.join(file_name(year, field))
    }

    /// Scans `records_dir` and renders each field independently; a failure
    /// on one field is reported and the others still run.
    pub fn generate_all(&self, records_dir: &Path, year: i32) -> AppResult<Vec<FieldReport>> {
        let records = scanner::scan(records_dir)?;
        if records.is_empty() {
            tracing::info!(path = %records_dir.display(), "No diary metadata found, skipping heatmaps");
        }
        Ok(self.render_fields(&records, year))
    }

    pub fn render_fields(&self, records: &[CategoryRecord], year: i32) -> Vec<FieldReport> {
        CategoryField::ALL
            .into_iter()
            .map(|field| {
                if records.is_empty() {
                    return FieldReport {
                        field,
                        status: FieldStatus::Skipped,
                        file: None,
                        error: None,
                    };
                }
                match render(records, year, field, &self.path_for(year, field)) {
                    Ok(RenderOutcome::Written(path)) => FieldReport {
                        field,
                        status: FieldStatus::Written,
                        file: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                        error: None,
                    },
                    Ok(RenderOutcome::Skipped) => FieldReport {
                        field,
                        status: FieldStatus::Skipped,
                        file: None,
                        error: None,
                    },
                    Err(e) => {
                        tracing::error!(field = %field, year = year, error = %e, "Heatmap generation failed");
                        FieldReport {
                            field,
                            status: FieldStatus::Failed,
                            file: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }
}
