use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::heatmap::{self, FieldReport};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateHeatmapsRequest {
    /// Defaults to the current year
    #[validate(range(min = 1970, max = 9999, message = "Year must be between 1970 and 9999"))]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateHeatmapsResponse {
    pub year: i32,
    pub fields: Vec<FieldReport>,
}

pub async fn generate_heatmaps(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<GenerateHeatmapsRequest>, AppError>,
) -> AppResult<Json<GenerateHeatmapsResponse>> {
    body.validate()?;
    let year = body.year.unwrap_or_else(|| Local::now().year());

    let generator = state.heatmaps.clone();
    let records_dir = state.store.base_dir().to_path_buf();
    let fields = tokio::task::spawn_blocking(move || generator.generate_all(&records_dir, year))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    Ok(Json(GenerateHeatmapsResponse { year, fields }))
}

/// Serves a generated image. Only names of the form `<year>_<Field>.png`
/// are accepted.
pub async fn serve_heatmap(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (year, field) = heatmap::parse_file_name(&filename)
        .ok_or_else(|| AppError::Validation(format!("Invalid heatmap name: {filename}")))?;

    let path = state.heatmaps.path_for(year, field);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Heatmap {filename} not generated")));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}
