use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{Local, NaiveDate};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::category::{Appetite, Category, Confidence, Emotion};
use crate::models::diary::{
    CreateDiaryRequest, DiaryDraft, DiaryRecord, HistoryEntry, SaveDiaryResponse, WriteMode,
};
use crate::services::scanner;
use crate::AppState;

/// Maps an optional label from the request onto its enum. Blank means unset,
/// anything outside the domain is rejected.
fn parse_category<C: Category>(field: &str, raw: Option<&str>) -> AppResult<Option<C>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(label) => C::from_label(label)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Unknown {field} value: {label}"))),
    }
}

fn parse_date_param(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|_| AppError::Validation(format!("Invalid date: {raw}")))
}

pub async fn save_diary(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<CreateDiaryRequest>, AppError>,
) -> AppResult<Json<SaveDiaryResponse>> {
    body.validate()?;

    let now = Local::now().naive_local();
    let date = body.date.unwrap_or(now.date());

    let draft = DiaryDraft {
        date,
        recorded_at: (date == now.date()).then_some(now),
        location: body.location,
        emotion: parse_category::<Emotion>("emotion", body.emotion.as_deref())?,
        appetite: parse_category::<Appetite>("appetite", body.appetite.as_deref())?,
        confidence: parse_category::<Confidence>("confidence", body.confidence.as_deref())?,
        events: body.events,
        journal: body.diary,
        exercise: body.exercise,
    };
    let (meta, content) = draft.compose(&state.config.default_location);

    let mode = if body.overwrite {
        WriteMode::Overwrite
    } else {
        WriteMode::CreateNew
    };
    let store = state.store.clone();
    let path = tokio::task::spawn_blocking(move || store.write(date, &meta, &content, mode))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    Ok(Json(SaveDiaryResponse {
        message: "Diary saved successfully.".into(),
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }))
}

pub async fn get_diary(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Json<DiaryRecord>> {
    let date = parse_date_param(&date)?;
    let store = state.store.clone();
    let record = tokio::task::spawn_blocking(move || store.read(date))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(Json(record))
}

/// Every scanned record, newest first.
pub async fn list_history(State(state): State<AppState>) -> AppResult<Json<Vec<HistoryEntry>>> {
    let records_dir = state.store.base_dir().to_path_buf();
    let mut records = tokio::task::spawn_blocking(move || scanner::scan(&records_dir))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    records.sort_by(|a, b| b.date.cmp(&a.date));

    let history = records
        .into_iter()
        .map(|r| HistoryEntry {
            date: r.date,
            emotion: r.emotion,
            appetite: r.appetite,
            confidence: r.confidence,
        })
        .collect();

    Ok(Json(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category::<Emotion>("emotion", None).unwrap(), None);
        assert_eq!(parse_category::<Emotion>("emotion", Some(" ")).unwrap(), None);
        assert_eq!(
            parse_category::<Confidence>("confidence", Some("自我怀疑")).unwrap(),
            Some(Confidence::SelfDoubt)
        );
        assert!(matches!(
            parse_category::<Appetite>("appetite", Some("hungry")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_date_param() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parse_date_param("2026-03-01").unwrap(), expected);
        assert_eq!(parse_date_param("20260301").unwrap(), expected);
        assert!(parse_date_param("yesterday").is_err());
    }
}
