use axum::{extract::State, Json};

use crate::models::diary::CalendarEvent;
use crate::AppState;

/// Today's calendar events. A failing source yields an empty list.
pub async fn get_today_events(State(state): State<AppState>) -> Json<Vec<CalendarEvent>> {
    Json(state.events.events_or_empty().await)
}
