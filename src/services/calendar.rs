use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::diary::CalendarEvent;

/// Where today's calendar events come from.
#[derive(Debug, Clone)]
pub enum EventSource {
    /// No calendar configured; always empty.
    Disabled,
    /// JSON array of events served over HTTP.
    Http { client: reqwest::Client, url: String },
    /// JSON array of events exported to a local file.
    File(PathBuf),
}

impl EventSource {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let Some(target) = config.calendar_events_url.as_deref() else {
            return Ok(Self::Disabled);
        };
        if let Some(path) = target.strip_prefix("file://") {
            return Ok(Self::File(PathBuf::from(path)));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.calendar_timeout_secs))
            .build()
            .map_err(|e| AppError::ExternalSource(e.to_string()))?;
        Ok(Self::Http {
            client,
            url: target.to_string(),
        })
    }

    pub async fn today(&self) -> AppResult<Vec<CalendarEvent>> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Http { client, url } => {
                let response = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| AppError::ExternalSource(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(AppError::ExternalSource(format!(
                        "calendar feed returned {}",
                        response.status()
                    )));
                }
                response
                    .json::<Vec<CalendarEvent>>()
                    .await
                    .map_err(|e| AppError::ExternalSource(e.to_string()))
            }
            Self::File(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| AppError::ExternalSource(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&raw).map_err(|e| AppError::ExternalSource(e.to_string()))
            }
        }
    }

    /// Today's events, or an empty list when the source fails.
    pub async fn events_or_empty(&self) -> Vec<CalendarEvent> {
        match self.today().await {
            Ok(mut events) => {
                events.sort_by_key(|e| e.start);
                events
            }
            Err(e) => {
                tracing::warn!(error = %e, "Calendar events unavailable, continuing without them");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_is_empty() {
        let source = EventSource::from_config(&Config::with_base_dir("/tmp/unused")).unwrap();
        assert!(matches!(source, EventSource::Disabled));
        assert!(source.today().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_source_sorts_by_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.json");
        std::fs::write(
            &path,
            r#"[{"subject":"Lunch","start":"12:00","end":"13:00"},
                {"subject":"Standup","start":"2026-03-01 09:00:00","end":"2026-03-01 09:15:00"}]"#,
        )
        .unwrap();

        let mut config = Config::with_base_dir(dir.path());
        config.calendar_events_url = Some(format!("file://{}", path.display()));
        let source = EventSource::from_config(&config).unwrap();

        let events = source.events_or_empty().await;
        let subjects: Vec<_> = events.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Standup", "Lunch"]);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = EventSource::File(dir.path().join("missing.json"));
        assert!(matches!(source.today().await, Err(AppError::ExternalSource(_))));
        assert!(source.events_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_http_feed_degrades_to_empty() {
        let mut config = Config::with_base_dir("/tmp/unused");
        // port 9 (discard) on localhost is closed in test environments
        config.calendar_events_url = Some("http://127.0.0.1:9/events".into());
        config.calendar_timeout_secs = 2;
        let source = EventSource::from_config(&config).unwrap();
        assert!(source.events_or_empty().await.is_empty());
    }
}
