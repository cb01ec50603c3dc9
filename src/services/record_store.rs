use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};

use crate::error::{AppError, AppResult};
use crate::models::category::{Appetite, Category, Confidence};
use crate::models::diary::{events_from_body, DiaryMetadata, DiaryRecord, WriteMode};
use crate::services::frontmatter::{self, Header};
use crate::services::scanner;

pub const RECORD_EXTENSION: &str = "md";

/// One markdown file per calendar day, named `YYYYMMDD.md`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_dir: PathBuf,
}

impl RecordStore {
    /// Opens the store, creating `base_dir` if it does not exist yet.
    pub fn open(base_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            tracing::info!(path = %base_dir.display(), "Creating diary directory");
            fs::create_dir_all(&base_dir)?;
        }
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_name(date: NaiveDate) -> String {
        format!("{}.{}", date.format("%Y%m%d"), RECORD_EXTENSION)
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.base_dir.join(Self::file_name(date))
    }

    pub fn exists(&self, date: NaiveDate) -> bool {
        self.path_for(date).is_file()
    }

    /// Writes the record for `date`.
    ///
    /// `CreateNew` refuses to touch an existing file and returns
    /// [`AppError::Conflict`]. `Overwrite` replaces the whole file through a
    /// temp file and rename, so readers never see a half-written record.
    pub fn write(
        &self,
        date: NaiveDate,
        meta: &DiaryMetadata,
        body: &str,
        mode: WriteMode,
    ) -> AppResult<PathBuf> {
        let mut meta = meta.clone();
        match meta.recorded_at {
            Some(at) if at.date() != date => {
                return Err(AppError::Validation(format!(
                    "Record timestamp {at} does not fall on {date}"
                )));
            }
            Some(_) => {}
            None => meta.recorded_at = Some(date.and_time(NaiveTime::MIN)),
        }

        let path = self.path_for(date);
        let mut content = frontmatter::render_header(&meta)?;
        content.push_str(body);

        match mode {
            WriteMode::CreateNew => {
                let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(f) => f,
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        tracing::info!(path = %path.display(), "Diary already exists");
                        return Err(AppError::Conflict(format!(
                            "Diary for {date} already exists"
                        )));
                    }
                    Err(e) => return Err(e.into()),
                };
                file.write_all(content.as_bytes())?;
                file.sync_all()?;
            }
            WriteMode::Overwrite => {
                let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
                if let Err(e) = fs::write(&tmp, content.as_bytes()) {
                    let _ = fs::remove_file(&tmp);
                    return Err(e.into());
                }
                if let Err(e) = fs::rename(&tmp, &path) {
                    let _ = fs::remove_file(&tmp);
                    return Err(e.into());
                }
            }
        }

        tracing::info!(path = %path.display(), mode = ?mode, "Diary written");
        Ok(path)
    }

    pub fn read(&self, date: NaiveDate) -> AppResult<DiaryRecord> {
        let path = self.path_for(date);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("No diary for {date}")));
            }
            Err(e) => return Err(e.into()),
        };

        let doc = frontmatter::split_document(&content);
        Ok(DiaryRecord {
            date,
            metadata: metadata_from(&doc.header),
            events: events_from_body(doc.body),
            body: doc.body.to_string(),
        })
    }
}

pub(crate) fn metadata_from(header: &Header) -> DiaryMetadata {
    DiaryMetadata {
        recorded_at: header
            .date
            .as_deref()
            .and_then(scanner::parse_header_datetime),
        location: header.location.clone(),
        emotion: category_from(frontmatter::KEY_EMOTION, header.emotion.as_deref()),
        appetite: category_from::<Appetite>(frontmatter::KEY_APPETITE, header.appetite.as_deref()),
        confidence: category_from::<Confidence>(
            frontmatter::KEY_CONFIDENCE,
            header.confidence.as_deref(),
        ),
    }
}

fn category_from<C: Category>(key: &str, raw: Option<&str>) -> Option<C> {
    let raw = raw?;
    let value = C::from_label(raw);
    if value.is_none() {
        tracing::debug!(key = key, value = raw, "Ignoring unknown category value");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::Emotion;
    use chrono::NaiveDateTime;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN)
    }

    fn full_meta(date: NaiveDate) -> DiaryMetadata {
        DiaryMetadata {
            recorded_at: Some(date.and_hms_opt(21, 5, 0).unwrap()),
            location: Some("Library: 3rd floor, \"quiet\" room".into()),
            emotion: Some(Emotion::Flow),
            appetite: Some(Appetite::Spicy),
            confidence: Some(Confidence::SelfDoubt),
        }
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 5, 4);
        let meta = full_meta(date);
        let body = "## 今日随笔\n\nLine one\nLine two: with colon\n";

        let path = store.write(date, &meta, body, WriteMode::CreateNew).unwrap();
        assert_eq!(path.file_name().unwrap(), "20260504.md");

        let record = store.read(date).unwrap();
        assert_eq!(record.date, date);
        assert_eq!(record.metadata, meta);
        assert_eq!(record.body, body);
    }

    #[test]
    fn test_omitted_fields_read_back_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 5, 5);
        let meta = DiaryMetadata {
            recorded_at: Some(midnight(date)),
            emotion: Some(Emotion::Sad),
            ..Default::default()
        };

        store.write(date, &meta, "", WriteMode::CreateNew).unwrap();
        let record = store.read(date).unwrap();
        assert_eq!(record.metadata, meta);
        assert_eq!(record.metadata.location, None);
        assert_eq!(record.body, "");
    }

    #[test]
    fn test_duplicate_write_is_conflict_and_leaves_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 3, 1);
        let meta = DiaryMetadata {
            recorded_at: None,
            location: None,
            emotion: Some(Emotion::Happy),
            appetite: Some(Appetite::Steady),
            confidence: Some(Confidence::Confident),
        };

        let path = store.write(date, &meta, "", WriteMode::CreateNew).unwrap();
        let original = fs::read_to_string(&path).unwrap();
        assert!(original.contains("Date: 2026-03-01T00:00:00"));
        assert!(original.contains("Emotion: 开心😊"));
        assert!(original.contains("Appetite: 食欲稳定🥗"));
        assert!(original.contains("Confidence: 自信满满"));

        let other = DiaryMetadata {
            emotion: Some(Emotion::Angry),
            ..meta.clone()
        };
        let err = store
            .write(date, &other, "changed", WriteMode::CreateNew)
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_overwrite_replaces_whole_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 3, 1);

        store
            .write(date, &full_meta(date), "a long original body\n", WriteMode::CreateNew)
            .unwrap();
        let replacement = DiaryMetadata {
            recorded_at: Some(midnight(date)),
            emotion: Some(Emotion::Calm),
            ..Default::default()
        };
        store
            .write(date, &replacement, "short", WriteMode::Overwrite)
            .unwrap();

        let record = store.read(date).unwrap();
        assert_eq!(record.metadata, replacement);
        assert_eq!(record.body, "short");
        assert!(!dir.path().join("20260301.md.tmp").exists());
    }

    #[test]
    fn test_timestamp_must_match_date() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let meta = full_meta(day(2026, 1, 2));
        let err = store
            .write(day(2026, 1, 3), &meta, "", WriteMode::CreateNew)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!store.exists(day(2026, 1, 3)));
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.read(day(2026, 1, 1)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_tolerates_unknown_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 2, 2);
        fs::write(
            store.path_for(date),
            "---\nDate: whenever\nEmotion: meh\nWeather: rain\n---\n\ntext",
        )
        .unwrap();

        let record = store.read(date).unwrap();
        assert_eq!(record.metadata, DiaryMetadata::default());
        assert_eq!(record.body, "text");
    }

    #[test]
    fn test_sub_second_timestamp_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 3, 1);
        let meta = DiaryMetadata {
            recorded_at: date.and_hms_nano_opt(21, 5, 7, 123_456_789),
            ..full_meta(date)
        };

        store.write(date, &meta, "", WriteMode::CreateNew).unwrap();
        assert_eq!(store.read(date).unwrap().metadata, meta);
    }

    #[test]
    fn test_empty_location_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 3, 2);
        let meta = DiaryMetadata {
            recorded_at: Some(midnight(date)),
            location: Some(String::new()),
            ..Default::default()
        };

        store.write(date, &meta, "", WriteMode::CreateNew).unwrap();
        assert_eq!(store.read(date).unwrap().metadata.location.as_deref(), Some(""));
    }

    #[test]
    fn test_read_ignores_trailing_yaml_comment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 2, 3);
        fs::write(
            store.path_for(date),
            "---\nDate: 2026-02-03T08:00:00\nEmotion: 开心😊 # good day\n---\n\n",
        )
        .unwrap();

        let record = store.read(date).unwrap();
        assert_eq!(record.metadata.emotion, Some(Emotion::Happy));
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordStore::open(dir.path()).unwrap();
        let date = day(2026, 3, 1);
        // a non-empty directory at the target path cannot be replaced by a file
        let blocker = store.path_for(date);
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        let err = store
            .write(date, &full_meta(date), "body", WriteMode::Overwrite)
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(!dir.path().join("20260301.md.tmp").exists());
        assert!(blocker.join("keep").is_file());
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = RecordStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.base_dir(), nested.as_path());
    }
}
