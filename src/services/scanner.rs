use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::AppResult;
use crate::models::category::CategoryRecord;
use crate::services::frontmatter;
use crate::services::record_store::{metadata_from, RECORD_EXTENSION};

type DateStrategy = fn(&str) -> Option<NaiveDateTime>;

/// Tried in order against the header `Date` value; first hit wins.
const HEADER_DATE_STRATEGIES: &[DateStrategy] = &[from_rfc3339, from_iso_datetime, from_plain_date];

fn from_rfc3339(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local())
}

fn from_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .into_iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn from_plain_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn parse_header_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    HEADER_DATE_STRATEGIES.iter().find_map(|parse| parse(raw))
}

/// Date encoded in a `YYYYMMDD.md` file name, if the name has that shape.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(stem, "%Y%m%d").ok()
}

fn is_record_file_name(name: &str) -> bool {
    name.strip_suffix(RECORD_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .is_some_and(|stem| stem.len() == 8 && stem.bytes().all(|b| b.is_ascii_digit()))
}

/// Reads the header of every daily record under `dir`.
///
/// Best effort: unreadable files and files whose date cannot be resolved
/// from either the header or the file name are skipped. Order follows the
/// directory listing and carries no meaning.
pub fn scan(dir: &Path) -> AppResult<Vec<CategoryRecord>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %dir.display(), "Diary directory missing, nothing to scan");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(collect_records(
        dir,
        entries.map(|entry| entry.map(|e| e.path())),
    ))
}

/// Scans each listed path in turn. A listing error only costs that entry.
fn collect_records<I>(dir: &Path, entries: I) -> Vec<CategoryRecord>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "Skipping unreadable directory entry");
                skipped += 1;
                continue;
            }
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_record_file_name(name) || !path.is_file() {
            continue;
        }

        match scan_file(&path, name) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    tracing::debug!(
        path = %dir.display(),
        found = records.len(),
        skipped = skipped,
        "Diary scan complete"
    );
    records
}

fn scan_file(path: &Path, name: &str) -> Option<CategoryRecord> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable diary");
            return None;
        }
    };

    let doc = frontmatter::split_document(&content);
    let meta = metadata_from(&doc.header);
    let date = meta
        .recorded_at
        .map(|at| at.date())
        .or_else(|| date_from_file_name(name));
    let Some(date) = date else {
        tracing::debug!(path = %path.display(), "Skipping diary without a usable date");
        return None;
    };

    Some(CategoryRecord {
        date,
        emotion: meta.emotion,
        appetite: meta.appetite,
        confidence: meta.confidence,
    })
}
