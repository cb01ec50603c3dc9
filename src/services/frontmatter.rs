//! The `---` fenced YAML header that opens every daily record.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::AppResult;
use crate::models::category::Category;
use crate::models::diary::DiaryMetadata;

pub const DELIMITER: &str = "---";

pub const KEY_DATE: &str = "Date";
pub const KEY_LOCATION: &str = "Location";
pub const KEY_EMOTION: &str = "Emotion";
pub const KEY_CONFIDENCE: &str = "Confidence";
pub const KEY_APPETITE: &str = "Appetite";

/// Fractional seconds are only written when present.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Raw header values as written on disk, before any domain parsing.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub struct Header {
    #[serde(rename = "Date", alias = "date", default, deserialize_with = "scalar")]
    pub date: Option<String>,
    #[serde(rename = "Location", alias = "location", default, deserialize_with = "scalar")]
    pub location: Option<String>,
    #[serde(rename = "Emotion", alias = "emotion", default, deserialize_with = "scalar")]
    pub emotion: Option<String>,
    #[serde(rename = "Confidence", alias = "confidence", default, deserialize_with = "scalar")]
    pub confidence: Option<String>,
    #[serde(rename = "Appetite", alias = "appetite", default, deserialize_with = "scalar")]
    pub appetite: Option<String>,
}

/// Any YAML scalar as text; `null` and nested values count as absent.
fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// A record file split into its header and the text after the header.
#[derive(Debug, PartialEq)]
pub struct Document<'a> {
    pub header: Header,
    pub body: &'a str,
}

/// Serialises the header, closing delimiter and blank separator line
/// included. `None` fields are left out.
pub fn render_header(meta: &DiaryMetadata) -> AppResult<String> {
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');

    let mut push = |key: &str, value: String| {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&value);
        out.push('\n');
    };

    if let Some(at) = meta.recorded_at {
        push(KEY_DATE, at.format(DATE_FORMAT).to_string());
    }
    if let Some(location) = &meta.location {
        push(KEY_LOCATION, yaml_scalar(location)?);
    }
    if let Some(emotion) = meta.emotion {
        push(KEY_EMOTION, yaml_scalar(emotion.label())?);
    }
    if let Some(confidence) = meta.confidence {
        push(KEY_CONFIDENCE, yaml_scalar(confidence.label())?);
    }
    if let Some(appetite) = meta.appetite {
        push(KEY_APPETITE, yaml_scalar(appetite.label())?);
    }

    out.push_str(DELIMITER);
    out.push_str("\n\n");
    Ok(out)
}

/// `value` as a YAML scalar, quoted or block-styled only when it needs to be.
fn yaml_scalar(value: &str) -> AppResult<String> {
    let rendered = serde_yaml::to_string(value).map_err(anyhow::Error::from)?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

/// Splits `content` into header and body. A file without a terminated
/// header is all body; a header that is not valid YAML reads as empty.
pub fn split_document(content: &str) -> Document<'_> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let no_header = Document {
        header: Header::default(),
        body: content,
    };

    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return no_header;
    };
    if first.trim_end() != DELIMITER {
        return no_header;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        let line_start = offset;
        offset += line.len();
        if line.trim_end() == DELIMITER {
            let rest = &content[offset..];
            let body = rest
                .strip_prefix("\r\n")
                .or_else(|| rest.strip_prefix('\n'))
                .unwrap_or(rest);
            return Document {
                header: parse_header(&content[start..line_start]),
                body,
            };
        }
    }

    no_header
}

fn parse_header(yaml: &str) -> Header {
    if yaml.trim().is_empty() {
        return Header::default();
    }
    match serde_yaml::from_str(yaml) {
        Ok(header) => header,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unparseable record header");
            Header::default()
        }
    }
}
