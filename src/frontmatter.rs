//! Frontmatter codec
//!
//! A note on disk is three segments: an opening `---` line, a YAML metadata
//! block closed by another `---` line, and the markdown body. The body of a
//! serialized note starts with a `# <title>` heading which `parse` strips
//! again, so `parse(serialize(n)) == n`.
//!
//! Every function here is pure; reading and writing files is the store's job.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::constants as C;
use crate::error::{Error, Result};

/// Typed view of a note's metadata block.
///
/// Known keys get fields; everything else lands in `extra` in its original
/// order and is written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "string_list", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(
        default,
        rename = "lastmod",
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<String>,

    /// Kept as written; see [`Frontmatter::is_draft`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<Value>,

    #[serde(default, deserialize_with = "string_list", skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Mapping,
}

impl Frontmatter {
    /// Metadata for a freshly created note
    pub fn new(title: &str, tags: Vec<String>, today: NaiveDate) -> Self {
        let stamp = today.format(C::DATE_FORMAT).to_string();
        Self {
            title: Some(title.to_string()),
            tags: Some(tags),
            date: Some(stamp.clone()),
            last_modified: Some(stamp),
            draft: Some(Value::Bool(false)),
            ..Default::default()
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn connections(&self) -> &[String] {
        self.connected_to.as_deref().unwrap_or(&[])
    }

    /// Whether `draft` is set to a true-like value (`true`, `yes`, `on`, `1`)
    pub fn is_draft(&self) -> bool {
        self.draft.as_ref().and_then(draft_flag).unwrap_or(false)
    }

    /// The `date` field as a calendar date, if it is in an accepted format
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    /// The `lastmod` field as a calendar date
    pub fn parsed_last_modified(&self) -> Option<NaiveDate> {
        self.last_modified.as_deref().and_then(parse_date)
    }

    /// Check the fields every stored note must carry
    pub fn validate(&self) -> Result<()> {
        self.required_title()?;
        match self.date.as_deref().map(str::trim) {
            None | Some("") => Err(Error::Validation(format!("missing required field: {}", C::KEY_DATE))),
            Some(_) => Ok(()),
        }
    }

    /// The title, which must be present and fit on the heading line
    pub fn required_title(&self) -> Result<&str> {
        match self.title() {
            None => Err(Error::Validation(format!("missing required field: {}", C::KEY_TITLE))),
            Some(t) if t.contains(['\n', '\r']) => {
                Err(Error::Validation("title must be a single line".to_string()))
            }
            Some(t) => Ok(t),
        }
    }

    /// Canonical form: dates as `YYYY-MM-DD`, tags trimmed and lower-cased,
    /// bool-like `draft` strings turned into booleans.
    ///
    /// Unparseable dates and draft values are left alone. Applying this twice is the same as
    /// applying it once.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.date = self.date.as_deref().map(normalize_date);
        out.last_modified = self.last_modified.as_deref().map(normalize_date);
        if let Some(flag) = self.draft.as_ref().and_then(draft_flag) {
            out.draft = Some(Value::Bool(flag));
        }
        out.tags = self.tags.as_ref().map(|tags| {
            tags.iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        });
        out
    }
}

/// A parsed note file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Document {
    /// Serialize using the frontmatter's own title for the heading
    pub fn render(&self) -> Result<String> {
        serialize(&self.frontmatter, self.frontmatter.title().unwrap_or_default(), &self.body)
    }
}

/// Parse a note into metadata and body
pub fn parse(text: &str) -> Result<Document> {
    let (yaml, rest) = split(text)?;
    let frontmatter: Frontmatter = decode(yaml)?;
    let body = strip_title_heading(rest, frontmatter.title());
    Ok(Document {
        frontmatter,
        body: trim_blank_lines(body).to_string(),
    })
}

/// Render metadata, a `# title` heading and the body as note text
pub fn serialize(frontmatter: &Frontmatter, title: &str, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    let mut out = format!("{d}\n{yaml}{d}\n\n# {title}\n", d = C::DELIMITER);
    let body = trim_blank_lines(body);
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    Ok(out)
}

/// Add `value` under `key`.
///
/// An existing sequence is appended to; any other existing value (or a
/// missing key) is replaced by the one-element sequence `[value]`. Repeated
/// connects accumulate under `connected_to` this way. The body is kept
/// byte-for-byte.
pub fn update_field(text: &str, key: &str, value: &str) -> Result<String> {
    let (yaml, rest) = split(text)?;
    let mut mapping: Mapping = decode(yaml)?;
    let item = Value::String(value.to_string());

    match mapping.get_mut(key) {
        Some(Value::Sequence(seq)) => seq.push(item),
        _ => {
            mapping.insert(Value::String(key.to_string()), Value::Sequence(vec![item]));
        }
    }

    reassemble(&mapping, rest)
}

/// Replace the value under `key` outright
pub fn set_field(text: &str, key: &str, value: Value) -> Result<String> {
    let (yaml, rest) = split(text)?;
    let mut mapping: Mapping = decode(yaml)?;
    mapping.insert(Value::String(key.to_string()), value);
    reassemble(&mapping, rest)
}

/// Rewrite the metadata block in normalized form, keeping the body bytes
pub fn normalize(text: &str) -> Result<String> {
    let (yaml, rest) = split(text)?;
    let frontmatter: Frontmatter = decode(yaml)?;
    reassemble(&frontmatter.normalized(), rest)
}

/// Parse a date in any accepted format (including RFC 3339 timestamps)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    C::ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn draft_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Some(true),
            "false" | "no" | "n" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn normalize_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(date) => date.format(C::DATE_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

/// Split note text into the raw metadata block and everything after the
/// closing delimiter line.
fn split(text: &str) -> Result<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().unwrap_or_default();
    if first.trim_end() != C::DELIMITER {
        return Err(Error::MalformedDocument(format!(
            "expected an opening '{}' line",
            C::DELIMITER
        )));
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == C::DELIMITER {
            return Ok((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(Error::MalformedDocument(format!(
        "expected a closing '{}' line after the metadata block",
        C::DELIMITER
    )))
}

fn decode<T: for<'de> Deserialize<'de> + Default>(yaml: &str) -> Result<T> {
    // Check frontmatter size before parsing
    if yaml.len() > C::MAX_FRONTMATTER_SIZE {
        return Err(Error::MalformedDocument(format!(
            "metadata block exceeds {} bytes",
            C::MAX_FRONTMATTER_SIZE
        )));
    }
    if yaml.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

fn reassemble<T: Serialize>(metadata: &T, rest: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("{d}\n{yaml}{d}\n{rest}", d = C::DELIMITER))
}

/// Drop the generated `# <title>` heading if it is the first non-blank line
fn strip_title_heading<'a>(body: &'a str, title: Option<&str>) -> &'a str {
    let Some(title) = title else {
        return body;
    };
    let trimmed = body.trim_start_matches(['\n', '\r']);
    let (first, rest) = match trimmed.find('\n') {
        Some(pos) => (&trimmed[..pos], &trimmed[pos + 1..]),
        None => (trimmed, ""),
    };
    match first.trim_end().strip_prefix("# ") {
        Some(heading) if heading.trim() == title => rest,
        _ => body,
    }
}

/// Remove leading and trailing whitespace-only lines, keeping indentation
/// of the first real line.
pub(crate) fn trim_blank_lines(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    text[start..].trim_end()
}

fn scalar_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a scalar, found {}", kind(&other)))),
    }
}

fn string_list<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Vec<String>>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s])),
        Some(Value::Sequence(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(D::Error::custom(format!(
                    "expected a list of strings, found {} item",
                    kind(&other)
                ))),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(D::Error::custom(format!("expected a list, found {}", kind(&other)))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
