//! Front-matter splitting and attribute parsing.
//!
//! A content file starts with a delimited header followed by the body:
//!
//! ```text
//! ---                         +++
//! title: Hello                title = "Hello"
//! publishedAt: 2024-06-01     published_at = 2024-06-01
//! ---                         +++
//! Body text...                Body text...
//! ```
//!
//! `---` headers are YAML, `+++` headers are TOML. Both are normalized into
//! [`Attributes`], so callers never see which syntax a post used.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

const YAML_DELIMITER: &str = "---";
const TOML_DELIMITER: &str = "+++";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("missing front-matter header (expected `---` or `+++` on the first line)")]
    Missing,

    #[error("front-matter header opened with `{0}` is never closed")]
    Unterminated(&'static str),

    #[error("front-matter is not a key/value mapping")]
    NotAMapping,

    #[error("invalid YAML front-matter")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML front-matter")]
    Toml(#[from] toml::de::Error),
}

/// Header key/value pairs of a content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Deserialize the attributes into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

#[cfg(test)]
impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A content file split into header attributes and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub attributes: Attributes,
    pub body: String,
}

/// Split `text` into front-matter attributes and body.
///
/// Pure: the same input always yields the same [`Parsed`] value.
pub fn parse(text: &str) -> Result<Parsed, FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let (first, rest) = split_line(text);
    let delimiter = match first.trim_end() {
        YAML_DELIMITER => YAML_DELIMITER,
        TOML_DELIMITER => TOML_DELIMITER,
        _ => return Err(FrontMatterError::Missing),
    };

    let (header, body) = find_closing(rest, delimiter)?;
    let attributes = if header.trim().is_empty() {
        Attributes::default()
    } else if delimiter == YAML_DELIMITER {
        parse_yaml(header)?
    } else {
        parse_toml(header)?
    };

    Ok(Parsed {
        attributes,
        body: body.to_owned(),
    })
}

/// Split off the first line, dropping its line terminator.
fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(i) => (text[..i].trim_end_matches('\r'), &text[i + 1..]),
        None => (text, ""),
    }
}

/// Locate the closing delimiter line; returns `(header, body)`.
fn find_closing<'a>(
    rest: &'a str,
    delimiter: &'static str,
) -> Result<(&'a str, &'a str), FrontMatterError> {
    let mut offset = 0;
    let mut remaining = rest;

    while !remaining.is_empty() {
        let (line, after) = split_line(remaining);
        if line.trim_end() == delimiter {
            return Ok((&rest[..offset], after));
        }
        offset += remaining.len() - after.len();
        remaining = after;
    }

    Err(FrontMatterError::Unterminated(delimiter))
}

fn parse_yaml(header: &str) -> Result<Attributes, FrontMatterError> {
    match serde_yaml::from_str::<Value>(header)? {
        Value::Object(map) => Ok(Attributes(map)),
        Value::Null => Ok(Attributes::default()),
        _ => Err(FrontMatterError::NotAMapping),
    }
}

fn parse_toml(header: &str) -> Result<Attributes, FrontMatterError> {
    let table: toml::Table = toml::from_str(header)?;
    let map = table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect();
    Ok(Attributes(map))
}

/// TOML datetimes become their RFC 3339 text so both syntaxes agree.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
