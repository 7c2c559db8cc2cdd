//! # Front Matter Parsing
//!
//! Reads the YAML header of a content file into [`FrontMatter`].
//!
//! Parsing is lenient about scalar types (a numeric title is still a title)
//! and strict about structure: the header must be a YAML mapping, and an
//! opening `---` without a closing one is an error.

use core_library::content::split_front_matter;
use serde_yaml::{Mapping, Value};

use crate::error::{Result, SyncError};

/// Raw header fields as authored. Nothing is defaulted here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub date_published: Option<String>,
    pub narration: Option<String>,
    pub audio_file: Option<String>,
    pub pinned: bool,
    pub hidden: bool,
    /// Only a literal YAML `true` publishes a document
    pub published: bool,
}

/// A content file split into its header and markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Parse a raw content file.
///
/// A file without a header parses to an empty [`FrontMatter`], which is
/// unpublished.
///
/// # Errors
///
/// `SyncError::Parse` for an unclosed header, invalid YAML, or a header that
/// is not a mapping.
pub fn parse_document(path: &str, raw: &str) -> Result<ParsedDocument> {
    let block = split_front_matter(raw).map_err(|e| SyncError::parse(path, e.to_string()))?;

    let front_matter = match block.header {
        Some(header) => FrontMatter::from_yaml(path, header)?,
        None => FrontMatter::default(),
    };

    Ok(ParsedDocument {
        front_matter,
        body: block.body.to_string(),
    })
}

impl FrontMatter {
    pub fn from_yaml(path: &str, header: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(header).map_err(|e| SyncError::parse(path, e.to_string()))?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(FrontMatter::default()),
            other => {
                return Err(SyncError::parse(
                    path,
                    format!("front matter must be a mapping, found {}", kind(&other)),
                ))
            }
        };

        Ok(FrontMatter {
            title: text(&mapping, "title"),
            subtitle: text(&mapping, "subtitle"),
            category: text(&mapping, "category"),
            description: text(&mapping, "description"),
            tags: tags(&mapping),
            date_published: text(&mapping, "datePublished"),
            narration: text(&mapping, "narration"),
            audio_file: text(&mapping, "audioFile"),
            pinned: truthy(mapping.get("pinned")),
            hidden: truthy(mapping.get("hidden")),
            published: matches!(mapping.get("published"), Some(Value::Bool(true))),
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar(&tagged.value),
        _ => None,
    }
}

/// Non-blank scalar value of `key`, trimmed.
fn text(mapping: &Mapping, key: &str) -> Option<String> {
    mapping
        .get(key)
        .and_then(scalar)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `tags` as a sequence of scalars or one scalar.
fn tags(mapping: &Mapping) -> Vec<String> {
    let values: Vec<String> = match mapping.get("tags") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar).collect(),
        Some(other) => scalar(other).into_iter().collect(),
        None => Vec::new(),
    };

    values
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = "---\n\
title: Song\n\
category: Music\n\
description: A tune\n\
datePublished: 2024-05-01\n\
tags: [jazz, personalWebsite]\n\
audioFile: public/audio/song.mp3\n\
published: true\n\
---\n\
Lyrics here\n";

    #[test]
    fn test_parse_full_header() {
        let parsed = parse_document("music/jazz/song.md", SONG).unwrap();
        let fm = parsed.front_matter;

        assert_eq!(fm.title.as_deref(), Some("Song"));
        assert_eq!(fm.category.as_deref(), Some("Music"));
        assert_eq!(fm.tags, vec!["jazz", "personalWebsite"]);
        assert_eq!(fm.date_published.as_deref(), Some("2024-05-01"));
        assert_eq!(fm.audio_file.as_deref(), Some("public/audio/song.mp3"));
        assert!(fm.published);
        assert!(!fm.pinned);
        assert_eq!(parsed.body, "Lyrics here\n");
    }

    #[test]
    fn test_published_requires_literal_true() {
        let quoted = "---\ntitle: A\npublished: \"true\"\n---\n";
        assert!(!parse_document("a.md", quoted).unwrap().front_matter.published);

        let missing = "---\ntitle: A\n---\n";
        assert!(!parse_document("a.md", missing).unwrap().front_matter.published);
    }

    #[test]
    fn test_no_header_is_unpublished() {
        let parsed = parse_document("a.md", "# Draft\n").unwrap();
        assert_eq!(parsed.front_matter, FrontMatter::default());
        assert_eq!(parsed.body, "# Draft\n");
    }

    #[test]
    fn test_single_string_tag() {
        let raw = "---\ntags: piano\npinned: yes\nhidden: 1\n---\n";
        let fm = parse_document("a.md", raw).unwrap().front_matter;
        assert_eq!(fm.tags, vec!["piano"]);
        assert!(!fm.pinned, "Only boolean-like values should pin");
        assert!(fm.hidden);
    }

    #[test]
    fn test_scalar_coercion() {
        let raw = "---\ntitle: 2024\ndescription: '  '\n---\n";
        let fm = parse_document("a.md", raw).unwrap().front_matter;
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.description, None, "Blank values count as missing");
    }

    #[test]
    fn test_malformed_headers_are_parse_errors() {
        let unclosed = "---\ntitle: A\nno end";
        assert!(matches!(
            parse_document("a.md", unclosed),
            Err(SyncError::Parse { .. })
        ));

        let invalid = "---\ntitle: [unterminated\n---\n";
        assert!(matches!(
            parse_document("a.md", invalid),
            Err(SyncError::Parse { .. })
        ));

        let list = "---\n- a\n- b\n---\n";
        assert!(matches!(
            parse_document("a.md", list),
            Err(SyncError::Parse { .. })
        ));
    }
}
