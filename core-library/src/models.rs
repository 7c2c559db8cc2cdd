//! Domain models for the content store
//!
//! `Document` is the validated, typed form of a synced markdown file. The
//! database row (`PostRow`) keeps tags as a JSON array and dates as RFC 3339
//! strings; conversion between the two happens only here.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::error::LibraryError;

// =============================================================================
// Category
// =============================================================================

/// Closed set of post categories with their presentation metadata.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Home,
    Blog,
    Articles,
    Music,
    AiTools,
    Experience,
    Education,
    Notes,
    #[default]
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Home,
        Category::Blog,
        Category::Articles,
        Category::Music,
        Category::AiTools,
        Category::Experience,
        Category::Education,
        Category::Notes,
        Category::Uncategorized,
    ];

    /// Stable identifier stored in the database and used in query strings.
    pub fn id(&self) -> &'static str {
        match self {
            Category::Home => "home",
            Category::Blog => "blog",
            Category::Articles => "articles",
            Category::Music => "music",
            Category::AiTools => "aiTools",
            Category::Experience => "experience",
            Category::Education => "education",
            Category::Notes => "notes",
            Category::Uncategorized => "uncategorized",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Home => "Home",
            Category::Blog => "Blog",
            Category::Articles => "Articles",
            Category::Music => "Music",
            Category::AiTools => "AI Tools",
            Category::Experience => "Experience",
            Category::Education => "Education",
            Category::Notes => "Notes",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Icon name understood by the front end.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Home => "FaHome",
            Category::Blog => "FaBlog",
            Category::Articles => "FaNewspaper",
            Category::Music => "FaMusic",
            Category::AiTools => "FaRobot",
            Category::Experience => "FaBriefcase",
            Category::Education => "FaGraduationCap",
            Category::Notes => "FaStickyNote",
            Category::Uncategorized => "FaStickyNote",
        }
    }

    pub fn subheading(&self) -> &'static str {
        match self {
            Category::Home => "Welcome to my personal website",
            Category::Blog => "Thoughts and insights on technology and life",
            Category::Articles => "In-depth explorations of various topics",
            Category::Music => "Melodies, rhythms, and AI-generated tunes",
            Category::AiTools => "Exploring the frontiers of artificial intelligence",
            Category::Experience => "My journey through the tech industry",
            Category::Education => "Learning never stops in the world of tech",
            Category::Notes => "Quick thoughts and observations",
            Category::Uncategorized => "Everything else",
        }
    }

    /// Parse an id or display name, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for blank or unknown values; callers decide whether
    /// that means `Uncategorized`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::models::Category;
    ///
    /// assert_eq!(Category::parse("AI Tools"), Some(Category::AiTools));
    /// assert_eq!(Category::parse("aitools"), Some(Category::AiTools));
    /// assert_eq!(Category::parse("recipes"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Category> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        Category::ALL.into_iter().find(|category| {
            category.id().eq_ignore_ascii_case(value)
                || category.display_name().eq_ignore_ascii_case(value)
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// Timestamps
// =============================================================================

/// Canonical stored form: RFC 3339, UTC, millisecond precision, `Z` suffix.
///
/// Every stored value has the same width, so lexical order matches
/// chronological order and `ORDER BY date_published` works on the text.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|parsed| parsed.with_timezone(&Utc))
}

// =============================================================================
// Document
// =============================================================================

/// A published post as held by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Path relative to the content root; the identity key
    pub file_path: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub category: Category,
    pub description: String,
    pub tags: Vec<String>,
    pub date_published: DateTime<Utc>,
    pub narration: Option<String>,
    /// Root-relative audio path such as `/audio/song.mp3`
    pub audio_file: Option<String>,
    pub pinned: bool,
    pub hidden: bool,
}

impl Document {
    /// Minimal document with defaults for every optional field.
    pub fn new(
        file_path: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        date_published: DateTime<Utc>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            title: title.into(),
            subtitle: None,
            category: Category::Uncategorized,
            description: description.into(),
            tags: Vec::new(),
            date_published,
            narration: None,
            audio_file: None,
            pinned: false,
            hidden: false,
        }
    }

    /// Validate document data
    pub fn validate(&self) -> Result<(), String> {
        if self.file_path.trim().is_empty() {
            return Err("Document file path cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err(format!("Document {} has an empty title", self.file_path));
        }

        if let Some(audio) = &self.audio_file {
            if !audio.starts_with('/') {
                return Err(format!(
                    "Audio reference {} must be root-relative",
                    audio
                ));
            }
        }

        Ok(())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Slug used in post URLs: the file path without its `.md` extension.
    pub fn slug(&self) -> &str {
        self.file_path
            .strip_suffix(".md")
            .unwrap_or(&self.file_path)
    }
}

/// Raw `posts` row.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: i64,
    pub file_path: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub category: String,
    pub description: String,
    pub tags: String,
    pub date_published: String,
    pub narration: Option<String>,
    pub audio_file: Option<String>,
    pub pinned: bool,
    pub hidden: bool,
}

impl TryFrom<PostRow> for Document {
    type Error = LibraryError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> =
            serde_json::from_str(&row.tags).map_err(|e| LibraryError::CorruptRow {
                file_path: row.file_path.clone(),
                message: format!("tags: {}", e),
            })?;

        let date_published =
            parse_timestamp(&row.date_published).map_err(|e| LibraryError::CorruptRow {
                file_path: row.file_path.clone(),
                message: format!("date_published: {}", e),
            })?;

        Ok(Document {
            category: Category::parse(&row.category).unwrap_or_default(),
            file_path: row.file_path,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            tags,
            date_published,
            narration: row.narration,
            audio_file: row.audio_file,
            pinned: row.pinned,
            hidden: row.hidden,
        })
    }
}

/// A document together with its markdown body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub document: Document,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(tags: &str, date: &str) -> PostRow {
        PostRow {
            id: 1,
            file_path: "blog/hello.md".to_string(),
            title: "Hello".to_string(),
            subtitle: None,
            category: "aiTools".to_string(),
            description: "d".to_string(),
            tags: tags.to_string(),
            date_published: date.to_string(),
            narration: None,
            audio_file: None,
            pinned: true,
            hidden: false,
        }
    }

    #[test]
    fn test_category_parse_accepts_id_and_display_name() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.id()), Some(category));
            assert_eq!(Category::parse(category.display_name()), Some(category));
            assert_eq!(
                Category::parse(&category.id().to_uppercase()),
                Some(category)
            );
        }
        assert_eq!(Category::parse("  Music "), Some(Category::Music));
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::parse("cooking"), None);
    }

    #[test]
    fn test_category_serde_uses_ids() {
        let json = serde_json::to_string(&Category::AiTools).unwrap();
        assert_eq!(json, "\"aiTools\"");
        let back: Category = serde_json::from_str("\"experience\"").unwrap();
        assert_eq!(back, Category::Experience);
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let early = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 11, 12, 13, 14, 15).unwrap();

        let a = format_timestamp(&early);
        let b = format_timestamp(&late);
        assert_eq!(a, "2023-01-02T03:04:05.000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&a).unwrap(), early);
    }

    #[test]
    fn test_row_conversion() {
        let doc = Document::try_from(row(r#"["jazz","piano"]"#, "2024-05-01T10:00:00.000Z"))
            .unwrap();
        assert_eq!(doc.tags, vec!["jazz", "piano"]);
        assert_eq!(doc.category, Category::AiTools);
        assert!(doc.pinned);
        assert!(doc.has_tag("jazz"));
        assert!(!doc.has_tag("jaz"));
        assert_eq!(doc.slug(), "blog/hello");
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_tags() {
        let err = Document::try_from(row("not json", "2024-05-01T10:00:00.000Z")).unwrap_err();
        assert!(matches!(err, LibraryError::CorruptRow { .. }));

        let err = Document::try_from(row("[]", "yesterday")).unwrap_err();
        assert!(matches!(err, LibraryError::CorruptRow { .. }));
    }

    #[test]
    fn test_document_validation() {
        let now = Utc::now();
        let mut doc = Document::new("a.md", "A", "desc", now);
        assert!(doc.validate().is_ok());

        doc.audio_file = Some("audio/x.mp3".to_string());
        assert!(doc.validate().is_err(), "Relative audio path should be rejected");

        doc.audio_file = Some("/audio/x.mp3".to_string());
        doc.title = "  ".to_string();
        assert!(doc.validate().is_err(), "Blank title should be rejected");
    }

    #[test]
    fn test_post_serializes_flat() {
        let doc = Document::new(
            "a.md",
            "A",
            "desc",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        let post = Post {
            document: doc,
            content: "body".to_string(),
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["filePath"], "a.md");
        assert_eq!(value["content"], "body");
        assert_eq!(value["category"], "uncategorized");
    }
}
