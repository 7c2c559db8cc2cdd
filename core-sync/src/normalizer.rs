//! Front matter → `Document` normalization.
//!
//! Applies every default once, at ingestion, and records a
//! [`ValidationWarning`] for each field that needed one.

use bridge_traits::time::Clock;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core_library::models::{Category, Document};
use tracing::warn;

use crate::error::ValidationWarning;
use crate::front_matter::FrontMatter;

pub const MISSING_TITLE: &str = "No title available.";
pub const MISSING_DESCRIPTION: &str = "No description available.";

const PUBLIC_PREFIX: &str = "public/";

/// A normalized document and the defaults applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub document: Document,
    pub warnings: Vec<ValidationWarning>,
}

/// Build the stored form of a published document.
pub fn normalize(path: &str, front_matter: &FrontMatter, clock: &dyn Clock) -> NormalizedDocument {
    let mut warnings = Vec::new();

    let title = front_matter.title.clone().unwrap_or_else(|| {
        warnings.push(ValidationWarning::new(path, "title", "missing, using placeholder"));
        MISSING_TITLE.to_string()
    });

    let description = front_matter.description.clone().unwrap_or_else(|| {
        warnings.push(ValidationWarning::new(
            path,
            "description",
            "missing, using placeholder",
        ));
        MISSING_DESCRIPTION.to_string()
    });

    let category = match front_matter.category.as_deref() {
        None => {
            warnings.push(ValidationWarning::new(
                path,
                "category",
                "missing, using Uncategorized",
            ));
            Category::Uncategorized
        }
        Some(raw) => Category::parse(raw).unwrap_or_else(|| {
            warnings.push(ValidationWarning::new(
                path,
                "category",
                format!("unknown category '{}', using Uncategorized", raw),
            ));
            Category::Uncategorized
        }),
    };

    let date_published = match front_matter.date_published.as_deref() {
        None => {
            warnings.push(ValidationWarning::new(
                path,
                "datePublished",
                "missing, using current time",
            ));
            clock.now()
        }
        Some(raw) => parse_date(raw).unwrap_or_else(|| {
            warnings.push(ValidationWarning::new(
                path,
                "datePublished",
                format!("invalid date '{}', using current time", raw),
            ));
            clock.now()
        }),
    };

    for warning in &warnings {
        warn!(path = %warning.path, field = %warning.field, "{}", warning.message);
    }

    NormalizedDocument {
        document: Document {
            file_path: path.to_string(),
            title,
            subtitle: front_matter.subtitle.clone(),
            category,
            description,
            tags: front_matter.tags.clone(),
            date_published,
            narration: front_matter.narration.clone(),
            audio_file: front_matter
                .audio_file
                .as_deref()
                .and_then(normalize_audio_path),
            pinned: front_matter.pinned,
            hidden: front_matter.hidden,
        },
        warnings,
    }
}

/// Rewrite an authored audio path to root-relative form.
///
/// # Examples
///
/// ```
/// use core_sync::normalizer::normalize_audio_path;
///
/// assert_eq!(normalize_audio_path("public/audio/a.mp3").as_deref(), Some("/audio/a.mp3"));
/// assert_eq!(normalize_audio_path("audio/a.mp3").as_deref(), Some("/audio/a.mp3"));
/// assert_eq!(normalize_audio_path("//audio/a.mp3").as_deref(), Some("/audio/a.mp3"));
/// assert_eq!(normalize_audio_path("  "), None);
/// ```
pub fn normalize_audio_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let relative = trimmed
        .strip_prefix(PUBLIC_PREFIX)
        .unwrap_or(trimmed)
        .trim_start_matches('/');

    if relative.is_empty() {
        return None;
    }

    Some(format!("/{}", relative))
}

/// Parse the date formats authors use, interpreting zone-less values as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    const NAIVE_DATE_TIMES: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_DATE_TIMES {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    const DATES: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];
    for format in DATES {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::ManualClock;
    use chrono::TimeZone;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 30, 0).unwrap())
    }

    fn published() -> FrontMatter {
        FrontMatter {
            title: Some("Song".into()),
            category: Some("Music".into()),
            description: Some("A tune".into()),
            date_published: Some("2024-05-01".into()),
            published: true,
            ..FrontMatter::default()
        }
    }

    #[test]
    fn test_complete_front_matter_has_no_warnings() {
        let mut fm = published();
        fm.audio_file = Some("public/audio/song.mp3".into());
        fm.tags = vec!["jazz".into()];

        let normalized = normalize("music/jazz/song.md", &fm, &clock());
        assert!(normalized.warnings.is_empty());

        let doc = normalized.document;
        assert_eq!(doc.category, Category::Music);
        assert_eq!(doc.audio_file.as_deref(), Some("/audio/song.mp3"));
        assert_eq!(
            doc.date_published,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_get_defaults_and_warnings() {
        let fm = FrontMatter {
            published: true,
            ..FrontMatter::default()
        };

        let normalized = normalize("a.md", &fm, &clock());
        let doc = &normalized.document;

        assert_eq!(doc.title, MISSING_TITLE);
        assert_eq!(doc.description, MISSING_DESCRIPTION);
        assert_eq!(doc.category, Category::Uncategorized);
        assert_eq!(doc.date_published, clock().now());
        assert!(doc.tags.is_empty());
        assert!(!doc.pinned);

        let fields: Vec<_> = normalized.warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description", "category", "datePublished"]);
    }

    #[test]
    fn test_unknown_category_and_bad_date() {
        let mut fm = published();
        fm.category = Some("Recipes".into());
        fm.date_published = Some("someday".into());

        let normalized = normalize("a.md", &fm, &clock());
        assert_eq!(normalized.document.category, Category::Uncategorized);
        assert_eq!(normalized.document.date_published, clock().now());
        assert_eq!(normalized.warnings.len(), 2);
    }

    #[test]
    fn test_audio_path_forms() {
        assert_eq!(normalize_audio_path("/audio/a.mp3").as_deref(), Some("/audio/a.mp3"));
        assert_eq!(normalize_audio_path("public//audio/a.mp3").as_deref(), Some("/audio/a.mp3"));
        assert_eq!(normalize_audio_path("a.mp3").as_deref(), Some("/a.mp3"));
        assert_eq!(normalize_audio_path("public/"), None);
        assert_eq!(normalize_audio_path(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(parse_date("2024-03-09T14:05:00Z"), Some(expected));
        assert_eq!(parse_date("2024-03-09T16:05:00+02:00"), Some(expected));
        assert_eq!(parse_date("2024-03-09 14:05:00"), Some(expected));
        assert_eq!(parse_date("2024-03-09T14:05"), Some(expected));

        let midnight = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(midnight));
        assert_eq!(parse_date("March 9, 2024"), Some(midnight));
        assert_eq!(parse_date("2024-13-40"), None);
        assert_eq!(parse_date(""), None);
    }
}
