//! Run configuration: repository identity, option flags, and the chapter
//! definitions that drive classification.
//!
//! Everything here is validated once at the boundary; the engine receives an
//! immutable [`GeneratorConfig`] and never re-checks inputs.

use serde_json::Value;
use thiserror::Error;

/// Default label that excludes an item from release notes entirely.
pub const DEFAULT_SKIP_LABEL: &str = "skip-release-notes";

/// Configuration errors. All of these are fatal and abort the run before any
/// network access.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Repository identifier is not of the form `owner/name`.
    #[error("repository must be of the form 'owner/name', got '{0}'")]
    InvalidRepository(String),

    /// Tag name is empty or whitespace.
    #[error("tag name must be a non-empty string")]
    EmptyTagName,

    /// Skip label is empty or whitespace.
    #[error("skip-release-notes label must be a non-empty string")]
    EmptySkipLabel,

    /// Chapter definitions are not valid JSON or not a JSON array.
    #[error("chapters must be a JSON array of {{\"title\", \"label\"}} records: {0}")]
    InvalidChapters(String),

    /// One chapter record is missing a required string field.
    #[error("chapter record #{index} is missing a string '{field}' field")]
    ChapterField {
        /// Zero-based position of the offending record.
        index: usize,
        /// Name of the missing or non-string field.
        field: &'static str,
    },
}

/// Owner/name pair identifying one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoId {
    /// Parses an `owner/name` identifier, rejecting empty halves.
    pub fn parse(repository: &str) -> Result<Self, ConfigError> {
        let Some((owner, name)) = repository.split_once('/') else {
            return Err(ConfigError::InvalidRepository(repository.to_string()));
        };
        if owner.trim().is_empty() || name.trim().is_empty() || name.contains('/') {
            return Err(ConfigError::InvalidRepository(repository.to_string()));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns the `owner/name` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One thematic chapter: a display title plus the labels that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Display/grouping key of the chapter.
    pub title: String,
    /// Labels mapping into this chapter, in definition order.
    pub labels: Vec<String>,
}

impl Chapter {
    /// Returns whether any of the given item labels selects this chapter.
    pub fn matches(&self, item_labels: &[String]) -> bool {
        self.labels.iter().any(|l| item_labels.contains(l))
    }
}

/// Ordered chapter definitions parsed from the `chapters` input.
///
/// Multiple records may share a title; their labels accumulate on the first
/// occurrence so configuration order is also display order.
#[derive(Debug, Clone, Default)]
pub struct Chapters {
    chapters: Vec<Chapter>,
}

impl Chapters {
    /// Parses the JSON chapter definition list.
    ///
    /// An empty array is valid and yields a report with no thematic
    /// chapters. Malformed input (not an array, or a record without string
    /// `title`/`label` fields) is a [`ConfigError`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidChapters(e.to_string()))?;
        let Value::Array(records) = value else {
            return Err(ConfigError::InvalidChapters(format!(
                "expected an array, got {}",
                json_kind(&value)
            )));
        };

        let mut chapters: Vec<Chapter> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let title = record
                .get("title")
                .and_then(Value::as_str)
                .ok_or(ConfigError::ChapterField {
                    index,
                    field: "title",
                })?;
            let label = record
                .get("label")
                .and_then(Value::as_str)
                .ok_or(ConfigError::ChapterField {
                    index,
                    field: "label",
                })?;

            match chapters.iter_mut().find(|c| c.title == title) {
                Some(chapter) => {
                    if !chapter.labels.iter().any(|l| l == label) {
                        chapter.labels.push(label.to_string());
                    }
                }
                None => chapters.push(Chapter {
                    title: title.to_string(),
                    labels: vec![label.to_string()],
                }),
            }
        }

        Ok(Self { chapters })
    }

    /// Iterates chapters in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter()
    }

    /// Returns whether no chapters are defined.
    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Number of distinct chapter titles.
    pub fn len(&self) -> usize {
        self.chapters.len()
    }
}

/// Validated run configuration, built once at the CLI boundary and passed by
/// reference into the engine.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Target repository.
    pub repository: RepoId,
    /// Tag name of the release being described.
    pub tag_name: String,
    /// Thematic chapter definitions.
    pub chapters: Chapters,
    /// Render the anomaly (warning) sections.
    pub warnings: bool,
    /// Use the latest release's publish time instead of its creation time as
    /// the activity cutoff.
    pub use_published_at: bool,
    /// Items carrying this label are excluded at the data-provider boundary.
    pub skip_release_notes_label: String,
    /// Render placeholder text for empty chapters and anomaly sections.
    pub print_empty_chapters: bool,
    /// Classify unlinked merged PRs into chapters by their own labels.
    pub chapters_to_pr_without_issue: bool,
}

impl GeneratorConfig {
    /// Checks field-level invariants that clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tag_name.trim().is_empty() {
            return Err(ConfigError::EmptyTagName);
        }
        if self.skip_release_notes_label.trim().is_empty() {
            return Err(ConfigError::EmptySkipLabel);
        }
        Ok(())
    }
}

/// Human-readable JSON value kind for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tag: &str, skip: &str) -> GeneratorConfig {
        GeneratorConfig {
            repository: RepoId::parse("owner/repo").unwrap(),
            tag_name: tag.to_string(),
            chapters: Chapters::default(),
            warnings: true,
            use_published_at: false,
            skip_release_notes_label: skip.to_string(),
            print_empty_chapters: true,
            chapters_to_pr_without_issue: true,
        }
    }

    #[test]
    fn repo_id_parses_owner_and_name() {
        let id = RepoId::parse("absa/release-tools").unwrap();
        assert_eq!(id.owner, "absa");
        assert_eq!(id.name, "release-tools");
        assert_eq!(id.full_name(), "absa/release-tools");
    }

    #[test]
    fn repo_id_rejects_malformed() {
        assert!(RepoId::parse("no-slash").is_err());
        assert!(RepoId::parse("/repo").is_err());
        assert!(RepoId::parse("owner/").is_err());
        assert!(RepoId::parse("a/b/c").is_err());
    }

    #[test]
    fn chapters_accumulate_labels_per_title() {
        let chapters = Chapters::from_json(
            r#"[
                {"title": "New Features 🎉", "label": "enhancement"},
                {"title": "Bugfixes 🛠", "label": "bug"},
                {"title": "New Features 🎉", "label": "feature"}
            ]"#,
        )
        .unwrap();

        assert_eq!(chapters.len(), 2);
        let features = chapters.iter().next().unwrap();
        assert_eq!(features.title, "New Features 🎉");
        assert_eq!(features.labels, vec!["enhancement", "feature"]);
    }

    #[test]
    fn chapters_empty_array_is_valid() {
        let chapters = Chapters::from_json("[]").unwrap();
        assert!(chapters.is_empty());
    }

    #[test]
    fn chapters_reject_non_array() {
        let err = Chapters::from_json(r#"{"title": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChapters(_)));
        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn chapters_reject_invalid_json() {
        assert!(matches!(
            Chapters::from_json("not json"),
            Err(ConfigError::InvalidChapters(_))
        ));
    }

    #[test]
    fn chapters_name_missing_field() {
        let err = Chapters::from_json(r#"[{"title": "Bugfixes"}]"#).unwrap_err();
        match err {
            ConfigError::ChapterField { index, field } => {
                assert_eq!(index, 0);
                assert_eq!(field, "label");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn chapters_reject_non_string_field() {
        let err = Chapters::from_json(r#"[{"title": 7, "label": "bug"}]"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ChapterField { field: "title", .. }
        ));
    }

    #[test]
    fn chapter_matches_on_label_intersection() {
        let chapter = Chapter {
            title: "Bugfixes".to_string(),
            labels: vec!["bug".to_string(), "hotfix".to_string()],
        };
        assert!(chapter.matches(&["docs".to_string(), "bug".to_string()]));
        assert!(!chapter.matches(&["docs".to_string()]));
    }

    #[test]
    fn validate_rejects_blank_tag() {
        assert!(matches!(
            config("  ", DEFAULT_SKIP_LABEL).validate(),
            Err(ConfigError::EmptyTagName)
        ));
    }

    #[test]
    fn validate_rejects_blank_skip_label() {
        assert!(matches!(
            config("v1.0.0", "").validate(),
            Err(ConfigError::EmptySkipLabel)
        ));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(config("v1.0.0", DEFAULT_SKIP_LABEL).validate().is_ok());
    }
}
