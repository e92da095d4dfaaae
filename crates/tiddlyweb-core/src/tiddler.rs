//! Tiddlers: titled, revisioned units of text.
//!
//! A tiddler is identified by `(bag, title, revision)`. Revision `0` (or an
//! absent revision) refers to the latest revision.
//!
//! Timestamps are stored as `YYYYMMDDHHMMSS` strings in UTC; anything after
//! the fourteenth character (such as milliseconds) is ignored when parsing.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format of stored tiddler timestamps.
pub const TIMESTRING_FORMAT: &str = "%Y%m%d%H%M%S";

/// A titled unit of content owned by a bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tiddler {
    /// The tiddler title.
    pub title: String,
    /// The owning bag.
    pub bag: Option<String>,
    /// The recipe this tiddler was resolved through, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    /// The revision number; `None` or `0` means latest.
    pub revision: Option<u64>,
    /// The content type of `text`; `None` means wikitext.
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    /// The content.
    pub text: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Extended fields.
    pub fields: BTreeMap<String, String>,
    /// Who created the first revision.
    pub creator: Option<String>,
    /// Who created this revision.
    pub modifier: Option<String>,
    /// When the first revision was created.
    pub created: String,
    /// When this revision was created.
    pub modified: String,
}

impl Tiddler {
    /// Creates a tiddler in `bag`.
    #[must_use]
    pub fn new(title: impl Into<String>, bag: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bag: Some(bag.into()),
            ..Self::default()
        }
    }

    /// Sets the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the revision.
    #[must_use]
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the revision, with absent normalized to `0`.
    #[must_use]
    pub fn revision_or_latest(&self) -> u64 {
        self.revision.unwrap_or(0)
    }

    /// Returns a copy of the metadata with empty text and a normalized
    /// revision.
    ///
    /// Fingerprints are computed from this projection so that they change
    /// with metadata only.
    #[must_use]
    pub fn without_text(&self) -> Self {
        Self {
            title: self.title.clone(),
            bag: self.bag.clone(),
            recipe: self.recipe.clone(),
            revision: Some(self.revision_or_latest()),
            content_type: self.content_type.clone(),
            text: String::new(),
            tags: self.tags.clone(),
            fields: self.fields.clone(),
            creator: self.creator.clone(),
            modifier: self.modifier.clone(),
            created: self.created.clone(),
            modified: self.modified.clone(),
        }
    }

    /// Returns true if `tag` is one of the tiddler's tags.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Looks up an attribute by name, falling back to extended fields.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "title" => Some(self.title.clone()),
            "bag" => self.bag.clone(),
            "recipe" => self.recipe.clone(),
            "revision" => Some(self.revision_or_latest().to_string()),
            "type" => self.content_type.clone(),
            "text" => Some(self.text.clone()),
            "creator" => self.creator.clone(),
            "modifier" => self.modifier.clone(),
            "created" => Some(self.created.clone()),
            "modified" => Some(self.modified.clone()),
            other => self.fields.get(other).cloned(),
        }
    }
}

/// Returns the current time as a tiddler timestamp.
#[must_use]
pub fn current_timestring() -> String {
    Utc::now().format(TIMESTRING_FORMAT).to_string()
}

/// Parses a tiddler timestamp.
pub fn timestring_to_datetime(timestring: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let head = timestring.get(..14).unwrap_or(timestring);
    NaiveDateTime::parse_from_str(head, TIMESTRING_FORMAT).map(|naive| naive.and_utc())
}

/// Renders tags as a space separated string, bracketing tags with spaces.
#[must_use]
pub fn tags_to_string(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| {
            if tag.contains(' ') {
                format!("[[{tag}]]")
            } else {
                tag.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a tag string produced by [`tags_to_string`].
#[must_use]
pub fn string_to_tags(input: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        if let Some(bracketed) = rest.strip_prefix("[[") {
            if let Some(end) = bracketed.find("]]") {
                tags.push(bracketed[..end].to_string());
                rest = bracketed[end + 2..].trim_start();
                continue;
            }
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        tags.push(rest[..end].to_string());
        rest = rest[end..].trim_start();
    }

    tags
}
