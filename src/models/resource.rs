//! Represents an uploaded study resource and its metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The fixed set of categories a resource may be filed under.
///
/// Unknown category values are rejected at upload time; an omitted category
/// defaults to `Notes`.
#[derive(Serialize, Deserialize, sqlx::Type, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Notes,
    Assignment,
    Project,
    PastPaper,
    Book,
    Cheatsheet,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Notes => "notes",
            Category::Assignment => "assignment",
            Category::Project => "project",
            Category::PastPaper => "past-paper",
            Category::Book => "book",
            Category::Cheatsheet => "cheatsheet",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "notes" => Ok(Category::Notes),
            "assignment" => Ok(Category::Assignment),
            "project" => Ok(Category::Project),
            "past-paper" => Ok(Category::PastPaper),
            "book" => Ok(Category::Book),
            "cheatsheet" => Ok(Category::Cheatsheet),
            "other" => Ok(Category::Other),
            _ => Err(UnknownCategory(value.to_string())),
        }
    }
}

/// Error returned when a category string is outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown resource category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

/// A single shared resource: one uploaded file plus its descriptive fields.
///
/// The record is created only after the file bytes have been accepted by the
/// external storage provider; `file_url` is treated as a stable handle to
/// those bytes for the life of the record.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Internal id assigned on creation.
    pub id: Uuid,

    /// Required, non-empty display title.
    pub title: String,

    /// Free-form description, defaults to empty.
    pub description: String,

    /// Required, non-empty subject the resource belongs to.
    pub subject: String,

    /// Category from the fixed set, defaults to `notes`.
    pub category: Category,

    /// Retrieval URL returned by the storage provider.
    pub file_url: String,

    /// Original client filename.
    pub file_name: String,

    /// MIME type of the stored file.
    pub file_type: String,

    /// Size in bytes.
    pub file_size: i64,

    /// Opaque provider object id used for deletion. Absent when the
    /// provider did not return one.
    pub storage_id: Option<String>,

    /// Identity-provider user id of the uploader. Set once, never changes.
    pub uploader_id: String,

    /// Display name (or email) of the uploader at upload time. A snapshot,
    /// not a live reference.
    pub uploader_name: String,

    /// How many times the resource has been downloaded. Only increases.
    pub download_count: i64,

    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_every_known_value() {
        for raw in [
            "notes",
            "assignment",
            "project",
            "past-paper",
            "book",
            "cheatsheet",
            "other",
        ] {
            let category: Category = raw.parse().unwrap();
            assert_eq!(category.as_str(), raw);
        }
    }

    #[test]
    fn category_rejects_unknown_values() {
        assert!("memes".parse::<Category>().is_err());
        assert!("Notes".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_in_kebab_case() {
        let json = serde_json::to_string(&Category::PastPaper).unwrap();
        assert_eq!(json, "\"past-paper\"");
    }
}
