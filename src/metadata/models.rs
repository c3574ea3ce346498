use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primary key of an image record: partition by category, sort by update time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub category: String,
    pub update_time: i64,
}

impl RecordKey {
    pub fn new(category: impl Into<String>, update_time: i64) -> Self {
        Self {
            category: category.into(),
            update_time,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.category, self.update_time)
    }
}

/// The durable description of one uploaded image and all of its rendered variants.
///
/// Serialized field names match the attribute names in the metadata table, so
/// the JSON handed to callers and the stored item use one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub category: String,
    /// Milliseconds since epoch
    pub upload_time: i64,
    /// Milliseconds since epoch; sort key, never below `upload_time`
    pub update_time: i64,
    /// Viewport width threshold -> blob locator
    #[serde(rename = "srcSet")]
    pub variants: BTreeMap<String, String>,
    pub original: String,
    /// Best image of the category
    #[serde(rename = "biotc")]
    pub featured: bool,
    pub panorama: bool,
    pub portrait: bool,
    pub description: String,
    /// Source dimensions as `"<width>:<height>"`
    #[serde(rename = "resolution")]
    pub source_resolution: String,
    pub removed: bool,
}

impl ImageRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.category.clone(), self.update_time)
    }

    /// Every non-empty blob locator the record references
    pub fn blob_locators(&self) -> Vec<&str> {
        self.variants
            .values()
            .map(String::as_str)
            .chain(std::iter::once(self.original.as_str()))
            .filter(|locator| !locator.is_empty())
            .collect()
    }
}

/// A conditional change to the `featured`/`removed` flags of an existing record.
///
/// The update only applies when the record exists and, if `expect_featured`
/// is set, its current `featured` flag equals that value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagUpdate {
    pub featured: Option<bool>,
    pub removed: Option<bool>,
    pub expect_featured: Option<bool>,
}

impl FlagUpdate {
    /// Retire the current featured record of a category
    pub fn demote_featured() -> Self {
        Self {
            featured: Some(false),
            removed: Some(true),
            expect_featured: Some(true),
        }
    }

    pub fn soft_delete() -> Self {
        Self {
            featured: None,
            removed: Some(true),
            expect_featured: None,
        }
    }
}

/// Filter applied when querying a category. The default excludes removed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub featured: Option<bool>,
    pub include_removed: bool,
}

impl RecordFilter {
    pub fn featured_only() -> Self {
        Self {
            featured: Some(true),
            include_removed: false,
        }
    }
}
