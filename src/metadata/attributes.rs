//! Mapping between [`ImageRecord`] and DynamoDB's typed attribute maps.
//!
//! Strings are stored as `S`, timestamps as `N`, flags as `BOOL` and the
//! variant locators as an `M` of `S`.

use crate::metadata::error::MetadataError;
use crate::metadata::models::{ImageRecord, RecordKey};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{BTreeMap, HashMap};

pub type Item = HashMap<String, AttributeValue>;

/// Attribute names of the image table
pub mod columns {
    pub const CATEGORY: &str = "category";
    pub const UPLOAD_TIME: &str = "uploadTime";
    pub const UPDATE_TIME: &str = "updateTime";
    pub const VARIANTS: &str = "srcSet";
    pub const ORIGINAL: &str = "original";
    pub const FEATURED: &str = "biotc";
    pub const PANORAMA: &str = "panorama";
    pub const PORTRAIT: &str = "portrait";
    pub const DESCRIPTION: &str = "description";
    pub const RESOLUTION: &str = "resolution";
    pub const REMOVED: &str = "removed";
}

pub fn to_item(record: &ImageRecord) -> Item {
    let variants: HashMap<String, AttributeValue> = record
        .variants
        .iter()
        .map(|(width, locator)| (width.clone(), AttributeValue::S(locator.clone())))
        .collect();

    let mut item = key_item(&record.key());
    item.insert(
        columns::UPLOAD_TIME.to_string(),
        AttributeValue::N(record.upload_time.to_string()),
    );
    item.insert(columns::VARIANTS.to_string(), AttributeValue::M(variants));
    item.insert(
        columns::ORIGINAL.to_string(),
        AttributeValue::S(record.original.clone()),
    );
    item.insert(
        columns::FEATURED.to_string(),
        AttributeValue::Bool(record.featured),
    );
    item.insert(
        columns::PANORAMA.to_string(),
        AttributeValue::Bool(record.panorama),
    );
    item.insert(
        columns::PORTRAIT.to_string(),
        AttributeValue::Bool(record.portrait),
    );
    item.insert(
        columns::DESCRIPTION.to_string(),
        AttributeValue::S(record.description.clone()),
    );
    item.insert(
        columns::RESOLUTION.to_string(),
        AttributeValue::S(record.source_resolution.clone()),
    );
    item.insert(
        columns::REMOVED.to_string(),
        AttributeValue::Bool(record.removed),
    );
    item
}

pub fn key_item(key: &RecordKey) -> Item {
    HashMap::from([
        (
            columns::CATEGORY.to_string(),
            AttributeValue::S(key.category.clone()),
        ),
        (
            columns::UPDATE_TIME.to_string(),
            AttributeValue::N(key.update_time.to_string()),
        ),
    ])
}

pub fn from_item(item: &Item) -> Result<ImageRecord, MetadataError> {
    Ok(ImageRecord {
        category: required_string(item, columns::CATEGORY)?,
        upload_time: number(item, columns::UPLOAD_TIME)?,
        update_time: number(item, columns::UPDATE_TIME)?,
        variants: string_map(item, columns::VARIANTS)?,
        original: optional_string(item, columns::ORIGINAL)?,
        featured: flag(item, columns::FEATURED)?,
        panorama: flag(item, columns::PANORAMA)?,
        portrait: flag(item, columns::PORTRAIT)?,
        description: optional_string(item, columns::DESCRIPTION)?,
        source_resolution: optional_string(item, columns::RESOLUTION)?,
        removed: flag(item, columns::REMOVED)?,
    })
}

fn type_mismatch(name: &str, expected: &str) -> MetadataError {
    MetadataError::Deserialization(format!("attribute {} is not of type {}", name, expected))
}

fn required_string(item: &Item, name: &str) -> Result<String, MetadataError> {
    match item.get(name) {
        Some(value) => value
            .as_s()
            .cloned()
            .map_err(|_| type_mismatch(name, "S")),
        None => Err(MetadataError::Deserialization(format!(
            "missing attribute {}",
            name
        ))),
    }
}

fn optional_string(item: &Item, name: &str) -> Result<String, MetadataError> {
    match item.get(name) {
        Some(value) => value
            .as_s()
            .cloned()
            .map_err(|_| type_mismatch(name, "S")),
        None => Ok(String::new()),
    }
}

fn number(item: &Item, name: &str) -> Result<i64, MetadataError> {
    let raw = item
        .get(name)
        .ok_or_else(|| MetadataError::Deserialization(format!("missing attribute {}", name)))?
        .as_n()
        .map_err(|_| type_mismatch(name, "N"))?;

    raw.parse::<i64>().map_err(|e| {
        MetadataError::Deserialization(format!("attribute {} is not an integer: {}", name, e))
    })
}

// Flags written before a column existed read as false
fn flag(item: &Item, name: &str) -> Result<bool, MetadataError> {
    match item.get(name) {
        Some(value) => value
            .as_bool()
            .copied()
            .map_err(|_| type_mismatch(name, "BOOL")),
        None => Ok(false),
    }
}

fn string_map(item: &Item, name: &str) -> Result<BTreeMap<String, String>, MetadataError> {
    let Some(value) = item.get(name) else {
        return Ok(BTreeMap::new());
    };

    value
        .as_m()
        .map_err(|_| type_mismatch(name, "M"))?
        .iter()
        .map(|(width, locator)| {
            locator
                .as_s()
                .map(|s| (width.clone(), s.clone()))
                .map_err(|_| type_mismatch(name, "M of S"))
        })
        .collect()
}
