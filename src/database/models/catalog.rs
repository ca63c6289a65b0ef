use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::types::{CategoryId, FeatureId, FeatureType, ImageId};

/// Node in a product or construction category tree
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub description: String,
}

/// Typed attribute declared by a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub id: FeatureId,
    pub name: String,
    pub description: String,
    pub is_required: bool,
    pub feature_type: FeatureType,
    pub category_id: CategoryId,
}

// feature_type is free text in the table
impl<'r> FromRow<'r, PgRow> for FeatureDefinition {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let raw_type: String = row.try_get("feature_type")?;
        let feature_type = raw_type
            .parse::<FeatureType>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "feature_type".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            is_required: row.try_get("is_required")?,
            feature_type,
            category_id: row.try_get("category_id")?,
        })
    }
}

/// Remote image link attached to a product, variant or construction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    pub id: ImageId,
    pub remote_link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored feature value; `value` keeps the submitted wire string
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeatureValueRecord {
    pub feature_id: FeatureId,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub remote_link: String,
}

impl NewImage {
    pub fn new(remote_link: impl Into<String>) -> Self {
        Self {
            remote_link: remote_link.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeatureValue {
    pub feature_id: FeatureId,
    pub value: String,
}
