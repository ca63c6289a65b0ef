use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{FeatureValueRecord, Image, NewFeatureValue, NewImage};
use crate::types::{CategoryId, CompanyId, ProductId, VariantId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub company_id: CompanyId,
    pub spu: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub hero_image: String,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(rename = "product_images")]
    pub images: Vec<Image>,
    #[sqlx(skip)]
    pub features: Vec<FeatureValueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(rename = "variant_images")]
    pub images: Vec<Image>,
    #[sqlx(skip)]
    pub features: Vec<FeatureValueRecord>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub company_id: CompanyId,
    pub spu: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub hero_image: String,
    pub category_id: CategoryId,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}

/// Partial update: `None` leaves the column untouched. Images and features
/// are upserted, never removed.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub spu: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub hero_image: Option<String>,
    pub category_id: Option<CategoryId>,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}

#[derive(Debug, Clone)]
pub struct NewVariant {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}

#[derive(Debug, Clone, Default)]
pub struct VariantChanges {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}
