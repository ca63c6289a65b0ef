use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::catalog::{FeatureValueRecord, Image, NewFeatureValue, NewImage};
use crate::types::{CategoryId, CompanyId, ConstructionId};

/// Construction project listing. Monetary and area amounts are NUMERIC(12,2).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Construction {
    pub id: ConstructionId,
    pub company_id: CompanyId,
    pub name: String,
    #[serde(rename = "construction_category_id")]
    pub category_id: CategoryId,
    pub geographic_region: String,
    pub province: String,
    pub district: String,
    pub stage: String,
    pub start: String,
    pub end: String,
    pub web_site: Option<String>,
    pub cost_of_project: Decimal,
    pub land_area: Decimal,
    pub construction_zone: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(rename = "construction_images")]
    pub images: Vec<Image>,
    #[sqlx(skip)]
    #[serde(rename = "construction_features")]
    pub features: Vec<FeatureValueRecord>,
}

#[derive(Debug, Clone)]
pub struct NewConstruction {
    pub company_id: CompanyId,
    pub name: String,
    pub category_id: CategoryId,
    pub geographic_region: String,
    pub province: String,
    pub district: String,
    pub stage: String,
    pub start: String,
    pub end: String,
    pub web_site: Option<String>,
    pub cost_of_project: Decimal,
    pub land_area: Decimal,
    pub construction_zone: Decimal,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstructionChanges {
    pub name: Option<String>,
    pub geographic_region: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub stage: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub web_site: Option<String>,
    pub cost_of_project: Option<Decimal>,
    pub land_area: Option<Decimal>,
    pub construction_zone: Option<Decimal>,
    pub images: Vec<NewImage>,
    pub features: Vec<NewFeatureValue>,
}
