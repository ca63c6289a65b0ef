use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::{FeatureDefinition, NewFeatureValue};
use crate::database::repository::{FeatureScope, FeatureStore};
use crate::database::DatabaseError;
use crate::types::{CategoryId, FeatureId, FeatureType, FeatureValue, RawFeature};

#[derive(Debug, Error)]
pub enum FeatureSchemaError {
    #[error("feature {0} is required")]
    MissingRequiredFeature(FeatureId),

    #[error("feature {feature} expects a {expected} value, got '{value}'")]
    InvalidFeatureValue {
        feature: FeatureId,
        value: String,
        expected: FeatureType,
    },

    #[error("feature {0} not found")]
    UnknownFeature(FeatureId),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Source of feature definitions for one category hierarchy
#[async_trait]
pub trait FeatureDefinitionProvider: Send + Sync {
    async fn definitions_for_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<FeatureDefinition>, DatabaseError>;

    async fn definition(&self, feature: FeatureId) -> Result<Option<FeatureDefinition>, DatabaseError>;
}

/// Feature definitions of one scope, read from the catalog store
#[derive(Clone)]
pub struct CatalogFeatures {
    store: Arc<dyn FeatureStore>,
    scope: FeatureScope,
}

impl CatalogFeatures {
    pub fn new(store: Arc<dyn FeatureStore>, scope: FeatureScope) -> Self {
        Self { store, scope }
    }
}

#[async_trait]
impl FeatureDefinitionProvider for CatalogFeatures {
    async fn definitions_for_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<FeatureDefinition>, DatabaseError> {
        self.store.feature_definitions_by_category(self.scope, category).await
    }

    async fn definition(&self, feature: FeatureId) -> Result<Option<FeatureDefinition>, DatabaseError> {
        self.store.feature_definition(self.scope, feature).await
    }
}

/// A submitted feature that passed its type check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedFeature {
    pub feature_id: FeatureId,
    pub raw: String,
    pub value: FeatureValue,
}

impl From<ValidatedFeature> for NewFeatureValue {
    fn from(feature: ValidatedFeature) -> Self {
        NewFeatureValue {
            feature_id: feature.feature_id,
            value: feature.raw,
        }
    }
}

/// Checks submitted feature values against a category schema.
///
/// Every required definition is checked before any value is parsed. Values are
/// then typed in submission order and the first failure is returned. Type
/// lookups go by feature id, so a value for a feature of another category is
/// accepted as long as that feature exists.
pub struct FeatureSchemaValidator<P> {
    provider: P,
}

impl<P: FeatureDefinitionProvider> FeatureSchemaValidator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub async fn validate(
        &self,
        category: CategoryId,
        values: &[RawFeature],
    ) -> Result<Vec<ValidatedFeature>, FeatureSchemaError> {
        let definitions = self.provider.definitions_for_category(category).await?;
        let submitted: HashSet<FeatureId> = values.iter().map(|v| v.feature_id).collect();

        if let Some(missing) = definitions
            .iter()
            .find(|d| d.is_required && !submitted.contains(&d.id))
        {
            return Err(FeatureSchemaError::MissingRequiredFeature(missing.id));
        }

        let mut validated = Vec::with_capacity(values.len());
        for raw in values {
            let definition = self
                .provider
                .definition(raw.feature_id)
                .await?
                .ok_or(FeatureSchemaError::UnknownFeature(raw.feature_id))?;

            let value = FeatureValue::parse(definition.feature_type, &raw.value).ok_or_else(|| {
                FeatureSchemaError::InvalidFeatureValue {
                    feature: raw.feature_id,
                    value: raw.value.clone(),
                    expected: definition.feature_type,
                }
            })?;

            validated.push(ValidatedFeature {
                feature_id: raw.feature_id,
                raw: raw.value.clone(),
                value,
            });
        }
        Ok(validated)
    }
}
