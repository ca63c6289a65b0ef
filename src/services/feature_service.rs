use std::sync::Arc;

use super::{codes, ServiceError, ServiceResult};
use crate::database::models::FeatureDefinition;
use crate::database::{FeatureScope, FeatureStore};
use crate::types::CategoryId;

/// Read-only access to the feature definitions a category declares
pub struct FeatureService {
    catalog: Arc<dyn FeatureStore>,
}

impl FeatureService {
    pub fn new(catalog: Arc<dyn FeatureStore>) -> Self {
        Self { catalog }
    }

    pub async fn definitions_for_category(
        &self,
        scope: FeatureScope,
        category: CategoryId,
    ) -> ServiceResult<Vec<FeatureDefinition>> {
        self.catalog
            .find_category(scope, category)
            .await
            .map_err(|e| ServiceError::database(codes::FEATURE_NOT_FOUND, "category lookup failed", e))?
            .ok_or_else(|| {
                ServiceError::not_found(codes::FEATURE_NOT_FOUND, format!("category {category} not found"))
            })?;

        self.catalog
            .feature_definitions_by_category(scope, category)
            .await
            .map_err(|e| ServiceError::database(codes::FEATURE_NOT_FOUND, "feature lookup failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryCatalog;
    use crate::types::FeatureType;

    #[tokio::test]
    async fn scopes_do_not_leak_into_each_other() {
        let store = Arc::new(MemoryCatalog::new());
        let product_category = store.seed_category(FeatureScope::Product, "Seramik", None).await;
        store
            .seed_feature(FeatureScope::Product, product_category.id, "size", FeatureType::String, true)
            .await;
        let service = FeatureService::new(store);

        let defs = service
            .definitions_for_category(FeatureScope::Product, product_category.id)
            .await
            .unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "size");

        let err = service
            .definitions_for_category(FeatureScope::Construction, product_category.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::FEATURE_NOT_FOUND);
    }
}
