use std::sync::Arc;
use tracing::{debug, info};

use super::feature_schema::{CatalogFeatures, FeatureSchemaValidator};
use super::{codes, ServiceError, ServiceResult};
use crate::database::models::{NewFeatureValue, NewImage, NewVariant, Variant, VariantChanges};
use crate::database::{FeatureScope, FeatureStore, ProductStore, VariantStore};
use crate::forms::{CreateVariantForm, UpdateVariantForm, ValidateForm};
use crate::types::{CategoryId, CompanyId, ProductId, RawFeature, VariantId};

/// Variants of a product; features are checked against the parent product's category
pub struct VariantService {
    variants: Arc<dyn VariantStore>,
    products: Arc<dyn ProductStore>,
    features: FeatureSchemaValidator<CatalogFeatures>,
}

impl VariantService {
    pub fn new(
        variants: Arc<dyn VariantStore>,
        products: Arc<dyn ProductStore>,
        catalog: Arc<dyn FeatureStore>,
    ) -> Self {
        Self {
            variants,
            products,
            features: FeatureSchemaValidator::new(CatalogFeatures::new(catalog, FeatureScope::Product)),
        }
    }

    pub async fn create(&self, form: CreateVariantForm, company: CompanyId) -> ServiceResult<Variant> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::VARIANT_NOT_CREATED, fields))?;

        let category = self
            .owned_product_category(form.product_id, company, codes::VARIANT_NOT_CREATED)
            .await?;
        let features = self
            .validate_features(category, &form.features, codes::VARIANT_FEATURE_WRONG_TYPE)
            .await?;

        let variant = self
            .variants
            .insert_variant(NewVariant {
                product_id: form.product_id,
                sku: form.sku,
                name: form.name,
                description: form.description,
                is_active: form.is_active,
                images: form.variant_images.into_iter().map(NewImage::from).collect(),
                features,
            })
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_CREATED, "variant can not created", e))?;

        info!(variant_id = %variant.id, product_id = %variant.product_id, "Created variant");
        Ok(variant)
    }

    pub async fn update(
        &self,
        form: UpdateVariantForm,
        id: VariantId,
        company: CompanyId,
    ) -> ServiceResult<Variant> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::VARIANT_NOT_UPDATED, fields))?;

        let current = self
            .variants
            .find_variant_for_company(id, company)
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_UPDATED, "variant lookup failed", e))?
            .ok_or_else(|| variant_not_found(id))?;

        let features = match &form.features {
            Some(features) => {
                let category = self
                    .owned_product_category(current.product_id, company, codes::VARIANT_NOT_UPDATED)
                    .await?;
                self.validate_features(category, features, codes::VARIANT_FEATURE_WRONG_TYPE)
                    .await?
            }
            None => Vec::new(),
        };

        let changes = VariantChanges {
            sku: form.sku,
            name: form.name,
            description: form.description,
            is_active: form.is_active,
            images: form.variant_images.into_iter().map(NewImage::from).collect(),
            features,
        };
        let variant = self
            .variants
            .update_variant(id, company, changes)
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_UPDATED, "variant can not updated", e))?
            .ok_or_else(|| variant_not_found(id))?;

        info!(variant_id = %id, company_id = %company, "Updated variant");
        Ok(variant)
    }

    pub async fn delete(&self, id: VariantId, company: CompanyId) -> ServiceResult<()> {
        let removed = self
            .variants
            .delete_variant(id, company)
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_DELETED, "variant can not deleted", e))?;
        if removed == 0 {
            return Err(variant_not_found(id));
        }

        info!(variant_id = %id, company_id = %company, "Deleted variant");
        Ok(())
    }

    pub async fn find_by_id(&self, id: VariantId) -> ServiceResult<Variant> {
        self.variants
            .find_variant(id)
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_FOUND, "variant lookup failed", e))?
            .ok_or_else(|| variant_not_found(id))
    }

    pub async fn find_all_by_category(&self, category: CategoryId) -> ServiceResult<Vec<Variant>> {
        let variants = self
            .variants
            .variants_in_grandchild_categories(category)
            .await
            .map_err(|e| ServiceError::database(codes::VARIANT_NOT_FOUND, "variant listing failed", e))?;
        debug!(category_id = %category, count = variants.len(), "Listed variants");
        Ok(variants)
    }

    async fn owned_product_category(
        &self,
        product: ProductId,
        company: CompanyId,
        code: u16,
    ) -> ServiceResult<CategoryId> {
        self.products
            .find_product_for_company(product, company)
            .await
            .map_err(|e| ServiceError::database(code, "product lookup failed", e))?
            .map(|p| p.category_id)
            .ok_or_else(|| {
                ServiceError::not_found(codes::PRODUCT_NOT_FOUND, format!("product {product} not found"))
            })
    }

    async fn validate_features(
        &self,
        category: CategoryId,
        values: &[RawFeature],
        code: u16,
    ) -> ServiceResult<Vec<NewFeatureValue>> {
        let validated = self
            .features
            .validate(category, values)
            .await
            .map_err(|e| ServiceError::features(code, e))?;
        Ok(validated.into_iter().map(NewFeatureValue::from).collect())
    }
}

fn variant_not_found(id: VariantId) -> ServiceError {
    ServiceError::not_found(codes::VARIANT_NOT_FOUND, format!("variant {id} not found"))
}
