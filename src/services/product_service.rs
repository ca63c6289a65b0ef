use std::sync::Arc;
use tracing::{debug, info};

use super::feature_schema::{CatalogFeatures, FeatureSchemaValidator};
use super::{codes, ServiceError, ServiceResult};
use crate::database::models::{NewFeatureValue, NewImage, NewProduct, Product, ProductChanges};
use crate::database::{DatabaseError, FeatureScope, FeatureStore, ProductStore};
use crate::forms::{CreateProductForm, UpdateProductForm, ValidateForm};
use crate::types::{CategoryId, CompanyId, ProductId, RawFeature};

pub struct ProductService {
    products: Arc<dyn ProductStore>,
    catalog: Arc<dyn FeatureStore>,
    features: FeatureSchemaValidator<CatalogFeatures>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, catalog: Arc<dyn FeatureStore>) -> Self {
        let features =
            FeatureSchemaValidator::new(CatalogFeatures::new(catalog.clone(), FeatureScope::Product));
        Self {
            products,
            catalog,
            features,
        }
    }

    pub async fn create(&self, form: CreateProductForm, company: CompanyId) -> ServiceResult<Product> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::PRODUCT_NOT_CREATED, fields))?;

        self.ensure_spu_free(&form.spu, company, codes::PRODUCT_NOT_CREATED).await?;
        self.ensure_category(form.category_id).await?;
        let features = self
            .validate_features(form.category_id, &form.features, codes::PRODUCT_NOT_CREATED)
            .await?;

        let product = self
            .products
            .insert_product(NewProduct {
                company_id: company,
                spu: form.spu,
                name: form.name,
                description: form.description,
                is_active: form.is_active,
                hero_image: form.hero_image,
                category_id: form.category_id,
                images: form.product_images.into_iter().map(NewImage::from).collect(),
                features,
            })
            .await
            .map_err(|e| spu_conflict_or(codes::PRODUCT_NOT_CREATED, "product can not created", e))?;

        info!(product_id = %product.id, company_id = %company, "Created product");
        Ok(product)
    }

    /// Partial update of a product owned by `company`. A product owned by another
    /// company is reported exactly like a missing one.
    pub async fn update(
        &self,
        form: UpdateProductForm,
        id: ProductId,
        company: CompanyId,
    ) -> ServiceResult<Product> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::PRODUCT_NOT_UPDATED, fields))?;

        let current = self
            .products
            .find_product_for_company(id, company)
            .await
            .map_err(|e| ServiceError::database(codes::PRODUCT_NOT_UPDATED, "product lookup failed", e))?
            .ok_or_else(|| product_not_found(id))?;

        if let Some(spu) = form.spu.as_deref().filter(|spu| *spu != current.spu) {
            self.ensure_spu_free(spu, company, codes::PRODUCT_NOT_UPDATED).await?;
        }
        let category = match form.category_id {
            Some(category) if category != current.category_id => {
                self.ensure_category(category).await?;
                category
            }
            _ => current.category_id,
        };
        let features = match &form.features {
            Some(features) => {
                self.validate_features(category, features, codes::PRODUCT_NOT_UPDATED)
                    .await?
            }
            None => Vec::new(),
        };

        let changes = ProductChanges {
            spu: form.spu,
            name: form.name,
            description: form.description,
            is_active: form.is_active,
            hero_image: form.hero_image,
            category_id: form.category_id,
            images: form.product_images.into_iter().map(NewImage::from).collect(),
            features,
        };
        let product = self
            .products
            .update_product(id, company, changes)
            .await
            .map_err(|e| spu_conflict_or(codes::PRODUCT_NOT_UPDATED, "product can not updated", e))?
            .ok_or_else(|| product_not_found(id))?;

        info!(product_id = %id, company_id = %company, "Updated product");
        Ok(product)
    }

    pub async fn delete(&self, id: ProductId, company: CompanyId) -> ServiceResult<()> {
        let removed = self
            .products
            .delete_product(id, company)
            .await
            .map_err(|e| ServiceError::database(codes::PRODUCT_NOT_DELETED, "product can not deleted", e))?;
        if removed == 0 {
            return Err(product_not_found(id));
        }

        info!(product_id = %id, company_id = %company, "Deleted product");
        Ok(())
    }

    pub async fn find_by_id(&self, id: ProductId) -> ServiceResult<Product> {
        self.products
            .find_product(id)
            .await
            .map_err(|e| ServiceError::database(codes::PRODUCT_NOT_FOUND, "product lookup failed", e))?
            .ok_or_else(|| product_not_found(id))
    }

    /// Products filed two levels below `category`
    pub async fn find_all_by_category(&self, category: CategoryId) -> ServiceResult<Vec<Product>> {
        let products = self
            .products
            .products_in_grandchild_categories(category)
            .await
            .map_err(|e| ServiceError::database(codes::PRODUCT_NOT_FOUND, "product listing failed", e))?;
        debug!(category_id = %category, count = products.len(), "Listed products");
        Ok(products)
    }

    async fn ensure_spu_free(&self, spu: &str, company: CompanyId, code: u16) -> ServiceResult<()> {
        let taken = self
            .products
            .count_products_by_spu(spu, company)
            .await
            .map_err(|e| ServiceError::database(code, "product lookup failed", e))?;
        if taken > 0 {
            return Err(spu_taken());
        }
        Ok(())
    }

    async fn ensure_category(&self, category: CategoryId) -> ServiceResult<()> {
        self.catalog
            .find_category(FeatureScope::Product, category)
            .await
            .map_err(|e| ServiceError::database(codes::PRODUCT_CATEGORY_NOT_FOUND, "category lookup failed", e))?
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::not_found(codes::PRODUCT_CATEGORY_NOT_FOUND, "product category can not found")
            })
    }

    // Products may omit features entirely; required definitions only apply once some are sent.
    async fn validate_features(
        &self,
        category: CategoryId,
        values: &[RawFeature],
        code: u16,
    ) -> ServiceResult<Vec<NewFeatureValue>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let validated = self
            .features
            .validate(category, values)
            .await
            .map_err(|e| ServiceError::features(code, e))?;
        Ok(validated.into_iter().map(NewFeatureValue::from).collect())
    }
}

fn product_not_found(id: ProductId) -> ServiceError {
    ServiceError::not_found(codes::PRODUCT_NOT_FOUND, format!("product {id} not found"))
}

fn spu_taken() -> ServiceError {
    ServiceError::conflict(codes::PRODUCT_SPU_NOT_UNIQUE, "product spu must be unique")
}

fn spu_conflict_or(code: u16, message: &str, err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => spu_taken(),
        other => ServiceError::database(code, message, other),
    }
}
