use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, Company, Construction, ConstructionChanges, FeatureDefinition, NewCompany,
    NewConstruction, NewProduct, NewVariant, Product, ProductChanges, Variant, VariantChanges,
};
use crate::types::{CategoryId, CompanyId, ConstructionId, FeatureId, ProductId, VariantId};

/// Which of the two parallel category/feature hierarchies a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureScope {
    Product,
    Construction,
}

impl FeatureScope {
    pub(crate) fn category_table(&self) -> &'static str {
        match self {
            FeatureScope::Product => "product_categories",
            FeatureScope::Construction => "construction_categories",
        }
    }

    pub(crate) fn definition_table(&self) -> &'static str {
        match self {
            FeatureScope::Product => "product_feature_definitions",
            FeatureScope::Construction => "construction_feature_definitions",
        }
    }
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn insert_company(&self, company: NewCompany) -> Result<Company, DatabaseError>;

    /// Lookup by exact (already normalized) email
    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, DatabaseError>;

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, DatabaseError>;
}

#[async_trait]
pub trait FeatureStore: Send + Sync {
    async fn find_category(
        &self,
        scope: FeatureScope,
        id: CategoryId,
    ) -> Result<Option<Category>, DatabaseError>;

    async fn feature_definitions_by_category(
        &self,
        scope: FeatureScope,
        category: CategoryId,
    ) -> Result<Vec<FeatureDefinition>, DatabaseError>;

    async fn feature_definition(
        &self,
        scope: FeatureScope,
        id: FeatureId,
    ) -> Result<Option<FeatureDefinition>, DatabaseError>;
}

/// Product persistence. Every write that touches several tables is atomic.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn count_products_by_spu(&self, spu: &str, company: CompanyId) -> Result<i64, DatabaseError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, DatabaseError>;

    async fn find_product_for_company(
        &self,
        id: ProductId,
        company: CompanyId,
    ) -> Result<Option<Product>, DatabaseError>;

    /// Returns `None` when no live product matches `(id, company)`.
    async fn update_product(
        &self,
        id: ProductId,
        company: CompanyId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DatabaseError>;

    /// Soft-deletes the product with its images, features and variants.
    /// Returns the number of products removed (0 or 1).
    async fn delete_product(&self, id: ProductId, company: CompanyId) -> Result<u64, DatabaseError>;

    async fn products_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Product>, DatabaseError>;
}

#[async_trait]
pub trait VariantStore: Send + Sync {
    async fn insert_variant(&self, variant: NewVariant) -> Result<Variant, DatabaseError>;

    async fn find_variant(&self, id: VariantId) -> Result<Option<Variant>, DatabaseError>;

    /// Ownership is derived from the parent product
    async fn find_variant_for_company(
        &self,
        id: VariantId,
        company: CompanyId,
    ) -> Result<Option<Variant>, DatabaseError>;

    async fn update_variant(
        &self,
        id: VariantId,
        company: CompanyId,
        changes: VariantChanges,
    ) -> Result<Option<Variant>, DatabaseError>;

    async fn delete_variant(&self, id: VariantId, company: CompanyId) -> Result<u64, DatabaseError>;

    async fn variants_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Variant>, DatabaseError>;
}

#[async_trait]
pub trait ConstructionStore: Send + Sync {
    async fn insert_construction(
        &self,
        construction: NewConstruction,
    ) -> Result<Construction, DatabaseError>;

    async fn find_construction_for_company(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<Option<Construction>, DatabaseError>;

    async fn update_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
        changes: ConstructionChanges,
    ) -> Result<Option<Construction>, DatabaseError>;

    async fn delete_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<u64, DatabaseError>;

    async fn constructions_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Construction>, DatabaseError>;
}
