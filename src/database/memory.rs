use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, Company, Construction, ConstructionChanges, FeatureDefinition, FeatureValueRecord,
    Image, NewCompany, NewConstruction, NewFeatureValue, NewImage, NewProduct, NewVariant, Product,
    ProductChanges, Variant, VariantChanges,
};
use crate::database::repository::{
    CompanyStore, ConstructionStore, FeatureScope, FeatureStore, ProductStore, VariantStore,
};
use crate::types::{
    CategoryId, CompanyId, ConstructionId, FeatureId, FeatureType, ImageId, ProductId, VariantId,
};

/// A row plus its soft-delete marker
#[derive(Debug, Clone)]
struct Stored<T> {
    row: T,
    deleted_at: Option<DateTime<Utc>>,
}

impl<T> Stored<T> {
    fn new(row: T) -> Self {
        Self { row, deleted_at: None }
    }

    fn live(&self) -> Option<&T> {
        self.deleted_at.is_none().then_some(&self.row)
    }
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    companies: BTreeMap<CompanyId, Stored<Company>>,
    categories: HashMap<FeatureScope, BTreeMap<CategoryId, Category>>,
    definitions: HashMap<FeatureScope, BTreeMap<FeatureId, FeatureDefinition>>,
    products: BTreeMap<ProductId, Stored<Product>>,
    variants: BTreeMap<VariantId, Stored<Variant>>,
    constructions: BTreeMap<ConstructionId, Stored<Construction>>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn upsert_images(&mut self, images: &mut Vec<Image>, incoming: &[NewImage]) {
        let now = Utc::now();
        for new_image in incoming {
            match images.iter_mut().find(|i| i.remote_link == new_image.remote_link) {
                Some(existing) => existing.updated_at = now,
                None => {
                    let id = ImageId(self.next_id());
                    images.push(Image {
                        id,
                        remote_link: new_image.remote_link.clone(),
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
        }
    }

    fn grandchildren(&self, scope: FeatureScope, root: CategoryId) -> Vec<CategoryId> {
        let Some(categories) = self.categories.get(&scope) else {
            return Vec::new();
        };
        let children: Vec<CategoryId> = categories
            .values()
            .filter(|c| c.parent_id == Some(root))
            .map(|c| c.id)
            .collect();
        categories
            .values()
            .filter(|c| c.parent_id.is_some_and(|parent| children.contains(&parent)))
            .map(|c| c.id)
            .collect()
    }

    fn product_owner(&self, product: ProductId) -> Option<CompanyId> {
        self.products
            .get(&product)
            .and_then(Stored::live)
            .map(|p| p.company_id)
    }
}

fn upsert_features(features: &mut Vec<FeatureValueRecord>, incoming: &[NewFeatureValue]) {
    let now = Utc::now();
    for new_value in incoming {
        match features.iter_mut().find(|f| f.feature_id == new_value.feature_id) {
            Some(existing) => {
                existing.value = new_value.value.clone();
                existing.updated_at = now;
            }
            None => features.push(FeatureValueRecord {
                feature_id: new_value.feature_id,
                value: new_value.value.clone(),
                created_at: now,
                updated_at: now,
            }),
        }
    }
}

/// In-process catalog used by tests and `STORE_BACKEND=memory`.
///
/// Categories and feature definitions have no write API; seed them with
/// [`MemoryCatalog::seed_category`] and [`MemoryCatalog::seed_feature`].
#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<MemoryState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_category(
        &self,
        scope: FeatureScope,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Category {
        let mut state = self.state.write().await;
        let category = Category {
            id: CategoryId(state.next_id()),
            name: name.to_string(),
            parent_id,
            description: String::new(),
        };
        state
            .categories
            .entry(scope)
            .or_default()
            .insert(category.id, category.clone());
        category
    }

    pub async fn seed_feature(
        &self,
        scope: FeatureScope,
        category_id: CategoryId,
        name: &str,
        feature_type: FeatureType,
        is_required: bool,
    ) -> FeatureDefinition {
        let mut state = self.state.write().await;
        let definition = FeatureDefinition {
            id: FeatureId(state.next_id()),
            name: name.to_string(),
            description: String::new(),
            is_required,
            feature_type,
            category_id,
        };
        state
            .definitions
            .entry(scope)
            .or_default()
            .insert(definition.id, definition.clone());
        definition
    }
}

#[async_trait]
impl CompanyStore for MemoryCatalog {
    async fn insert_company(&self, company: NewCompany) -> Result<Company, DatabaseError> {
        let mut state = self.state.write().await;
        let duplicate = state
            .companies
            .values()
            .filter_map(Stored::live)
            .any(|c| c.email == company.email);
        if duplicate {
            return Err(DatabaseError::Conflict(format!("email {} already exists", company.email)));
        }

        let now = Utc::now();
        let row = Company {
            id: CompanyId(state.next_id()),
            name: company.name,
            company_type: company.company_type,
            web_site: company.web_site,
            email: company.email,
            authorized_name: company.authorized_name,
            authorized_surname: company.authorized_surname,
            is_active: true,
            is_supplier: company.is_supplier,
            is_constructor: company.is_constructor,
            password_hash: company.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.companies.insert(row.id, Stored::new(row.clone()));
        Ok(row)
    }

    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .companies
            .values()
            .filter_map(Stored::live)
            .find(|c| c.email == email)
            .cloned())
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.companies.get(&id).and_then(Stored::live).cloned())
    }
}

#[async_trait]
impl FeatureStore for MemoryCatalog {
    async fn find_category(
        &self,
        scope: FeatureScope,
        id: CategoryId,
    ) -> Result<Option<Category>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .get(&scope)
            .and_then(|categories| categories.get(&id))
            .cloned())
    }

    async fn feature_definitions_by_category(
        &self,
        scope: FeatureScope,
        category: CategoryId,
    ) -> Result<Vec<FeatureDefinition>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .definitions
            .get(&scope)
            .map(|defs| {
                defs.values()
                    .filter(|d| d.category_id == category)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn feature_definition(
        &self,
        scope: FeatureScope,
        id: FeatureId,
    ) -> Result<Option<FeatureDefinition>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.definitions.get(&scope).and_then(|defs| defs.get(&id)).cloned())
    }
}

#[async_trait]
impl ProductStore for MemoryCatalog {
    async fn count_products_by_spu(&self, spu: &str, company: CompanyId) -> Result<i64, DatabaseError> {
        let state = self.state.read().await;
        let count = state
            .products
            .values()
            .filter_map(Stored::live)
            .filter(|p| p.spu == spu && p.company_id == company)
            .count();
        Ok(count as i64)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let mut state = self.state.write().await;
        let taken = state
            .products
            .values()
            .filter_map(Stored::live)
            .any(|p| p.spu == product.spu && p.company_id == product.company_id);
        if taken {
            return Err(DatabaseError::Conflict(format!("spu {} already exists", product.spu)));
        }

        let now = Utc::now();
        let mut row = Product {
            id: ProductId(state.next_id()),
            company_id: product.company_id,
            spu: product.spu,
            name: product.name,
            description: product.description,
            is_active: product.is_active,
            hero_image: product.hero_image,
            category_id: product.category_id,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
            features: Vec::new(),
        };
        state.upsert_images(&mut row.images, &product.images);
        upsert_features(&mut row.features, &product.features);
        state.products.insert(row.id, Stored::new(row.clone()));
        Ok(row)
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).and_then(Stored::live).cloned())
    }

    async fn find_product_for_company(
        &self,
        id: ProductId,
        company: CompanyId,
    ) -> Result<Option<Product>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .get(&id)
            .and_then(Stored::live)
            .filter(|p| p.company_id == company)
            .cloned())
    }

    async fn update_product(
        &self,
        id: ProductId,
        company: CompanyId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DatabaseError> {
        let mut state = self.state.write().await;
        if state.product_owner(id) != Some(company) {
            return Ok(None);
        }
        let Some(mut row) = state.products.get(&id).map(|s| s.row.clone()) else {
            return Ok(None);
        };

        if let Some(spu) = changes.spu {
            let taken = state
                .products
                .values()
                .filter_map(Stored::live)
                .any(|p| p.id != id && p.spu == spu && p.company_id == company);
            if taken {
                return Err(DatabaseError::Conflict(format!("spu {spu} already exists")));
            }
            row.spu = spu;
        }
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = is_active;
        }
        if let Some(hero_image) = changes.hero_image {
            row.hero_image = hero_image;
        }
        if let Some(category_id) = changes.category_id {
            row.category_id = category_id;
        }
        row.updated_at = Utc::now();
        state.upsert_images(&mut row.images, &changes.images);
        upsert_features(&mut row.features, &changes.features);

        state.products.insert(id, Stored::new(row.clone()));
        Ok(Some(row))
    }

    async fn delete_product(&self, id: ProductId, company: CompanyId) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        if state.product_owner(id) != Some(company) {
            return Ok(0);
        }

        let now = Utc::now();
        if let Some(stored) = state.products.get_mut(&id) {
            stored.deleted_at = Some(now);
        }
        for variant in state.variants.values_mut() {
            if variant.row.product_id == id && variant.deleted_at.is_none() {
                variant.deleted_at = Some(now);
            }
        }
        Ok(1)
    }

    async fn products_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Product>, DatabaseError> {
        let state = self.state.read().await;
        let categories = state.grandchildren(FeatureScope::Product, root);
        Ok(state
            .products
            .values()
            .filter_map(Stored::live)
            .filter(|p| categories.contains(&p.category_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VariantStore for MemoryCatalog {
    async fn insert_variant(&self, variant: NewVariant) -> Result<Variant, DatabaseError> {
        let mut state = self.state.write().await;
        if state.product_owner(variant.product_id).is_none() {
            return Err(DatabaseError::NotFound(format!("product {}", variant.product_id)));
        }

        let now = Utc::now();
        let mut row = Variant {
            id: VariantId(state.next_id()),
            product_id: variant.product_id,
            sku: variant.sku,
            name: variant.name,
            description: variant.description,
            is_active: variant.is_active,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
            features: Vec::new(),
        };
        state.upsert_images(&mut row.images, &variant.images);
        upsert_features(&mut row.features, &variant.features);
        state.variants.insert(row.id, Stored::new(row.clone()));
        Ok(row)
    }

    async fn find_variant(&self, id: VariantId) -> Result<Option<Variant>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.variants.get(&id).and_then(Stored::live).cloned())
    }

    async fn find_variant_for_company(
        &self,
        id: VariantId,
        company: CompanyId,
    ) -> Result<Option<Variant>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .variants
            .get(&id)
            .and_then(Stored::live)
            .filter(|v| state.product_owner(v.product_id) == Some(company))
            .cloned())
    }

    async fn update_variant(
        &self,
        id: VariantId,
        company: CompanyId,
        changes: VariantChanges,
    ) -> Result<Option<Variant>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(mut row) = state.variants.get(&id).and_then(Stored::live).cloned() else {
            return Ok(None);
        };
        if state.product_owner(row.product_id) != Some(company) {
            return Ok(None);
        }

        if let Some(sku) = changes.sku {
            row.sku = sku;
        }
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(is_active) = changes.is_active {
            row.is_active = is_active;
        }
        row.updated_at = Utc::now();
        state.upsert_images(&mut row.images, &changes.images);
        upsert_features(&mut row.features, &changes.features);

        state.variants.insert(id, Stored::new(row.clone()));
        Ok(Some(row))
    }

    async fn delete_variant(&self, id: VariantId, company: CompanyId) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let owner = state
            .variants
            .get(&id)
            .and_then(Stored::live)
            .and_then(|v| state.product_owner(v.product_id));
        if owner != Some(company) {
            return Ok(0);
        }
        if let Some(stored) = state.variants.get_mut(&id) {
            stored.deleted_at = Some(Utc::now());
        }
        Ok(1)
    }

    async fn variants_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Variant>, DatabaseError> {
        let state = self.state.read().await;
        let categories = state.grandchildren(FeatureScope::Product, root);
        Ok(state
            .variants
            .values()
            .filter_map(Stored::live)
            .filter(|v| {
                state
                    .products
                    .get(&v.product_id)
                    .and_then(Stored::live)
                    .is_some_and(|p| categories.contains(&p.category_id))
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConstructionStore for MemoryCatalog {
    async fn insert_construction(
        &self,
        construction: NewConstruction,
    ) -> Result<Construction, DatabaseError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut row = Construction {
            id: ConstructionId(state.next_id()),
            company_id: construction.company_id,
            name: construction.name,
            category_id: construction.category_id,
            geographic_region: construction.geographic_region,
            province: construction.province,
            district: construction.district,
            stage: construction.stage,
            start: construction.start,
            end: construction.end,
            web_site: construction.web_site,
            cost_of_project: construction.cost_of_project,
            land_area: construction.land_area,
            construction_zone: construction.construction_zone,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
            features: Vec::new(),
        };
        state.upsert_images(&mut row.images, &construction.images);
        upsert_features(&mut row.features, &construction.features);
        state.constructions.insert(row.id, Stored::new(row.clone()));
        Ok(row)
    }

    async fn find_construction_for_company(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<Option<Construction>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .constructions
            .get(&id)
            .and_then(Stored::live)
            .filter(|c| c.company_id == company)
            .cloned())
    }

    async fn update_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
        changes: ConstructionChanges,
    ) -> Result<Option<Construction>, DatabaseError> {
        let mut state = self.state.write().await;
        let Some(mut row) = state
            .constructions
            .get(&id)
            .and_then(Stored::live)
            .filter(|c| c.company_id == company)
            .cloned()
        else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(region) = changes.geographic_region {
            row.geographic_region = region;
        }
        if let Some(province) = changes.province {
            row.province = province;
        }
        if let Some(district) = changes.district {
            row.district = district;
        }
        if let Some(stage) = changes.stage {
            row.stage = stage;
        }
        if let Some(start) = changes.start {
            row.start = start;
        }
        if let Some(end) = changes.end {
            row.end = end;
        }
        if let Some(web_site) = changes.web_site {
            row.web_site = Some(web_site);
        }
        if let Some(cost) = changes.cost_of_project {
            row.cost_of_project = cost;
        }
        if let Some(area) = changes.land_area {
            row.land_area = area;
        }
        if let Some(zone) = changes.construction_zone {
            row.construction_zone = zone;
        }
        row.updated_at = Utc::now();
        state.upsert_images(&mut row.images, &changes.images);
        upsert_features(&mut row.features, &changes.features);

        state.constructions.insert(id, Stored::new(row.clone()));
        Ok(Some(row))
    }

    async fn delete_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        match state.constructions.get_mut(&id) {
            Some(stored) if stored.deleted_at.is_none() && stored.row.company_id == company => {
                stored.deleted_at = Some(Utc::now());
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn constructions_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Construction>, DatabaseError> {
        let state = self.state.read().await;
        let categories = state.grandchildren(FeatureScope::Construction, root);
        Ok(state
            .constructions
            .values()
            .filter_map(Stored::live)
            .filter(|c| categories.contains(&c.category_id))
            .cloned()
            .collect())
    }
}
