use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Row};
use std::collections::HashMap;
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, Company, Construction, ConstructionChanges, FeatureDefinition, FeatureValueRecord,
    Image, NewCompany, NewConstruction, NewFeatureValue, NewImage, NewProduct, NewVariant, Product,
    ProductChanges, Variant, VariantChanges,
};
use crate::database::repository::{
    CompanyStore, ConstructionStore, FeatureScope, FeatureStore, ProductStore, VariantStore,
};
use crate::types::{CategoryId, CompanyId, ConstructionId, FeatureId, ProductId, VariantId};

const COMPANY_COLUMNS: &str = "id, name, company_type, web_site, email, authorized_name, \
     authorized_surname, is_active, is_supplier, is_constructor, password_hash, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "p.id, p.company_id, p.spu, p.name, p.description, p.is_active, \
     p.hero_image, p.category_id, p.created_at, p.updated_at";

const VARIANT_COLUMNS: &str = "v.id, v.product_id, v.sku, v.name, v.description, v.is_active, \
     v.created_at, v.updated_at";

const CONSTRUCTION_COLUMNS: &str = "c.id, c.company_id, c.name, c.category_id, c.geographic_region, \
     c.province, c.district, c.stage, c.start, c.\"end\", c.web_site, c.cost_of_project, \
     c.land_area, c.construction_zone, c.created_at, c.updated_at";

/// Parent row kinds that carry image links and feature values
#[derive(Debug, Clone, Copy)]
enum Owner {
    Product,
    Variant,
    Construction,
}

impl Owner {
    fn image_table(self) -> &'static str {
        match self {
            Owner::Product => "product_images",
            Owner::Variant => "variant_images",
            Owner::Construction => "construction_images",
        }
    }

    fn feature_table(self) -> &'static str {
        match self {
            Owner::Product => "product_features",
            Owner::Variant => "variant_features",
            Owner::Construction => "construction_features",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Owner::Product => "product_id",
            Owner::Variant => "variant_id",
            Owner::Construction => "construction_id",
        }
    }
}

/// `IN (...)` subquery selecting the grandchildren of category `$1`
fn grandchild_categories(scope: FeatureScope) -> String {
    let table = scope.category_table();
    format!("SELECT id FROM {table} WHERE parent_id IN (SELECT id FROM {table} WHERE parent_id = $1)")
}

/// Catalog store over the Postgres schema in `migrations/`
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_images(
        conn: &mut PgConnection,
        owner: Owner,
        owner_id: i64,
        images: &[NewImage],
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {table} ({key}, remote_link) VALUES ($1, $2) \
             ON CONFLICT ({key}, remote_link) WHERE deleted_at IS NULL \
             DO UPDATE SET updated_at = now()",
            table = owner.image_table(),
            key = owner.key(),
        );
        for image in images {
            sqlx::query(&sql)
                .bind(owner_id)
                .bind(&image.remote_link)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn upsert_features(
        conn: &mut PgConnection,
        owner: Owner,
        owner_id: i64,
        features: &[NewFeatureValue],
    ) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO {table} ({key}, feature_id, value) VALUES ($1, $2, $3) \
             ON CONFLICT ({key}, feature_id) WHERE deleted_at IS NULL \
             DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
            table = owner.feature_table(),
            key = owner.key(),
        );
        for feature in features {
            sqlx::query(&sql)
                .bind(owner_id)
                .bind(feature.feature_id)
                .bind(&feature.value)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Soft-delete the images and feature values hanging off the given owners
    async fn soft_delete_children(
        conn: &mut PgConnection,
        owner: Owner,
        owner_filter: &str,
        id: i64,
    ) -> Result<(), DatabaseError> {
        for table in [owner.image_table(), owner.feature_table()] {
            let sql = format!(
                "UPDATE {table} SET deleted_at = now() \
                 WHERE deleted_at IS NULL AND {key} IN ({owner_filter})",
                key = owner.key(),
            );
            sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn load_images(&self, owner: Owner, ids: &[i64]) -> Result<HashMap<i64, Vec<Image>>, DatabaseError> {
        let sql = format!(
            "SELECT {key} AS owner_id, id, remote_link, created_at, updated_at FROM {table} \
             WHERE {key} = ANY($1) AND deleted_at IS NULL ORDER BY id",
            table = owner.image_table(),
            key = owner.key(),
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<Image>> = HashMap::new();
        for row in rows {
            let owner_id: i64 = row.try_get("owner_id")?;
            grouped.entry(owner_id).or_default().push(Image::from_row(&row)?);
        }
        Ok(grouped)
    }

    async fn load_features(
        &self,
        owner: Owner,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<FeatureValueRecord>>, DatabaseError> {
        let sql = format!(
            "SELECT {key} AS owner_id, feature_id, value, created_at, updated_at FROM {table} \
             WHERE {key} = ANY($1) AND deleted_at IS NULL ORDER BY id",
            table = owner.feature_table(),
            key = owner.key(),
        );
        let rows = sqlx::query(&sql).bind(ids).fetch_all(&self.pool).await?;

        let mut grouped: HashMap<i64, Vec<FeatureValueRecord>> = HashMap::new();
        for row in rows {
            let owner_id: i64 = row.try_get("owner_id")?;
            grouped
                .entry(owner_id)
                .or_default()
                .push(FeatureValueRecord::from_row(&row)?);
        }
        Ok(grouped)
    }

    async fn attach_products(&self, mut products: Vec<Product>) -> Result<Vec<Product>, DatabaseError> {
        let ids: Vec<i64> = products.iter().map(|p| p.id.0).collect();
        let mut images = self.load_images(Owner::Product, &ids).await?;
        let mut features = self.load_features(Owner::Product, &ids).await?;
        for product in &mut products {
            product.images = images.remove(&product.id.0).unwrap_or_default();
            product.features = features.remove(&product.id.0).unwrap_or_default();
        }
        Ok(products)
    }

    async fn attach_variants(&self, mut variants: Vec<Variant>) -> Result<Vec<Variant>, DatabaseError> {
        let ids: Vec<i64> = variants.iter().map(|v| v.id.0).collect();
        let mut images = self.load_images(Owner::Variant, &ids).await?;
        let mut features = self.load_features(Owner::Variant, &ids).await?;
        for variant in &mut variants {
            variant.images = images.remove(&variant.id.0).unwrap_or_default();
            variant.features = features.remove(&variant.id.0).unwrap_or_default();
        }
        Ok(variants)
    }

    async fn attach_constructions(
        &self,
        mut constructions: Vec<Construction>,
    ) -> Result<Vec<Construction>, DatabaseError> {
        let ids: Vec<i64> = constructions.iter().map(|c| c.id.0).collect();
        let mut images = self.load_images(Owner::Construction, &ids).await?;
        let mut features = self.load_features(Owner::Construction, &ids).await?;
        for construction in &mut constructions {
            construction.images = images.remove(&construction.id.0).unwrap_or_default();
            construction.features = features.remove(&construction.id.0).unwrap_or_default();
        }
        Ok(constructions)
    }

    async fn first_product(&self, products: Vec<Product>) -> Result<Option<Product>, DatabaseError> {
        Ok(self.attach_products(products).await?.into_iter().next())
    }

    async fn first_variant(&self, variants: Vec<Variant>) -> Result<Option<Variant>, DatabaseError> {
        Ok(self.attach_variants(variants).await?.into_iter().next())
    }

    async fn first_construction(
        &self,
        constructions: Vec<Construction>,
    ) -> Result<Option<Construction>, DatabaseError> {
        Ok(self.attach_constructions(constructions).await?.into_iter().next())
    }

    async fn find_construction(&self, id: ConstructionId) -> Result<Option<Construction>, DatabaseError> {
        let rows = sqlx::query_as::<_, Construction>(&format!(
            "SELECT {CONSTRUCTION_COLUMNS} FROM constructions c WHERE c.id = $1 AND c.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        self.first_construction(rows).await
    }
}

#[async_trait]
impl CompanyStore for PgCatalog {
    async fn insert_company(&self, company: NewCompany) -> Result<Company, DatabaseError> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (name, company_type, web_site, email, authorized_name, \
             authorized_surname, is_supplier, is_constructor, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COMPANY_COLUMNS}"
        ))
        .bind(&company.name)
        .bind(&company.company_type)
        .bind(&company.web_site)
        .bind(&company.email)
        .bind(&company.authorized_name)
        .bind(&company.authorized_surname)
        .bind(company.is_supplier)
        .bind(company.is_constructor)
        .bind(&company.password_hash)
        .fetch_one(&self.pool)
        .await?;

        debug!(company_id = %row.id, "Inserted company");
        Ok(row)
    }

    async fn find_company_by_email(&self, email: &str) -> Result<Option<Company>, DatabaseError> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_company(&self, id: CompanyId) -> Result<Option<Company>, DatabaseError> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl FeatureStore for PgCatalog {
    async fn find_category(
        &self,
        scope: FeatureScope,
        id: CategoryId,
    ) -> Result<Option<Category>, DatabaseError> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "SELECT id, name, parent_id, description FROM {} WHERE id = $1",
            scope.category_table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn feature_definitions_by_category(
        &self,
        scope: FeatureScope,
        category: CategoryId,
    ) -> Result<Vec<FeatureDefinition>, DatabaseError> {
        let rows = sqlx::query_as::<_, FeatureDefinition>(&format!(
            "SELECT id, name, description, is_required, feature_type, category_id \
             FROM {} WHERE category_id = $1 ORDER BY id",
            scope.definition_table()
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn feature_definition(
        &self,
        scope: FeatureScope,
        id: FeatureId,
    ) -> Result<Option<FeatureDefinition>, DatabaseError> {
        let row = sqlx::query_as::<_, FeatureDefinition>(&format!(
            "SELECT id, name, description, is_required, feature_type, category_id \
             FROM {} WHERE id = $1",
            scope.definition_table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl ProductStore for PgCatalog {
    async fn count_products_by_spu(&self, spu: &str, company: CompanyId) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM products WHERE spu = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(spu)
        .bind(company)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (company_id, spu, name, description, is_active, hero_image, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(product.company_id)
        .bind(&product.spu)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.is_active)
        .bind(&product.hero_image)
        .bind(product.category_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::upsert_images(&mut tx, Owner::Product, id, &product.images).await?;
        Self::upsert_features(&mut tx, Owner::Product, id, &product.features).await?;
        tx.commit().await?;

        debug!(product_id = id, company_id = %product.company_id, "Inserted product");
        self.find_product(ProductId(id))
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("product {id}")))
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, DatabaseError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1 AND p.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        self.first_product(rows).await
    }

    async fn find_product_for_company(
        &self,
        id: ProductId,
        company: CompanyId,
    ) -> Result<Option<Product>, DatabaseError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.id = $1 AND p.company_id = $2 AND p.deleted_at IS NULL"
        ))
        .bind(id)
        .bind(company)
        .fetch_all(&self.pool)
        .await?;
        self.first_product(rows).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        company: CompanyId,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = now()");
        if let Some(spu) = changes.spu {
            query.push(", spu = ").push_bind(spu);
        }
        if let Some(name) = changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(is_active) = changes.is_active {
            query.push(", is_active = ").push_bind(is_active);
        }
        if let Some(hero_image) = changes.hero_image {
            query.push(", hero_image = ").push_bind(hero_image);
        }
        if let Some(category_id) = changes.category_id {
            query.push(", category_id = ").push_bind(category_id);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND company_id = ")
            .push_bind(company)
            .push(" AND deleted_at IS NULL");

        if query.build().execute(&mut *tx).await?.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::upsert_images(&mut tx, Owner::Product, id.0, &changes.images).await?;
        Self::upsert_features(&mut tx, Owner::Product, id.0, &changes.features).await?;
        tx.commit().await?;

        self.find_product(id).await
    }

    async fn delete_product(&self, id: ProductId, company: CompanyId) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "UPDATE products SET deleted_at = now() \
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(company)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        Self::soft_delete_children(&mut tx, Owner::Product, "SELECT $1::BIGINT", id.0).await?;
        Self::soft_delete_children(
            &mut tx,
            Owner::Variant,
            "SELECT id FROM variants WHERE product_id = $1 AND deleted_at IS NULL",
            id.0,
        )
        .await?;
        sqlx::query("UPDATE variants SET deleted_at = now() WHERE product_id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(product_id = %id, company_id = %company, "Soft-deleted product");
        Ok(removed)
    }

    async fn products_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Product>, DatabaseError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.deleted_at IS NULL AND p.category_id IN ({}) ORDER BY p.id",
            grandchild_categories(FeatureScope::Product)
        ))
        .bind(root)
        .fetch_all(&self.pool)
        .await?;
        self.attach_products(rows).await
    }
}

#[async_trait]
impl VariantStore for PgCatalog {
    async fn insert_variant(&self, variant: NewVariant) -> Result<Variant, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO variants (product_id, sku, name, description, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(variant.product_id)
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(&variant.description)
        .bind(variant.is_active)
        .fetch_one(&mut *tx)
        .await?;

        Self::upsert_images(&mut tx, Owner::Variant, id, &variant.images).await?;
        Self::upsert_features(&mut tx, Owner::Variant, id, &variant.features).await?;
        tx.commit().await?;

        self.find_variant(VariantId(id))
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("variant {id}")))
    }

    async fn find_variant(&self, id: VariantId) -> Result<Option<Variant>, DatabaseError> {
        let rows = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants v WHERE v.id = $1 AND v.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        self.first_variant(rows).await
    }

    async fn find_variant_for_company(
        &self,
        id: VariantId,
        company: CompanyId,
    ) -> Result<Option<Variant>, DatabaseError> {
        let rows = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants v JOIN products p ON p.id = v.product_id \
             WHERE v.id = $1 AND p.company_id = $2 AND v.deleted_at IS NULL AND p.deleted_at IS NULL"
        ))
        .bind(id)
        .bind(company)
        .fetch_all(&self.pool)
        .await?;
        self.first_variant(rows).await
    }

    async fn update_variant(
        &self,
        id: VariantId,
        company: CompanyId,
        changes: VariantChanges,
    ) -> Result<Option<Variant>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE variants SET updated_at = now()");
        if let Some(sku) = changes.sku {
            query.push(", sku = ").push_bind(sku);
        }
        if let Some(name) = changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = changes.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(is_active) = changes.is_active {
            query.push(", is_active = ").push_bind(is_active);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL AND product_id IN (SELECT id FROM products WHERE company_id = ")
            .push_bind(company)
            .push(" AND deleted_at IS NULL)");

        if query.build().execute(&mut *tx).await?.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::upsert_images(&mut tx, Owner::Variant, id.0, &changes.images).await?;
        Self::upsert_features(&mut tx, Owner::Variant, id.0, &changes.features).await?;
        tx.commit().await?;

        self.find_variant(id).await
    }

    async fn delete_variant(&self, id: VariantId, company: CompanyId) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "UPDATE variants SET deleted_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             AND product_id IN (SELECT id FROM products WHERE company_id = $2 AND deleted_at IS NULL)",
        )
        .bind(id)
        .bind(company)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        Self::soft_delete_children(&mut tx, Owner::Variant, "SELECT $1::BIGINT", id.0).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn variants_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Variant>, DatabaseError> {
        let rows = sqlx::query_as::<_, Variant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM variants v JOIN products p ON p.id = v.product_id \
             WHERE v.deleted_at IS NULL AND p.deleted_at IS NULL AND p.category_id IN ({}) \
             ORDER BY v.id",
            grandchild_categories(FeatureScope::Product)
        ))
        .bind(root)
        .fetch_all(&self.pool)
        .await?;
        self.attach_variants(rows).await
    }
}

#[async_trait]
impl ConstructionStore for PgCatalog {
    async fn insert_construction(
        &self,
        construction: NewConstruction,
    ) -> Result<Construction, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO constructions (company_id, name, category_id, geographic_region, province, \
             district, stage, start, \"end\", web_site, cost_of_project, land_area, construction_zone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING id",
        )
        .bind(construction.company_id)
        .bind(&construction.name)
        .bind(construction.category_id)
        .bind(&construction.geographic_region)
        .bind(&construction.province)
        .bind(&construction.district)
        .bind(&construction.stage)
        .bind(&construction.start)
        .bind(&construction.end)
        .bind(&construction.web_site)
        .bind(construction.cost_of_project)
        .bind(construction.land_area)
        .bind(construction.construction_zone)
        .fetch_one(&mut *tx)
        .await?;

        Self::upsert_images(&mut tx, Owner::Construction, id, &construction.images).await?;
        Self::upsert_features(&mut tx, Owner::Construction, id, &construction.features).await?;
        tx.commit().await?;

        debug!(construction_id = id, company_id = %construction.company_id, "Inserted construction");
        self.find_construction(ConstructionId(id))
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("construction {id}")))
    }

    async fn find_construction_for_company(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<Option<Construction>, DatabaseError> {
        let rows = sqlx::query_as::<_, Construction>(&format!(
            "SELECT {CONSTRUCTION_COLUMNS} FROM constructions c \
             WHERE c.id = $1 AND c.company_id = $2 AND c.deleted_at IS NULL"
        ))
        .bind(id)
        .bind(company)
        .fetch_all(&self.pool)
        .await?;
        self.first_construction(rows).await
    }

    async fn update_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
        changes: ConstructionChanges,
    ) -> Result<Option<Construction>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE constructions SET updated_at = now()");
        if let Some(name) = changes.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(region) = changes.geographic_region {
            query.push(", geographic_region = ").push_bind(region);
        }
        if let Some(province) = changes.province {
            query.push(", province = ").push_bind(province);
        }
        if let Some(district) = changes.district {
            query.push(", district = ").push_bind(district);
        }
        if let Some(stage) = changes.stage {
            query.push(", stage = ").push_bind(stage);
        }
        if let Some(start) = changes.start {
            query.push(", start = ").push_bind(start);
        }
        if let Some(end) = changes.end {
            query.push(", \"end\" = ").push_bind(end);
        }
        if let Some(web_site) = changes.web_site {
            query.push(", web_site = ").push_bind(web_site);
        }
        if let Some(cost) = changes.cost_of_project {
            query.push(", cost_of_project = ").push_bind(cost);
        }
        if let Some(area) = changes.land_area {
            query.push(", land_area = ").push_bind(area);
        }
        if let Some(zone) = changes.construction_zone {
            query.push(", construction_zone = ").push_bind(zone);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND company_id = ")
            .push_bind(company)
            .push(" AND deleted_at IS NULL");

        if query.build().execute(&mut *tx).await?.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::upsert_images(&mut tx, Owner::Construction, id.0, &changes.images).await?;
        Self::upsert_features(&mut tx, Owner::Construction, id.0, &changes.features).await?;
        tx.commit().await?;

        self.find_construction(id).await
    }

    async fn delete_construction(
        &self,
        id: ConstructionId,
        company: CompanyId,
    ) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "UPDATE constructions SET deleted_at = now() \
             WHERE id = $1 AND company_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(company)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        Self::soft_delete_children(&mut tx, Owner::Construction, "SELECT $1::BIGINT", id.0).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn constructions_in_grandchild_categories(
        &self,
        root: CategoryId,
    ) -> Result<Vec<Construction>, DatabaseError> {
        let rows = sqlx::query_as::<_, Construction>(&format!(
            "SELECT {CONSTRUCTION_COLUMNS} FROM constructions c \
             WHERE c.deleted_at IS NULL AND c.category_id IN ({}) ORDER BY c.id",
            grandchild_categories(FeatureScope::Construction)
        ))
        .bind(root)
        .fetch_all(&self.pool)
        .await?;
        self.attach_constructions(rows).await
    }
}
