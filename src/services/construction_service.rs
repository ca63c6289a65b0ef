use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use super::feature_schema::{CatalogFeatures, FeatureSchemaValidator};
use super::{codes, ServiceError, ServiceResult};
use crate::database::models::{
    Construction, ConstructionChanges, NewConstruction, NewFeatureValue, NewImage,
};
use crate::database::{ConstructionStore, FeatureScope, FeatureStore};
use crate::forms::{CreateConstructionForm, UpdateConstructionForm, ValidateForm};
use crate::types::{CategoryId, CompanyId, ConstructionId, RawFeature};

pub struct ConstructionService {
    constructions: Arc<dyn ConstructionStore>,
    catalog: Arc<dyn FeatureStore>,
    features: FeatureSchemaValidator<CatalogFeatures>,
}

impl ConstructionService {
    pub fn new(constructions: Arc<dyn ConstructionStore>, catalog: Arc<dyn FeatureStore>) -> Self {
        let features = FeatureSchemaValidator::new(CatalogFeatures::new(
            catalog.clone(),
            FeatureScope::Construction,
        ));
        Self {
            constructions,
            catalog,
            features,
        }
    }

    pub async fn create(
        &self,
        form: CreateConstructionForm,
        company: CompanyId,
    ) -> ServiceResult<Construction> {
        let code = codes::CONSTRUCTION_NOT_CREATED;
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(code, fields))?;

        self.ensure_category(form.construction_category_id).await?;
        let features = self
            .validate_features(form.construction_category_id, &form.construction_features)
            .await?;

        let construction = self
            .constructions
            .insert_construction(NewConstruction {
                company_id: company,
                name: form.name,
                category_id: form.construction_category_id,
                geographic_region: form.geographic_region,
                province: form.province,
                district: form.district,
                stage: form.stage,
                start: form.start,
                end: form.end,
                web_site: form.web_site.filter(|w| !w.is_empty()),
                cost_of_project: to_amount("cost_of_project", form.cost_of_project, code)?,
                land_area: to_amount("land_area", form.land_area, code)?,
                construction_zone: to_amount("Construction_zone", form.construction_zone, code)?,
                images: form.construction_images.into_iter().map(NewImage::from).collect(),
                features,
            })
            .await
            .map_err(|e| ServiceError::database(code, "construction can not created", e))?;

        info!(construction_id = %construction.id, company_id = %company, "Created construction");
        Ok(construction)
    }

    pub async fn update(
        &self,
        form: UpdateConstructionForm,
        id: ConstructionId,
        company: CompanyId,
    ) -> ServiceResult<Construction> {
        let code = codes::CONSTRUCTION_NOT_UPDATED;
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(code, fields))?;

        let current = self.find_by_id(id, company).await?;
        let features = match &form.construction_features {
            Some(features) => self.validate_features(current.category_id, features).await?,
            None => Vec::new(),
        };

        let changes = ConstructionChanges {
            name: form.name,
            geographic_region: form.geographic_region,
            province: form.province,
            district: form.district,
            stage: form.stage,
            start: form.start,
            end: form.end,
            web_site: form.web_site,
            cost_of_project: optional_amount("cost_of_project", form.cost_of_project, code)?,
            land_area: optional_amount("land_area", form.land_area, code)?,
            construction_zone: optional_amount("Construction_zone", form.construction_zone, code)?,
            images: form.construction_images.into_iter().map(NewImage::from).collect(),
            features,
        };
        let construction = self
            .constructions
            .update_construction(id, company, changes)
            .await
            .map_err(|e| ServiceError::database(code, "construction can not updated", e))?
            .ok_or_else(|| construction_not_found(id))?;

        info!(construction_id = %id, company_id = %company, "Updated construction");
        Ok(construction)
    }

    pub async fn delete(&self, id: ConstructionId, company: CompanyId) -> ServiceResult<()> {
        let removed = self
            .constructions
            .delete_construction(id, company)
            .await
            .map_err(|e| {
                ServiceError::database(codes::CONSTRUCTION_NOT_DELETED, "construction can not deleted", e)
            })?;
        if removed == 0 {
            return Err(construction_not_found(id));
        }

        info!(construction_id = %id, company_id = %company, "Deleted construction");
        Ok(())
    }

    /// Constructions are only visible to the company that listed them
    pub async fn find_by_id(&self, id: ConstructionId, company: CompanyId) -> ServiceResult<Construction> {
        self.constructions
            .find_construction_for_company(id, company)
            .await
            .map_err(|e| {
                ServiceError::database(codes::CONSTRUCTION_NOT_FOUND, "construction lookup failed", e)
            })?
            .ok_or_else(|| construction_not_found(id))
    }

    pub async fn find_all_by_category(&self, category: CategoryId) -> ServiceResult<Vec<Construction>> {
        let constructions = self
            .constructions
            .constructions_in_grandchild_categories(category)
            .await
            .map_err(|e| {
                ServiceError::database(codes::CONSTRUCTION_NOT_FOUND, "construction listing failed", e)
            })?;
        debug!(category_id = %category, count = constructions.len(), "Listed constructions");
        Ok(constructions)
    }

    async fn ensure_category(&self, category: CategoryId) -> ServiceResult<()> {
        let found = self
            .catalog
            .find_category(FeatureScope::Construction, category)
            .await
            .map_err(|e| {
                ServiceError::database(codes::CONSTRUCTION_CATEGORY_NOT_FOUND, "category lookup failed", e)
            })?;
        match found {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(
                codes::CONSTRUCTION_CATEGORY_NOT_FOUND,
                "construction category can not found",
            )),
        }
    }

    async fn validate_features(
        &self,
        category: CategoryId,
        values: &[RawFeature],
    ) -> ServiceResult<Vec<NewFeatureValue>> {
        let validated = self
            .features
            .validate(category, values)
            .await
            .map_err(|e| ServiceError::features(codes::CONSTRUCTION_FEATURE_WRONG_TYPE, e))?;
        Ok(validated.into_iter().map(NewFeatureValue::from).collect())
    }
}

fn construction_not_found(id: ConstructionId) -> ServiceError {
    ServiceError::not_found(codes::CONSTRUCTION_NOT_FOUND, format!("construction {id} can not found"))
}

/// Two-decimal amount; the form layer has already rejected negatives and non-finite input
fn to_amount(field: &str, value: f64, code: u16) -> ServiceResult<Decimal> {
    Decimal::from_f64(value)
        .filter(|d| !d.is_sign_negative())
        .map(|d| d.round_dp(2))
        .ok_or_else(|| ServiceError::invalid(code, field, format!("This value is not valid. Value: {value}")))
}

fn optional_amount(field: &str, value: Option<f64>, code: u16) -> ServiceResult<Option<Decimal>> {
    value.map(|v| to_amount(field, v, code)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryCatalog;
    use crate::services::ErrorKind;
    use crate::types::{FeatureId, FeatureType};
    use std::str::FromStr;

    struct Fixture {
        service: ConstructionService,
        category: CategoryId,
        floors: FeatureId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryCatalog::new());
        let category = store
            .seed_category(FeatureScope::Construction, "Konut", None)
            .await
            .id;
        let floors = store
            .seed_feature(FeatureScope::Construction, category, "floors", FeatureType::Integer, true)
            .await
            .id;
        Fixture {
            service: ConstructionService::new(store.clone(), store),
            category,
            floors,
        }
    }

    fn form(category: CategoryId, features: Vec<RawFeature>) -> CreateConstructionForm {
        CreateConstructionForm {
            name: "Deniz Konutları".to_string(),
            construction_category_id: category,
            geographic_region: "Ege".to_string(),
            province: "İzmir".to_string(),
            district: "Karşıyaka".to_string(),
            stage: "Kaba".to_string(),
            start: "2024 - 1.Çeyrek".to_string(),
            end: "2026 - 4.Çeyrek".to_string(),
            web_site: None,
            cost_of_project: 1_250_000.456,
            land_area: 4200.0,
            construction_zone: 3100.25,
            construction_images: Vec::new(),
            construction_features: features,
        }
    }

    #[tokio::test]
    async fn amounts_are_rounded_to_two_places() {
        let f = fixture().await;
        let construction = f
            .service
            .create(form(f.category, vec![RawFeature::new(f.floors, "12")]), CompanyId(1))
            .await
            .unwrap();

        assert_eq!(construction.cost_of_project, Decimal::from_str("1250000.46").unwrap());
        assert_eq!(construction.construction_zone, Decimal::from_str("3100.25").unwrap());
    }

    #[tokio::test]
    async fn negative_amounts_fail_form_validation() {
        let f = fixture().await;
        let mut bad = form(f.category, vec![RawFeature::new(f.floors, "12")]);
        bad.land_area = -5.0;

        let err = f.service.create(bad, CompanyId(1)).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation { ref fields, .. } if fields.contains_key("land_area")));
        assert_eq!(err.code, codes::CONSTRUCTION_NOT_CREATED);
    }

    #[tokio::test]
    async fn create_checks_features() {
        let f = fixture().await;
        let err = f
            .service
            .create(form(f.category, vec![RawFeature::new(f.floors, "on iki")]), CompanyId(1))
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::CONSTRUCTION_FEATURE_WRONG_TYPE);

        let err = f.service.create(form(f.category, Vec::new()), CompanyId(1)).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::FeatureSchema(_)));
    }

    #[tokio::test]
    async fn reads_and_writes_are_scoped_to_owner() {
        let f = fixture().await;
        let construction = f
            .service
            .create(form(f.category, vec![RawFeature::new(f.floors, "12")]), CompanyId(1))
            .await
            .unwrap();

        assert!(f.service.find_by_id(construction.id, CompanyId(2)).await.is_err());

        let changes = UpdateConstructionForm {
            stage: Some("İnce".to_string()),
            ..Default::default()
        };
        let foreign = f
            .service
            .update(changes.clone(), construction.id, CompanyId(2))
            .await
            .unwrap_err();
        let missing = f
            .service
            .update(changes.clone(), ConstructionId(9999), CompanyId(1))
            .await
            .unwrap_err();
        assert_eq!(foreign.code, codes::CONSTRUCTION_NOT_FOUND);
        assert_eq!(foreign.code, missing.code);

        let updated = f.service.update(changes, construction.id, CompanyId(1)).await.unwrap();
        assert_eq!(updated.stage, "İnce");
        assert_eq!(updated.province, "İzmir");

        f.service.delete(construction.id, CompanyId(1)).await.unwrap();
        let err = f.service.delete(construction.id, CompanyId(1)).await.unwrap_err();
        assert_eq!(err.code, codes::CONSTRUCTION_NOT_FOUND);
    }
}
