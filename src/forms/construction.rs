use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::product::ImageForm;
use super::{not_blank, one_of, optional_url, quarter};
use crate::types::{CategoryId, RawFeature};

pub const GEOGRAPHIC_REGIONS: [&str; 7] = [
    "Marmara",
    "Ege",
    "İç Anadolu",
    "Akdeniz",
    "Karadeniz",
    "Doğu Anadolu",
    "Güneydoğu Anadolu",
];

pub const STAGES: [&str; 8] = [
    "Proje",
    "Temel",
    "Kaba",
    "İnce",
    "Tamamlandı",
    "Beklemede",
    "Devam Ediyor",
    "Planlanan",
];

fn region(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    one_of(value, &GEOGRAPHIC_REGIONS)
}

fn stage(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    one_of(value, &STAGES)
}

fn period(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    quarter(value)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConstructionForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: String,
    pub construction_category_id: CategoryId,
    #[serde(default)]
    #[validate(custom(function = "region"))]
    pub geographic_region: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub province: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub district: String,
    #[serde(default)]
    #[validate(custom(function = "stage"))]
    pub stage: String,
    #[serde(default)]
    #[validate(custom(function = "period"))]
    pub start: String,
    #[serde(default)]
    #[validate(custom(function = "period"))]
    pub end: String,
    #[serde(default)]
    #[validate(custom(function = "optional_url"), length(max = 255))]
    pub web_site: Option<String>,
    #[validate(range(min = 0.0))]
    pub cost_of_project: f64,
    #[validate(range(min = 0.0))]
    pub land_area: f64,
    #[serde(rename = "Construction_zone", alias = "construction_zone")]
    #[validate(range(min = 0.0))]
    pub construction_zone: f64,
    #[serde(default)]
    #[validate(nested)]
    pub construction_images: Vec<ImageForm>,
    #[serde(default)]
    #[validate(nested)]
    pub construction_features: Vec<RawFeature>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateConstructionForm {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "region"))]
    pub geographic_region: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub province: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub district: Option<String>,
    #[validate(custom(function = "self::stage"))]
    pub stage: Option<String>,
    #[validate(custom(function = "period"))]
    pub start: Option<String>,
    #[validate(custom(function = "period"))]
    pub end: Option<String>,
    #[validate(custom(function = "optional_url"), length(max = 255))]
    pub web_site: Option<String>,
    #[validate(range(min = 0.0))]
    pub cost_of_project: Option<f64>,
    #[validate(range(min = 0.0))]
    pub land_area: Option<f64>,
    #[serde(rename = "Construction_zone", alias = "construction_zone")]
    #[validate(range(min = 0.0))]
    pub construction_zone: Option<f64>,
    #[serde(default)]
    #[validate(nested)]
    pub construction_images: Vec<ImageForm>,
    #[validate(nested)]
    pub construction_features: Option<Vec<RawFeature>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::ValidateForm;
    use serde_json::json;

    fn create_json() -> serde_json::Value {
        json!({
            "name": "Deniz Konutları",
            "construction_category_id": 3,
            "geographic_region": "Ege",
            "province": "İzmir",
            "district": "Karşıyaka",
            "stage": "Kaba",
            "start": "2024 - 1.Çeyrek",
            "end": "2026 - 4.Çeyrek",
            "cost_of_project": 1250000.5,
            "land_area": 4200,
            "Construction_zone": 3100.25
        })
    }

    #[test]
    fn valid_create_form() {
        let form: CreateConstructionForm = serde_json::from_value(create_json()).unwrap();
        assert!(form.validate_fields().is_ok());
        assert_eq!(form.construction_zone, 3100.25);
    }

    #[test]
    fn rejects_unknown_region_stage_and_negative_amounts() {
        let mut body = create_json();
        body["geographic_region"] = json!("Trakya");
        body["stage"] = json!("Bitti");
        body["land_area"] = json!(-1);
        body["end"] = json!("2026 Q4");

        let form: CreateConstructionForm = serde_json::from_value(body).unwrap();
        let errors = form.validate_fields().unwrap_err();
        for field in ["geographic_region", "stage", "land_area", "end"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
        assert!(errors["land_area"].starts_with("The value has exceeded the minimum limit"));
    }

    #[test]
    fn negative_zone_is_rejected() {
        let mut body = create_json();
        body["Construction_zone"] = json!(-5);
        let form: CreateConstructionForm = serde_json::from_value(body).unwrap();
        assert_eq!(form.validate_fields().unwrap_err().len(), 1);
    }

    #[test]
    fn update_checks_quarter_format_when_present() {
        let form = UpdateConstructionForm {
            start: Some("bad".to_string()),
            ..Default::default()
        };
        assert!(form.validate_fields().unwrap_err().contains_key("start"));
        assert!(UpdateConstructionForm::default().validate_fields().is_ok());
    }
}
