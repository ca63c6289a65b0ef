use serde::{Deserialize, Serialize};
use validator::Validate;

use super::not_blank;
use crate::database::models::NewImage;
use crate::types::{CategoryId, ProductId, RawFeature};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub remote_link: String,
}

impl From<ImageForm> for NewImage {
    fn from(form: ImageForm) -> Self {
        NewImage {
            remote_link: form.remote_link,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub spu: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub hero_image: String,
    #[serde(default)]
    #[validate(nested)]
    pub product_images: Vec<ImageForm>,
    #[serde(default)]
    #[validate(nested)]
    pub features: Vec<RawFeature>,
    pub category_id: CategoryId,
}

/// Partial product update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductForm {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub spu: Option<String>,
    pub is_active: Option<bool>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub hero_image: Option<String>,
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    #[validate(nested)]
    pub product_images: Vec<ImageForm>,
    #[validate(nested)]
    pub features: Option<Vec<RawFeature>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVariantForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub sku: String,
    pub product_id: ProductId,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    #[validate(nested)]
    pub variant_images: Vec<ImageForm>,
    #[serde(default)]
    #[validate(nested)]
    pub features: Vec<RawFeature>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVariantForm {
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = "not_blank"), length(max = 64))]
    pub sku: Option<String>,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub variant_images: Vec<ImageForm>,
    #[validate(nested)]
    pub features: Option<Vec<RawFeature>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::ValidateForm;
    use serde_json::json;

    #[test]
    fn create_form_defaults() {
        let form: CreateProductForm =
            serde_json::from_value(json!({"name": "Drill", "spu": "SPU-1", "category_id": 5})).unwrap();
        assert!(form.is_active);
        assert!(form.features.is_empty());
        assert!(form.validate_fields().is_ok());
    }

    #[test]
    fn empty_image_links_are_rejected() {
        let form: CreateVariantForm = serde_json::from_value(json!({
            "name": "Red",
            "sku": "SKU-1",
            "product_id": 3,
            "variant_images": [{"remote_link": "https://cdn.example.com/a.png"}, {"remote_link": ""}],
            "features": [{"feature_id": 1, "value": ""}]
        }))
        .unwrap();

        let errors = form.validate_fields().unwrap_err();
        assert!(errors.contains_key("variant_images[1].remote_link"));
        assert!(errors.contains_key("features[0].value"));
    }

    #[test]
    fn update_form_distinguishes_missing_from_empty_features() {
        let absent: UpdateProductForm = serde_json::from_value(json!({"name": "New"})).unwrap();
        let empty: UpdateProductForm = serde_json::from_value(json!({"features": []})).unwrap();
        assert!(absent.features.is_none());
        assert_eq!(empty.features, Some(Vec::new()));
    }

    #[test]
    fn update_checks_present_fields_only() {
        assert!(UpdateVariantForm::default().validate_fields().is_ok());

        let form: UpdateVariantForm = serde_json::from_value(json!({
            "sku": "",
            "features": [{"feature_id": 1, "value": "4"}, {"feature_id": 2, "value": " "}]
        }))
        .unwrap();
        let errors = form.validate_fields().unwrap_err();
        assert!(errors.contains_key("sku"));
        assert!(errors.contains_key("features[1].value"));
        assert_eq!(errors.len(), 2);
    }
}
