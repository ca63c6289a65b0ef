use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::{not_blank, one_of, optional_url};

/// Legal forms a company may register under
pub const COMPANY_TYPES: [&str; 8] = [
    "Anonim Şirketi",
    "Şahıs",
    "Limited Şirketi",
    "Kollektif Şirket",
    "Adi Ortaklık",
    "Adi Komandit Şirket",
    "Sermayesi Paylara Bölünmüş Komandit Şirket",
    "Diğer",
];

fn legal_form(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    one_of(value, &COMPANY_TYPES)
}

/// Field rules only; the capability policy is applied by the company service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "legal_form"))]
    pub company_type: String,
    #[serde(default)]
    #[validate(custom(function = "optional_url"), length(max = 255))]
    pub web_site: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 75), email)]
    pub email: String,
    #[serde(default, alias = "company_authorized_name")]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub authorized_name: String,
    #[serde(default, alias = "company_authorized_surname")]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub authorized_surname: String,
    #[serde(default)]
    pub is_supplier: bool,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub password: String,
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        must_match(other = "password", message = "This value has to be equal password.")
    )]
    pub password_again: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 75), email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"), length(max = 100))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub refresh_token: String,
}
