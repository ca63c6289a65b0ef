//! Request forms and their field-level validation.
//!
//! Forms derive `validator::Validate`; `validate_fields()` flattens the
//! resulting `ValidationErrors` into one message per field, keyed by the JSON
//! field name (nested entries as `features[2].value`).

pub mod company;
pub mod construction;
pub mod product;

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use validator::{Validate, ValidateUrl, ValidationError, ValidationErrors, ValidationErrorsKind};

pub use company::{LoginForm, RefreshForm, SignupForm};
pub use construction::{CreateConstructionForm, UpdateConstructionForm};
pub use product::{
    CreateProductForm, CreateVariantForm, ImageForm, UpdateProductForm, UpdateVariantForm,
};

pub type FieldErrors = HashMap<String, String>;

const REQUIRED: &str = "This field is required. Please do not empty.";

/// `YYYY - N?Çeyrek`, e.g. "2024 - 3.Çeyrek"
static QUARTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4} - [1-4].Çeyrek$").expect("quarter pattern compiles"));

/// Runs the derived rules and reports them as [`FieldErrors`]
pub trait ValidateForm: Validate {
    fn validate_fields(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(field_errors)
    }
}

impl<T: Validate> ValidateForm for T {}

pub fn field_errors(errors: ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    collect("", errors, &mut fields);
    fields
}

fn collect(prefix: &str, errors: ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.into_errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errors) => {
                if let Some(message) = describe(&errors) {
                    out.insert(path, message);
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(&path, *inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{path}[{index}]"), *inner, out);
                }
            }
        }
    }
}

// A blank value reports only the required message
fn describe(errors: &[ValidationError]) -> Option<String> {
    let error = errors
        .iter()
        .find(|e| e.code == "required")
        .or_else(|| errors.first())?;

    if let Some(message) = &error.message {
        return Some(message.to_string());
    }
    let value = param(error, "value");
    let message = match error.code.as_ref() {
        "length" => match error.params.get("max") {
            Some(max) => format!("The value has exceeded the maximum limit. Maximum Limit: {max}"),
            None => REQUIRED.to_string(),
        },
        "range" => format!(
            "The value has exceeded the minimum limit. Minumum Limit: {}. Value: {value}",
            param(error, "min")
        ),
        "email" => format!("This value is not a valid email. Value: {value}"),
        _ => format!("This value is not valid. Value: {value}"),
    };
    Some(message)
}

fn param(error: &ValidationError, name: &str) -> String {
    match error.params.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", REQUIRED.to_string()));
    }
    Ok(())
}

pub(crate) fn one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(invalid("one_of", format!("This value is not valid. Value: {value}")))
}

pub(crate) fn quarter(value: &str) -> Result<(), ValidationError> {
    if QUARTER.is_match(value) {
        return Ok(());
    }
    Err(invalid(
        "quarter",
        format!("This value is not valid. Expected format 'YYYY - N.Çeyrek'. Value: {value}"),
    ))
}

/// An empty web site counts as absent
pub(crate) fn optional_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_url() {
        return Ok(());
    }
    Err(invalid("url", format!("This value is not valid. Value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(custom(function = "not_blank"), length(max = 3))]
        name: String,
        #[validate(email)]
        email: String,
        #[validate(custom(function = "optional_url"))]
        web_site: String,
    }

    fn sample(name: &str, email: &str, web_site: &str) -> Sample {
        Sample {
            name: name.to_string(),
            email: email.to_string(),
            web_site: web_site.to_string(),
        }
    }

    #[test]
    fn quarter_format() {
        assert!(quarter("2024 - 3.Çeyrek").is_ok());
        assert!(quarter("1999 - 1 Çeyrek").is_ok());
        assert!(quarter("2024 - 5.Çeyrek").is_err());
        assert!(quarter("24 - 3.Çeyrek").is_err());
        assert!(quarter("2024-3.Çeyrek").is_err());
        assert!(quarter("2024 - 3.Ceyrek").is_err());
    }

    #[test]
    fn malformed_emails_and_urls_are_rejected() {
        for email in ["a@b..c", "x@a.-com", "@firma.com", "in fo@firma.com"] {
            let errors = sample("ok", email, "").validate_fields().unwrap_err();
            assert!(errors.contains_key("email"), "{email} accepted");
        }
        for url in ["http://:::", "http://??", "yapimarket"] {
            let errors = sample("ok", "info@firma.com.tr", url).validate_fields().unwrap_err();
            assert!(errors.contains_key("web_site"), "{url} accepted");
        }
        assert!(sample("ok", "info@firma.com.tr", "https://firma.com.tr").validate_fields().is_ok());
    }

    #[test]
    fn blank_beats_other_messages_and_lengths_are_reported() {
        let errors = sample("   ", "info@firma.com.tr", "").validate_fields().unwrap_err();
        assert_eq!(errors["name"], REQUIRED);

        let errors = sample("long", "info@firma.com.tr", "").validate_fields().unwrap_err();
        assert_eq!(
            errors["name"],
            "The value has exceeded the maximum limit. Maximum Limit: 3"
        );
    }
}
