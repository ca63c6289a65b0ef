/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Declares an integer-backed identifier that serializes and binds as its inner value.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }
    };
}

entity_id!(
    /// Tenant identifier; every owned entity carries one.
    CompanyId
);
entity_id!(CategoryId);
entity_id!(FeatureId);
entity_id!(ProductId);
entity_id!(VariantId);
entity_id!(ConstructionId);
entity_id!(ImageId);

/// Primitive type declared by a feature definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Integer,
    #[serde(alias = "float64")]
    Float,
    Boolean,
    String,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Integer => "integer",
            FeatureType::Float => "float",
            FeatureType::Boolean => "boolean",
            FeatureType::String => "string",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature type '{0}'")]
pub struct UnknownFeatureType(pub String);

impl FromStr for FeatureType {
    type Err = UnknownFeatureType;

    // Stored rows written by older tooling use Go-style names ("float64").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(FeatureType::Integer),
            "float" | "float64" => Ok(FeatureType::Float),
            "boolean" | "bool" => Ok(FeatureType::Boolean),
            "string" => Ok(FeatureType::String),
            _ => Err(UnknownFeatureType(s.to_string())),
        }
    }
}

/// A feature value after it has been checked against its declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl FeatureValue {
    /// Parse a raw wire value as the given type. Returns `None` when the value
    /// does not conform.
    pub fn parse(feature_type: FeatureType, raw: &str) -> Option<Self> {
        match feature_type {
            FeatureType::Integer => raw.parse::<i64>().ok().map(FeatureValue::Integer),
            FeatureType::Float => raw.parse::<f64>().ok().map(FeatureValue::Float),
            FeatureType::Boolean => parse_bool(raw).map(FeatureValue::Bool),
            FeatureType::String => Some(FeatureValue::Text(raw.to_string())),
        }
    }

    pub fn feature_type(&self) -> FeatureType {
        match self {
            FeatureValue::Integer(_) => FeatureType::Integer,
            FeatureValue::Float(_) => FeatureType::Float,
            FeatureValue::Bool(_) => FeatureType::Boolean,
            FeatureValue::Text(_) => FeatureType::String,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "t", "1"];
    const FALSE: [&str; 3] = ["false", "f", "0"];

    if TRUE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Some(true)
    } else if FALSE.iter().any(|lit| raw.eq_ignore_ascii_case(lit)) {
        Some(false)
    } else {
        None
    }
}

/// A `(feature_id, value)` pair as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RawFeature {
    pub feature_id: FeatureId,
    #[validate(custom(function = "crate::forms::not_blank"))]
    pub value: String,
}

impl RawFeature {
    pub fn new(feature_id: impl Into<FeatureId>, value: impl Into<String>) -> Self {
        Self {
            feature_id: feature_id.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_feature_type_names() {
        assert_eq!("integer".parse::<FeatureType>().unwrap(), FeatureType::Integer);
        assert_eq!("float64".parse::<FeatureType>().unwrap(), FeatureType::Float);
        assert_eq!("Boolean".parse::<FeatureType>().unwrap(), FeatureType::Boolean);
        assert!("decimal".parse::<FeatureType>().is_err());
    }

    #[test]
    fn integer_values_reject_fractions_and_words() {
        assert_eq!(
            FeatureValue::parse(FeatureType::Integer, "-42"),
            Some(FeatureValue::Integer(-42))
        );
        assert_eq!(FeatureValue::parse(FeatureType::Integer, "4.2"), None);
        assert_eq!(FeatureValue::parse(FeatureType::Integer, "abc"), None);
    }

    #[test]
    fn boolean_values_are_case_insensitive() {
        assert_eq!(
            FeatureValue::parse(FeatureType::Boolean, "TRUE"),
            Some(FeatureValue::Bool(true))
        );
        assert_eq!(
            FeatureValue::parse(FeatureType::Boolean, "0"),
            Some(FeatureValue::Bool(false))
        );
        assert_eq!(FeatureValue::parse(FeatureType::Boolean, "yes"), None);
    }

    #[test]
    fn string_values_accept_anything() {
        let value = FeatureValue::parse(FeatureType::String, "").unwrap();
        assert_eq!(value.feature_type(), FeatureType::String);
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&CompanyId(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!("12".parse::<CompanyId>().unwrap(), CompanyId(12));
    }
}
