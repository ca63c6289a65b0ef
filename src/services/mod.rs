pub mod company_service;
pub mod construction_service;
pub mod feature_schema;
pub mod feature_service;
pub mod product_service;
pub mod variant_service;

use thiserror::Error;

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::forms::FieldErrors;

pub use company_service::CompanyService;
pub use construction_service::ConstructionService;
pub use feature_schema::{
    CatalogFeatures, FeatureDefinitionProvider, FeatureSchemaError, FeatureSchemaValidator,
    ValidatedFeature,
};
pub use feature_service::FeatureService;
pub use product_service::ProductService;
pub use variant_service::VariantService;

/// Numeric codes reported alongside every service outcome
pub mod codes {
    // Product (1xx success, 3xx failure)
    pub const PRODUCT_CREATED: u16 = 100;
    pub const PRODUCT_DELETED: u16 = 101;
    pub const PRODUCT_FOUND: u16 = 102;
    pub const PRODUCT_UPDATED: u16 = 103;
    pub const PRODUCT_NOT_CREATED: u16 = 300;
    pub const PRODUCT_CATEGORY_NOT_FOUND: u16 = 301;
    pub const PRODUCT_NOT_UPDATED: u16 = 302;
    pub const PRODUCT_NOT_FOUND: u16 = 303;
    pub const PRODUCT_NOT_DELETED: u16 = 304;
    pub const PRODUCT_SPU_NOT_UNIQUE: u16 = 305;

    // Variant
    pub const VARIANT_CREATED: u16 = 200;
    pub const VARIANT_DELETED: u16 = 201;
    pub const VARIANT_FOUND: u16 = 202;
    pub const VARIANT_UPDATED: u16 = 203;
    pub const VARIANT_NOT_CREATED: u16 = 400;
    pub const VARIANT_FEATURE_WRONG_TYPE: u16 = 401;
    pub const VARIANT_NOT_FOUND: u16 = 402;
    pub const VARIANT_NOT_UPDATED: u16 = 403;
    pub const VARIANT_NOT_DELETED: u16 = 404;

    // Features
    pub const FEATURE_NOT_FOUND: u16 = 500;
    pub const FEATURES_RECEIVED: u16 = 600;

    // Construction
    pub const CONSTRUCTION_CREATED: u16 = 800;
    pub const CONSTRUCTION_UPDATED: u16 = 801;
    pub const CONSTRUCTION_DELETED: u16 = 802;
    pub const CONSTRUCTION_FOUND: u16 = 803;
    pub const CONSTRUCTION_NOT_CREATED: u16 = 900;
    pub const CONSTRUCTION_FEATURE_WRONG_TYPE: u16 = 901;
    pub const CONSTRUCTION_NOT_FOUND: u16 = 902;
    pub const CONSTRUCTION_NOT_UPDATED: u16 = 903;
    pub const CONSTRUCTION_NOT_DELETED: u16 = 904;
    pub const CONSTRUCTION_CATEGORY_NOT_FOUND: u16 = 905;

    // Company and sessions
    pub const COMPANY_CREATED: u16 = 1200;
    pub const LOGGED_IN: u16 = 1201;
    pub const LOGGED_OUT: u16 = 1202;
    pub const TOKEN_REFRESHED: u16 = 1203;
    pub const FORM_VALIDATION: u16 = 1300;
    pub const EMAIL_ALREADY_EXISTS: u16 = 1301;
    pub const CREDENTIALS_INCORRECT: u16 = 1302;
    pub const COMPANY_NOT_SAVED: u16 = 1303;
    pub const UNAUTHENTICATED: u16 = 1304;
    pub const UNAUTHORIZED: u16 = 1305;
}

/// Failure category at the service boundary
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    #[error(transparent)]
    FeatureSchema(FeatureSchemaError),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Service outcome failure: a kind plus the numeric code reported to clients
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub code: u16,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn new(kind: ErrorKind, code: u16) -> Self {
        Self { kind, code }
    }

    pub fn validation(code: u16, fields: FieldErrors) -> Self {
        Self::new(
            ErrorKind::Validation {
                message: "form validation error".to_string(),
                fields,
            },
            code,
        )
    }

    pub fn invalid(code: u16, field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), message.into());
        Self::validation(code, fields)
    }

    pub fn not_found(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(message.into()), code)
    }

    pub fn conflict(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict(message.into()), code)
    }

    pub fn authentication(code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication(message.into()), code)
    }

    pub fn store<E>(code: u16, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(
            ErrorKind::Store {
                message: message.into(),
                source: Box::new(source),
            },
            code,
        )
    }

    /// Map a catalog failure; unique violations become conflicts
    pub fn database(code: u16, message: &str, err: DatabaseError) -> Self {
        match err {
            DatabaseError::Conflict(detail) => Self::conflict(code, format!("{message}: {detail}")),
            DatabaseError::NotFound(detail) => Self::not_found(code, format!("{message}: {detail}")),
            other => Self::store(code, message, other),
        }
    }

    /// Map a feature validation failure; `code` applies to type and required-ness failures
    pub fn features(code: u16, err: FeatureSchemaError) -> Self {
        match err {
            FeatureSchemaError::UnknownFeature(id) => {
                Self::not_found(codes::FEATURE_NOT_FOUND, format!("feature {id} not found"))
            }
            FeatureSchemaError::Store(db) => Self::store(code, "feature definitions unavailable", db),
            other => Self::new(ErrorKind::FeatureSchema(other), code),
        }
    }

    pub fn auth(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated(msg) => Self::authentication(codes::UNAUTHENTICATED, msg),
            AuthError::Unauthorized(msg) => {
                Self::new(ErrorKind::Authorization(msg), codes::UNAUTHORIZED)
            }
            AuthError::Token(e) => Self::store(codes::UNAUTHENTICATED, "token signing failed", e),
            AuthError::Store(e) => Self::store(codes::UNAUTHENTICATED, "session store unavailable", e),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        Self::auth(err)
    }
}
