pub mod codec;
pub mod password;
pub mod resolver;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::types::CompanyId;

pub use codec::{JwtCodec, TokenCodec, TokenError};
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use resolver::{AuthError, AuthResolver};
pub use session::{MemorySessionStore, PgSessionStore, SessionStore, SessionStoreError};

/// Company identity carried by both tokens of a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenProfile {
    pub company_id: CompanyId,
    #[serde(rename = "company_authorized_name")]
    pub authorized_name: String,
    #[serde(rename = "company_authorized_surname")]
    pub authorized_surname: String,
    pub email: String,
    pub is_supplier: bool,
    pub is_constructor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub profile: TokenProfile,
    pub access_uuid: String,
    pub authorized: bool,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(flatten)]
    pub profile: TokenProfile,
    pub refresh_uuid: String,
    pub exp: i64,
}

/// Signed access/refresh pair plus the session keys it is bound to
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(skip)]
    pub access_uuid: String,
    #[serde(skip)]
    pub refresh_uuid: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

/// Session identity resolved from a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDetails {
    pub access_uuid: String,
    pub company_id: CompanyId,
}

/// Authenticated caller injected into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthCompany {
    pub company_id: CompanyId,
    pub details: AccessDetails,
    pub profile: TokenProfile,
}
