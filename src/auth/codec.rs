use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::{AccessClaims, RefreshClaims};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Signs and verifies access and refresh claims
pub trait TokenCodec: Send + Sync {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, TokenError>;
    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, TokenError>;
    fn parse_access(&self, token: &str) -> Result<AccessClaims, TokenError>;
    fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError>;
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// HS256 codec with separate access and refresh secrets
pub struct JwtCodec {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            validation,
        }
    }

    fn sign<T: Serialize>(keys: &KeyPair, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn parse<T: DeserializeOwned>(&self, keys: &KeyPair, token: &str) -> Result<T, TokenError> {
        Ok(decode::<T>(token, &keys.decoding, &self.validation)?.claims)
    }
}

impl TokenCodec for JwtCodec {
    fn sign_access(&self, claims: &AccessClaims) -> Result<String, TokenError> {
        Self::sign(&self.access, claims)
    }

    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<String, TokenError> {
        Self::sign(&self.refresh, claims)
    }

    fn parse_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.parse(&self.access, token)
    }

    fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.parse(&self.refresh, token)
    }
}
