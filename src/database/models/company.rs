use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::CompanyId;

/// A registered company: the tenant that owns products and constructions
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub company_type: String,
    pub web_site: Option<String>,
    pub email: String,
    pub authorized_name: String,
    pub authorized_surname: String,
    pub is_active: bool,
    pub is_supplier: bool,
    pub is_constructor: bool,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub company_type: String,
    pub web_site: Option<String>,
    pub email: String,
    pub authorized_name: String,
    pub authorized_surname: String,
    pub is_supplier: bool,
    pub is_constructor: bool,
    pub password_hash: String,
}
