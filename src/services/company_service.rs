use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{codes, ServiceError, ServiceResult};
use crate::auth::{
    AccessDetails, AuthResolver, PasswordError, PasswordHasher, TokenPair, TokenProfile,
};
use crate::config::CapabilityPolicy;
use crate::database::models::{Company, NewCompany};
use crate::database::{CompanyStore, DatabaseError};
use crate::forms::{LoginForm, RefreshForm, SignupForm, ValidateForm};

const INVALID_CREDENTIALS: &str = "email or password is incorrect";

// Unknown or inactive emails are checked against a hash of this
const DECOY_PASSWORD: &str = "teklif-decoy-password";

/// Registration, login and session lifecycle for companies
pub struct CompanyService {
    companies: Arc<dyn CompanyStore>,
    hasher: Arc<dyn PasswordHasher>,
    auth: Arc<AuthResolver>,
    policy: CapabilityPolicy,
    decoy_hash: OnceCell<String>,
}

impl CompanyService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        hasher: Arc<dyn PasswordHasher>,
        auth: Arc<AuthResolver>,
        policy: CapabilityPolicy,
    ) -> Self {
        Self {
            companies,
            hasher,
            auth,
            policy,
            decoy_hash: OnceCell::new(),
        }
    }

    pub async fn register(&self, form: SignupForm) -> ServiceResult<Company> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::FORM_VALIDATION, fields))?;
        if !self.policy.permits(form.is_supplier, form.is_constructor) {
            let message = match self.policy {
                CapabilityPolicy::AtLeastOne => "company must be a supplier, a constructor or both",
                CapabilityPolicy::ExactlyOne => "company must be either a supplier or a constructor",
            };
            return Err(ServiceError::invalid(codes::FORM_VALIDATION, "is_supplier", message));
        }

        let email = form.email.trim().to_lowercase();
        let existing = self
            .companies
            .find_company_by_email(&email)
            .await
            .map_err(|e| ServiceError::database(codes::COMPANY_NOT_SAVED, "company lookup failed", e))?;
        if existing.is_some() {
            return Err(ServiceError::conflict(codes::EMAIL_ALREADY_EXISTS, "email already exists"));
        }

        let password_hash = self.hash_password(form.password).await?;
        let company = self
            .companies
            .insert_company(NewCompany {
                name: form.name,
                company_type: form.company_type,
                web_site: form.web_site.filter(|w| !w.is_empty()),
                email,
                authorized_name: form.authorized_name,
                authorized_surname: form.authorized_surname,
                is_supplier: form.is_supplier,
                is_constructor: form.is_constructor,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => {
                    ServiceError::conflict(codes::EMAIL_ALREADY_EXISTS, "email already exists")
                }
                other => ServiceError::database(codes::COMPANY_NOT_SAVED, "company can not saved", other),
            })?;

        info!(company_id = %company.id, "Registered company");
        Ok(company)
    }

    /// Authenticate by email and password and open a session.
    ///
    /// Unknown email, wrong password and an unreadable stored hash all yield the same error.
    pub async fn login(&self, form: LoginForm) -> ServiceResult<TokenPair> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::FORM_VALIDATION, fields))?;

        let email = form.email.trim().to_lowercase();
        let company = self
            .companies
            .find_company_by_email(&email)
            .await
            .map_err(|e| ServiceError::database(codes::CREDENTIALS_INCORRECT, "company lookup failed", e))?
            .filter(|c| c.is_active);

        let Some(company) = company else {
            let decoy = self.decoy_hash().await?;
            self.verify_password(form.password, decoy).await?;
            return Err(invalid_credentials());
        };

        match self
            .verify_password(form.password, company.password_hash.clone())
            .await?
        {
            Ok(true) => {}
            Ok(false) => return Err(invalid_credentials()),
            Err(e) => {
                warn!(company_id = %company.id, error = %e, "Stored password hash is unusable");
                return Err(invalid_credentials());
            }
        }

        let pair = self.auth.open_session(&profile_of(&company)).await?;
        info!(company_id = %company.id, "Company logged in");
        Ok(pair)
    }

    pub async fn logout(&self, details: &AccessDetails) -> ServiceResult<()> {
        self.auth.logout(details).await?;
        Ok(())
    }

    pub async fn refresh(&self, form: RefreshForm) -> ServiceResult<TokenPair> {
        form.validate_fields()
            .map_err(|fields| ServiceError::validation(codes::FORM_VALIDATION, fields))?;
        Ok(self.auth.refresh(&form.refresh_token).await?)
    }

    async fn verify_password(
        &self,
        password: String,
        hash: String,
    ) -> ServiceResult<Result<bool, PasswordError>> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ServiceError::store(codes::CREDENTIALS_INCORRECT, "password check failed", e))
    }

    async fn decoy_hash(&self) -> ServiceResult<String> {
        self.decoy_hash
            .get_or_try_init(|| async {
                let hasher = self.hasher.clone();
                tokio::task::spawn_blocking(move || hasher.hash(DECOY_PASSWORD))
                    .await
                    .map_err(|e| ServiceError::store(codes::CREDENTIALS_INCORRECT, "password check failed", e))?
                    .map_err(|e| ServiceError::store(codes::CREDENTIALS_INCORRECT, "password check failed", e))
            })
            .await
            .cloned()
    }

    async fn hash_password(&self, password: String) -> ServiceResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ServiceError::store(codes::COMPANY_NOT_SAVED, "password hashing failed", e))?
            .map_err(|e| ServiceError::store(codes::COMPANY_NOT_SAVED, "password hashing failed", e))
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::authentication(codes::CREDENTIALS_INCORRECT, INVALID_CREDENTIALS)
}

fn profile_of(company: &Company) -> TokenProfile {
    TokenProfile {
        company_id: company.id,
        authorized_name: company.authorized_name.clone(),
        authorized_surname: company.authorized_surname.clone(),
        email: company.email.clone(),
        is_supplier: company.is_supplier,
        is_constructor: company.is_constructor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Argon2Hasher, JwtCodec, MemorySessionStore};
    use crate::config::AppConfig;
    use crate::database::MemoryCatalog;
    use crate::services::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHasher {
        inner: Argon2Hasher,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
            self.inner.hash(plaintext)
        }

        fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(plaintext, hash)
        }
    }

    fn service(policy: CapabilityPolicy) -> CompanyService {
        let config = AppConfig::in_memory();
        service_with(policy, Arc::new(Argon2Hasher::new(&config.password).unwrap()))
    }

    fn service_with(policy: CapabilityPolicy, hasher: Arc<dyn PasswordHasher>) -> CompanyService {
        let auth = AuthResolver::new(
            Arc::new(JwtCodec::new("access", "refresh")),
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(900),
            Duration::from_secs(3600),
        );
        CompanyService::new(
            Arc::new(MemoryCatalog::new()),
            hasher,
            Arc::new(auth),
            policy,
        )
    }

    fn signup(email: &str, is_supplier: bool, is_constructor: bool) -> SignupForm {
        SignupForm {
            name: "Yapı Market".to_string(),
            company_type: "Anonim Şirketi".to_string(),
            web_site: None,
            email: email.to_string(),
            authorized_name: "Zeynep".to_string(),
            authorized_surname: "Aydın".to_string(),
            is_supplier,
            is_constructor,
            password: "s3cret-pass".to_string(),
            password_again: "s3cret-pass".to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_lowercase_email_and_only_a_hash() {
        let service = service(CapabilityPolicy::AtLeastOne);
        let company = service
            .register(signup("Zeynep@Example.COM", true, false))
            .await
            .unwrap();

        assert_eq!(company.email, "zeynep@example.com");
        assert!(company.password_hash.starts_with("$argon2id$"));
        assert!(!company.password_hash.contains("s3cret-pass"));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let service = service(CapabilityPolicy::AtLeastOne);
        service.register(signup("a@example.com", true, false)).await.unwrap();

        let err = service
            .register(signup("A@example.com", false, true))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Conflict(_)));
        assert_eq!(err.code, codes::EMAIL_ALREADY_EXISTS);
    }

    #[tokio::test]
    async fn at_least_one_policy_accepts_both_flags() {
        let service = service(CapabilityPolicy::AtLeastOne);
        assert!(service.register(signup("both@example.com", true, true)).await.is_ok());

        let err = service
            .register(signup("none@example.com", false, false))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation { .. }));
    }

    #[tokio::test]
    async fn exactly_one_policy_rejects_both_flags() {
        let service = service(CapabilityPolicy::ExactlyOne);
        let err = service
            .register(signup("both@example.com", true, true))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Validation { ref fields, .. } if fields.contains_key("is_supplier")));
        assert!(service.register(signup("one@example.com", false, true)).await.is_ok());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let service = service(CapabilityPolicy::AtLeastOne);
        service.register(signup("login@example.com", true, false)).await.unwrap();

        let wrong_password = service
            .login(LoginForm {
                email: "login@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_email = service
            .login(LoginForm {
                email: "ghost@example.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.code, unknown_email.code);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password.kind, ErrorKind::Authentication(_)));
    }

    #[tokio::test]
    async fn login_then_refresh_then_logout() {
        let service = service(CapabilityPolicy::AtLeastOne);
        service.register(signup("flow@example.com", true, false)).await.unwrap();

        let pair = service
            .login(LoginForm {
                email: "FLOW@example.com".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();

        let rotated = service
            .refresh(RefreshForm {
                refresh_token: pair.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_ne!(rotated.access_uuid, pair.access_uuid);

        let claims = service.auth.verify_access(&rotated.access_token).unwrap();
        let details = service.auth.resolve_owner(&claims);
        service.logout(&details).await.unwrap();
        assert!(service.auth.fetch_auth(&details).await.is_err());
    }

    #[tokio::test]
    async fn unknown_email_still_runs_a_password_check() {
        let config = AppConfig::in_memory();
        let hasher = Arc::new(CountingHasher {
            inner: Argon2Hasher::new(&config.password).unwrap(),
            verifies: AtomicUsize::new(0),
        });
        let service = service_with(CapabilityPolicy::AtLeastOne, hasher.clone());

        for _ in 0..2 {
            let err = service
                .login(LoginForm {
                    email: "ghost@example.com".to_string(),
                    password: "teklif-decoy-password".to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Authentication(_)));
        }
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
    }
}
