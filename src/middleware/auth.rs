use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::auth::AuthCompany;
use crate::context::AppContext;
use crate::error::ApiError;
use crate::services::codes;

/// Capability a route group requires from the caller's token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Any,
    Supplier,
    Constructor,
}

/// Bearer auth for routes any logged-in company may call
pub async fn session_auth(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&ctx, Capability::Any, request, next).await
}

/// Bearer auth for the supplier surface
pub async fn supplier_auth(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&ctx, Capability::Supplier, request, next).await
}

/// Bearer auth for the constructor surface
pub async fn constructor_auth(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authenticate(&ctx, Capability::Constructor, request, next).await
}

/// Verify the token, check the capability, then confirm the session is live and
/// bound to the claimed company. The resolved [`AuthCompany`] is injected into
/// request extensions.
async fn authenticate(
    ctx: &AppContext,
    capability: Capability,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(ApiError::unauthorized)?;
    let claims = ctx.auth.verify_access(token)?;

    let denied = match capability {
        Capability::Any => None,
        Capability::Supplier => (!claims.profile.is_supplier).then_some("company is not a supplier"),
        Capability::Constructor => {
            (!claims.profile.is_constructor).then_some("company is not a constructor")
        }
    };
    if let Some(message) = denied {
        return Err(ApiError::Unauthorized {
            message: message.to_string(),
            code: codes::UNAUTHORIZED,
        });
    }

    let details = ctx.auth.resolve_owner(&claims);
    let company_id = ctx.auth.fetch_auth(&details).await?;
    debug!(company_id = %company_id, "Authenticated request");

    request.extensions_mut().insert(AuthCompany {
        company_id,
        details,
        profile: claims.profile,
    });
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`; the scheme is case-insensitive
fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or("Authorization header must use Bearer token format")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty bearer token");
    }
    Ok(token)
}
