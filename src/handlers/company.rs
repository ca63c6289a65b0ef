// handlers/company.rs - /api/v1/auth/* handlers
//
// Signup, login and token refresh are public; logout runs behind `session_auth`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::auth::{AuthCompany, TokenPair};
use crate::context::AppContext;
use crate::database::models::Company;
use crate::forms::{LoginForm, RefreshForm, SignupForm};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::codes;

/// POST /api/v1/auth/signup
pub async fn signup(
    State(ctx): State<AppContext>,
    payload: Result<Json<SignupForm>, JsonRejection>,
) -> ApiResult<Company> {
    let Json(form) = payload?;
    let company = ctx.companies.register(form).await?;
    Ok(ApiResponse::created(company, "company created", codes::COMPANY_CREATED))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(ctx): State<AppContext>,
    payload: Result<Json<LoginForm>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(form) = payload?;
    let pair = ctx.companies.login(form).await?;
    Ok(ApiResponse::success(pair, "logged in", codes::LOGGED_IN))
}

/// DELETE /api/v1/auth/logout
pub async fn logout(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
) -> ApiResult<()> {
    ctx.companies.logout(&auth.details).await?;
    Ok(ApiResponse::empty("logged out", codes::LOGGED_OUT))
}

/// POST /api/v1/auth/token/refresh
pub async fn refresh(
    State(ctx): State<AppContext>,
    payload: Result<Json<RefreshForm>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let Json(form) = payload?;
    let pair = ctx.companies.refresh(form).await?;
    Ok(ApiResponse::success(pair, "token refreshed", codes::TOKEN_REFRESHED))
}
