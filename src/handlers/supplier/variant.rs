// handlers/supplier/variant.rs - /api/v1/supplier/variant[/:id] and /variants/:category_id

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use crate::auth::AuthCompany;
use crate::context::AppContext;
use crate::database::models::Variant;
use crate::forms::{CreateVariantForm, UpdateVariantForm};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::codes;
use crate::types::{CategoryId, VariantId};

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    payload: Result<Json<CreateVariantForm>, JsonRejection>,
) -> ApiResult<Variant> {
    let Json(form) = payload?;
    let variant = ctx.variants.create(form, auth.company_id).await?;
    Ok(ApiResponse::created(variant, "variant created", codes::VARIANT_CREATED))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<VariantId>, PathRejection>,
    payload: Result<Json<UpdateVariantForm>, JsonRejection>,
) -> ApiResult<Variant> {
    let Path(id) = id?;
    let Json(form) = payload?;
    let variant = ctx.variants.update(form, id, auth.company_id).await?;
    Ok(ApiResponse::success(variant, "variant updated", codes::VARIANT_UPDATED))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<VariantId>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    ctx.variants.delete(id, auth.company_id).await?;
    Ok(ApiResponse::empty("variant deleted", codes::VARIANT_DELETED))
}

pub async fn show(
    State(ctx): State<AppContext>,
    id: Result<Path<VariantId>, PathRejection>,
) -> ApiResult<Variant> {
    let Path(id) = id?;
    let variant = ctx.variants.find_by_id(id).await?;
    Ok(ApiResponse::success(variant, "variant found", codes::VARIANT_FOUND))
}

pub async fn list_by_category(
    State(ctx): State<AppContext>,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<Variant>> {
    let Path(category) = category?;
    let variants = ctx.variants.find_all_by_category(category).await?;
    Ok(ApiResponse::success(variants, "variants found", codes::VARIANT_FOUND))
}
