// handlers/constructor/construction.rs - /api/v1/constructor/construction[/:id]

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use crate::auth::AuthCompany;
use crate::context::AppContext;
use crate::database::models::Construction;
use crate::forms::{CreateConstructionForm, UpdateConstructionForm};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::codes;
use crate::types::{CategoryId, ConstructionId};

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    payload: Result<Json<CreateConstructionForm>, JsonRejection>,
) -> ApiResult<Construction> {
    let Json(form) = payload?;
    let construction = ctx.constructions.create(form, auth.company_id).await?;
    Ok(ApiResponse::created(
        construction,
        "construction created",
        codes::CONSTRUCTION_CREATED,
    ))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<ConstructionId>, PathRejection>,
    payload: Result<Json<UpdateConstructionForm>, JsonRejection>,
) -> ApiResult<Construction> {
    let Path(id) = id?;
    let Json(form) = payload?;
    let construction = ctx.constructions.update(form, id, auth.company_id).await?;
    Ok(ApiResponse::success(
        construction,
        "construction updated",
        codes::CONSTRUCTION_UPDATED,
    ))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<ConstructionId>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    ctx.constructions.delete(id, auth.company_id).await?;
    Ok(ApiResponse::empty("construction deleted", codes::CONSTRUCTION_DELETED))
}

/// Only the owning company can read a construction back by id
pub async fn show(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<ConstructionId>, PathRejection>,
) -> ApiResult<Construction> {
    let Path(id) = id?;
    let construction = ctx.constructions.find_by_id(id, auth.company_id).await?;
    Ok(ApiResponse::success(
        construction,
        "construction found",
        codes::CONSTRUCTION_FOUND,
    ))
}

pub async fn list_by_category(
    State(ctx): State<AppContext>,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<Construction>> {
    let Path(category) = category?;
    let constructions = ctx.constructions.find_all_by_category(category).await?;
    Ok(ApiResponse::success(
        constructions,
        "constructions found",
        codes::CONSTRUCTION_FOUND,
    ))
}
