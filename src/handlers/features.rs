// handlers/features.rs - feature definitions of a category, per scope

use axum::extract::{rejection::PathRejection, Path, State};

use crate::context::AppContext;
use crate::database::models::FeatureDefinition;
use crate::database::FeatureScope;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::codes;
use crate::types::CategoryId;

/// GET /api/v1/supplier/feature/:category_id
pub async fn product_features(
    State(ctx): State<AppContext>,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<FeatureDefinition>> {
    list(&ctx, FeatureScope::Product, category).await
}

/// GET /api/v1/constructor/feature/:category_id
pub async fn construction_features(
    State(ctx): State<AppContext>,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<FeatureDefinition>> {
    list(&ctx, FeatureScope::Construction, category).await
}

async fn list(
    ctx: &AppContext,
    scope: FeatureScope,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<FeatureDefinition>> {
    let Path(category) = category?;
    let definitions = ctx.features.definitions_for_category(scope, category).await?;
    Ok(ApiResponse::success(definitions, "features received", codes::FEATURES_RECEIVED))
}
