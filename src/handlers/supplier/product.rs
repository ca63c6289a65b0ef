// handlers/supplier/product.rs - /api/v1/supplier/product[/:id] and /products/:category_id

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use crate::auth::AuthCompany;
use crate::context::AppContext;
use crate::database::models::Product;
use crate::forms::{CreateProductForm, UpdateProductForm};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::codes;
use crate::types::{CategoryId, ProductId};

pub async fn create(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    payload: Result<Json<CreateProductForm>, JsonRejection>,
) -> ApiResult<Product> {
    let Json(form) = payload?;
    let product = ctx.products.create(form, auth.company_id).await?;
    Ok(ApiResponse::created(product, "product created", codes::PRODUCT_CREATED))
}

pub async fn update(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<UpdateProductForm>, JsonRejection>,
) -> ApiResult<Product> {
    let Path(id) = id?;
    let Json(form) = payload?;
    let product = ctx.products.update(form, id, auth.company_id).await?;
    Ok(ApiResponse::success(product, "product updated", codes::PRODUCT_UPDATED))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    Extension(auth): Extension<AuthCompany>,
    id: Result<Path<ProductId>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    ctx.products.delete(id, auth.company_id).await?;
    Ok(ApiResponse::empty("product deleted", codes::PRODUCT_DELETED))
}

pub async fn show(
    State(ctx): State<AppContext>,
    id: Result<Path<ProductId>, PathRejection>,
) -> ApiResult<Product> {
    let Path(id) = id?;
    let product = ctx.products.find_by_id(id).await?;
    Ok(ApiResponse::success(product, "product found", codes::PRODUCT_FOUND))
}

pub async fn list_by_category(
    State(ctx): State<AppContext>,
    category: Result<Path<CategoryId>, PathRejection>,
) -> ApiResult<Vec<Product>> {
    let Path(category) = category?;
    let products = ctx.products.find_all_by_category(category).await?;
    Ok(ApiResponse::success(products, "products found", codes::PRODUCT_FOUND))
}
