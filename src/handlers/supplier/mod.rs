// handlers/supplier/mod.rs - supplier surface (requires an `is_supplier` token)

pub mod product;
pub mod variant;

use axum::{middleware, routing::get, routing::post, Router};

use super::features;
use crate::context::AppContext;
use crate::middleware::supplier_auth;

pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .route("/supplier/product", post(product::create))
        .route(
            "/supplier/product/:id",
            get(product::show).put(product::update).delete(product::delete),
        )
        .route("/supplier/products/:category_id", get(product::list_by_category))
        .route("/supplier/variant", post(variant::create))
        .route(
            "/supplier/variant/:id",
            get(variant::show).put(variant::update).delete(variant::delete),
        )
        .route("/supplier/variants/:category_id", get(variant::list_by_category))
        .route("/supplier/feature/:category_id", get(features::product_features))
        .route_layer(middleware::from_fn_with_state(ctx, supplier_auth))
}
