// handlers/constructor/mod.rs - constructor surface (requires an `is_constructor` token)

pub mod construction;

use axum::{middleware, routing::get, routing::post, Router};

use super::features;
use crate::context::AppContext;
use crate::middleware::constructor_auth;

pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .route("/constructor/construction", post(construction::create))
        .route(
            "/constructor/construction/:id",
            get(construction::show)
                .put(construction::update)
                .delete(construction::delete),
        )
        .route(
            "/constructor/constructions/:category_id",
            get(construction::list_by_category),
        )
        .route("/constructor/feature/:category_id", get(features::construction_features))
        .route_layer(middleware::from_fn_with_state(ctx, constructor_auth))
}
