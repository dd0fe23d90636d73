pub mod api;
pub mod codes;
pub mod core;
pub mod models;
pub mod money;
pub mod repos;
pub mod routes;
pub mod schema;
pub mod workflows;

use axum::Router;
use utoipa::openapi::InfoBuilder;

use crate::core::{app_state::AppState, middleware::admin_authorization, swagger};

/// The whole HTTP surface. Everything except `/health` and the API docs
/// sits behind the admin session gate.
pub fn app(state: AppState) -> Router {
    let (api, mut openapi) = routes::clients::routes_with_openapi()
        .merge(routes::employees::routes_with_openapi())
        .merge(routes::catalog::routes_with_openapi())
        .merge(routes::orders::routes_with_openapi())
        .merge(routes::reservations::routes_with_openapi())
        .merge(routes::storage::routes_with_openapi())
        .split_for_parts();

    openapi.info = InfoBuilder::new()
        .title("ShoeCare OrderService API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = swagger::create_swagger_ui(swagger::with_bearer_auth(openapi));

    let api = api.route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        admin_authorization,
    ));

    Router::new()
        .merge(api)
        .merge(routes::health::routes())
        .merge(swagger_ui)
        .with_state(state)
}
