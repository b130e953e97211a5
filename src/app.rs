use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{admin, dividends, drip, etfs, health, imports, prices, rankings};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/etfs", etfs::router())
        .nest("/api/prices", prices::router())
        .nest("/api/dividends", dividends::router())
        .nest("/api/drip", drip::router())
        .nest("/api/rankings", rankings::router())
        .nest("/api/imports", imports::router())
        .nest("/api/admin", admin::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
