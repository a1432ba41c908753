use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod auth;
pub mod banners;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod uploads;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/orders", orders::route())
        .nest("/banners", banners::router())
        .nest("/products", products::router())
        .nest("/addresses", addresses::router())
}
