use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod customers;
pub mod doc;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/inventory", inventory::router())
        .nest("/orders", orders::router())
        .nest("/admin", admin::router())
}
