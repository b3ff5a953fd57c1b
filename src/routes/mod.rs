use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod banners;
pub mod cart;
pub mod doc;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod wishlist;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", products::category_router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/addresses", addresses::router())
        .nest("/profile", profile::router())
        .nest("/wishlist", wishlist::router())
        .nest("/notifications", notifications::router())
        .nest("/reviews", reviews::router())
        .nest("/banners", banners::router())
        .nest("/admin", admin::router())
}
