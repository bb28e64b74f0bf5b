use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod categories;
pub mod countries;
pub mod doc;
pub mod health;
pub mod order_details;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/countries", countries::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/order-details", order_details::router())
        .nest("/cart", cart::router())
        .nest("/reviews", reviews::router())
}
