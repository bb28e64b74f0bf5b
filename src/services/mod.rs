pub mod auth_service;
pub mod cart_service;
pub mod order_detail_service;
pub mod order_service;
pub mod review_service;
pub mod user_service;
