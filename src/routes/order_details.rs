use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::orders::{AddOrderDetailRequest, OrderDetailList, OrderDetailUpdate},
    error::AppResult,
    middleware::auth::CurrentUser,
    models::OrderDetail,
    response::ApiResponse,
    routes::params::Pagination,
    services::order_detail_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_all_order_details))
        .route("/", post(add_order_detail))
        .route("/{id}", get(get_order_detail))
        .route("/{id}", put(update_order_detail))
        .route("/{id}", delete(delete_order_detail))
}

#[utoipa::path(
    get,
    path = "/api/order-details/all",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List all order details", body = ApiResponse<OrderDetailList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn list_all_order_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<OrderDetailList>>> {
    let resp = order_detail_service::list_all_details(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/order-details/{id}",
    params(("id" = Uuid, Path, description = "Order detail ID")),
    responses(
        (status = 200, description = "Get order detail", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order detail not found")
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn get_order_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::get_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/order-details",
    request_body = AddOrderDetailRequest,
    responses(
        (status = 201, description = "Add line item to an order", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Unit type mismatch"),
        (status = 404, description = "Order or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn add_order_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddOrderDetailRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::add_detail(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/order-details/{id}",
    params(("id" = Uuid, Path, description = "Order detail ID")),
    request_body = OrderDetailUpdate,
    responses(
        (status = 200, description = "Updated line item", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order detail not found")
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn update_order_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderDetailUpdate>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let resp = order_detail_service::update_detail(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/order-details/{id}",
    params(("id" = Uuid, Path, description = "Order detail ID")),
    responses(
        (status = 200, description = "Deleted line item"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Order detail not found")
    ),
    security(("bearer_auth" = [])),
    tag = "OrderDetails"
)]
pub async fn delete_order_detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = order_detail_service::delete_detail(&state, &user, id).await?;
    Ok(Json(resp))
}
