use uuid::Uuid;

use crate::{
    dto::orders::{AddOrderDetailRequest, OrderDetailList, OrderDetailUpdate},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_admin, ensure_owner_or_admin},
    models::{OrderDetail, Product},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::order_service::{lock_order, subtotal, total_delta},
    state::AppState,
};

pub async fn list_all_details(
    state: &AppState,
    user: &CurrentUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderDetailList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let items: Vec<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details ORDER BY order_id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.pool)
            .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM order_details")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Order details",
        OrderDetailList { items },
        Some(meta),
    ))
}

pub async fn get_detail(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let detail: Option<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    let detail = detail.ok_or(AppError::NotFound)?;

    let owner: (Uuid,) = sqlx::query_as("SELECT user_id FROM orders WHERE id = $1")
        .bind(detail.order_id)
        .fetch_one(&state.pool)
        .await?;
    ensure_owner_or_admin(user, owner.0)?;

    Ok(ApiResponse::success("Order detail", detail, None))
}

/// Adds a line item to an existing order and bumps the order total by the
/// new subtotal. The order row is locked first so concurrent line-item
/// mutations on the same order serialize.
pub async fn add_detail(
    state: &AppState,
    user: &CurrentUser,
    payload: AddOrderDetailRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let mut tx = state.pool.begin().await?;

    let order = lock_order(&mut tx, payload.order_id).await?;
    ensure_owner_or_admin(user, order.user_id)?;

    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&mut *tx)
        .await?;
    let product = product.ok_or(AppError::NotFound)?;

    if payload.quantity <= 0.0 {
        return Err(AppError::Validation(format!(
            "quantity must be positive for product {}",
            product.name
        )));
    }
    if payload.unit_type != product.unit_type {
        return Err(AppError::Validation(format!(
            "wrong unit type for product {}",
            product.name
        )));
    }

    let detail: OrderDetail = sqlx::query_as(
        r#"
        INSERT INTO order_details (id, order_id, product_id, quantity, unit_type, price)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order.id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .bind(product.unit_type)
    .bind(product.price_per_unit)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE orders SET total_amount = total_amount + $2 WHERE id = $1")
        .bind(order.id)
        .bind(subtotal(detail.quantity, detail.price))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Order detail added",
        detail,
        Some(Meta::empty()),
    ))
}

/// Quantity change applies `new_subtotal - old_subtotal` to the order
/// total using the frozen snapshot price; the product is never consulted.
pub async fn update_detail(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    payload: OrderDetailUpdate,
) -> AppResult<ApiResponse<OrderDetail>> {
    if payload.quantity <= 0.0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }

    let mut tx = state.pool.begin().await?;

    let detail: Option<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let detail = detail.ok_or(AppError::NotFound)?;

    let order = lock_order(&mut tx, detail.order_id).await?;
    ensure_owner_or_admin(user, order.user_id)?;

    // Re-read under the order lock; the pre-lock copy may be stale.
    let detail: Option<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let detail = detail.ok_or(AppError::NotFound)?;

    let delta = total_delta(detail.quantity, payload.quantity, detail.price);

    let updated: OrderDetail = sqlx::query_as(
        "UPDATE order_details SET quantity = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(payload.quantity)
    .fetch_one(&mut *tx)
    .await?;

    if delta != 0.0 {
        sqlx::query("UPDATE orders SET total_amount = total_amount + $2 WHERE id = $1")
            .bind(order.id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Order detail updated",
        updated,
        Some(Meta::empty()),
    ))
}

pub async fn delete_detail(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let mut tx = state.pool.begin().await?;

    let detail: Option<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let detail = detail.ok_or(AppError::NotFound)?;

    let order = lock_order(&mut tx, detail.order_id).await?;
    ensure_owner_or_admin(user, order.user_id)?;

    let detail: Option<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let detail = detail.ok_or(AppError::NotFound)?;

    sqlx::query("DELETE FROM order_details WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE orders SET total_amount = total_amount - $2 WHERE id = $1")
        .bind(order.id)
        .bind(subtotal(detail.quantity, detail.price))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(ApiResponse::success(
        "Order detail deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
