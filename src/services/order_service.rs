use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::orders::{OrderCreate, OrderList, OrderStatusUpdate, OrderWithDetails},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_active, ensure_admin, ensure_owner_or_admin},
    models::{Order, OrderDetail, OrderStatus, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &CurrentUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.normalize();
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let sql = format!(
        "SELECT * FROM orders WHERE ($1::order_status IS NULL OR status = $1) \
         ORDER BY order_date {} LIMIT $2 OFFSET $3",
        sort_order.as_sql()
    );
    let items: Vec<Order> = sqlx::query_as(&sql)
        .bind(query.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
    )
    .bind(query.status)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = order.ok_or(AppError::NotFound)?;

    ensure_owner_or_admin(user, order.user_id)?;

    let details = fetch_details(&state.pool, order.id).await?;

    Ok(ApiResponse::success(
        "Order",
        OrderWithDetails { order, details },
        Some(Meta::empty()),
    ))
}

pub async fn get_order_details(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<Vec<OrderDetail>>> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = order.ok_or(AppError::NotFound)?;

    ensure_owner_or_admin(user, order.user_id)?;

    let details = fetch_details(&state.pool, order.id).await?;
    Ok(ApiResponse::success("Order details", details, None))
}

/// Creates the order, its priced line items and the total in one
/// transaction. Prices are snapshotted from the product at this moment;
/// the requested unit type must match the product's.
pub async fn create_order(
    state: &AppState,
    user: &CurrentUser,
    payload: OrderCreate,
) -> AppResult<ApiResponse<OrderWithDetails>> {
    ensure_active(user)?;

    if payload.details.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one line item".into(),
        ));
    }

    let mut tx = state.pool.begin().await?;

    let order: Order = sqlx::query_as(
        "INSERT INTO orders (id, user_id, total_amount, status) VALUES ($1, $2, 0, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(OrderStatus::Pending)
    .fetch_one(&mut *tx)
    .await?;

    let mut total_amount = 0.0_f64;
    let mut details: Vec<OrderDetail> = Vec::with_capacity(payload.details.len());

    for item in &payload.details {
        let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?;
        let product = product.ok_or_else(|| {
            AppError::Validation(format!("product {} not found", item.product_id))
        })?;

        if item.quantity <= 0.0 {
            return Err(AppError::Validation(format!(
                "quantity must be positive for product {}",
                product.name
            )));
        }
        if item.unit_type != product.unit_type {
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
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(product.unit_type)
        .bind(product.price_per_unit)
        .fetch_one(&mut *tx)
        .await?;

        total_amount += subtotal(item.quantity, product.price_per_unit);
        details.push(detail);
    }

    let order: Order =
        sqlx::query_as("UPDATE orders SET total_amount = $2 WHERE id = $1 RETURNING *")
            .bind(order.id)
            .bind(total_amount)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::OrderCreate,
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithDetails { order, details },
        Some(Meta::empty()),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    payload: OrderStatusUpdate,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let order: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(payload.status)
            .fetch_optional(&state.pool)
            .await?;
    let order = order.ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::OrderStatusUpdate,
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await;

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

pub async fn delete_order(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn fetch_details(pool: &crate::db::DbPool, order_id: Uuid) -> AppResult<Vec<OrderDetail>> {
    let details: Vec<OrderDetail> =
        sqlx::query_as("SELECT * FROM order_details WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(pool)
            .await?;
    Ok(details)
}

/// Locks the order row for the duration of a read-modify-write of its
/// total, serializing concurrent line-item mutations per order.
pub(crate) async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> AppResult<Order> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut **tx as &mut PgConnection)
        .await?;
    order.ok_or(AppError::NotFound)
}

pub(crate) fn subtotal(quantity: f64, price: f64) -> f64 {
    quantity * price
}

/// Delta applied to a running total when a line item's quantity changes.
/// Uses the frozen snapshot price, never a re-fetched one.
pub(crate) fn total_delta(old_quantity: f64, new_quantity: f64, price: f64) -> f64 {
    subtotal(new_quantity, price) - subtotal(old_quantity, price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_is_quantity_times_price() {
        assert_eq!(subtotal(2.0, 10.0), 20.0);
        assert_eq!(subtotal(1.0, 5.0), 5.0);
    }

    #[test]
    fn quantity_change_delta_uses_snapshot_price() {
        // 2 -> 3 at snapshot price 10.0 adds exactly one unit's worth.
        assert_eq!(total_delta(2.0, 3.0, 10.0), 10.0);
        assert_eq!(total_delta(2.0, 3.0, 5.0), 5.0);
        assert_eq!(total_delta(3.0, 2.0, 10.0), -10.0);
        assert_eq!(total_delta(2.0, 2.0, 10.0), 0.0);
    }
}
