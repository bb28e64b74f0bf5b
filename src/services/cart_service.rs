use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::cart::{AddToCartRequest, CartItemWithProduct, CartList, CartQuantityUpdate},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_active},
    models::{CartItem, Product, UnitType},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    country_id: Uuid,
    category_id: Uuid,
    price_per_unit: f64,
    unit_type: UnitType,
    expiration_date: chrono::NaiveDate,
    created_at: DateTime<Utc>,
}

pub async fn list_cart(
    state: &AppState,
    user: &CurrentUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    ensure_active(user)?;
    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.name, p.country_id, p.category_id,
               p.price_per_unit, p.unit_type, p.expiration_date, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&state.pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartItemWithProduct {
            id: row.cart_id,
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                name: row.name,
                country_id: row.country_id,
                category_id: row.category_id,
                price_per_unit: row.price_per_unit,
                unit_type: row.unit_type,
                expiration_date: row.expiration_date,
                created_at: row.created_at,
            },
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Cart", CartList { items }, Some(meta)))
}

/// Upsert per (user, product): an existing item has the quantity added to
/// it, a new one is created. Quantity below the floor of 1 is rejected.
pub async fn add_to_cart(
    state: &AppState,
    user: &CurrentUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_active(user)?;

    if payload.quantity < 1 {
        return Err(AppError::Validation("quantity must be at least 1".into()));
    }

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    // Single upsert on the (user, product) key; a concurrent add for the
    // same product increments instead of tripping the unique constraint.
    let cart_item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::CartUpdate,
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await;

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &CurrentUser,
    product_id: Uuid,
    payload: CartQuantityUpdate,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_active(user)?;

    if payload.quantity < 1 {
        return Err(AppError::Validation("quantity must be at least 1".into()));
    }

    let item: Option<CartItem> = sqlx::query_as(
        "UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2 RETURNING *",
    )
    .bind(user.id)
    .bind(product_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?;

    let item = item.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Updated", item, Some(Meta::empty())))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &CurrentUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_active(user)?;

    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::CartRemove,
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &CurrentUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_active(user)?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
