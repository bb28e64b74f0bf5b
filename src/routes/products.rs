use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/{id}", get(get_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Name substring filter"),
        ("sort_by" = Option<ProductSortBy>, Query, description = "Sort column"),
        ("sort_order" = Option<SortOrder>, Query, description = "Sort direction")
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let (page, limit, offset) = query.normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::Name);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Asc);

    let sql = format!(
        "SELECT * FROM products \
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%') \
         ORDER BY {} {} LIMIT $2 OFFSET $3",
        sort_by.as_sql(),
        sort_order.as_sql()
    );
    let items: Vec<Product> = sqlx::query_as(&sql)
        .bind(query.q.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM products WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
    )
    .bind(query.q.as_deref())
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let product = product.ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_admin(&user)?;

    if payload.price_per_unit < 0.0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }

    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (id, name, country_id, category_id, price_per_unit, unit_type, expiration_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.country_id)
    .bind(payload.category_id)
    .bind(payload.price_per_unit)
    .bind(payload.unit_type)
    .bind(payload.expiration_date)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_admin(&user)?;

    let existing: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound)?;

    let name = payload.name.unwrap_or(existing.name);
    let country_id = payload.country_id.unwrap_or(existing.country_id);
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    // Price changes never touch snapshot prices on historical order details.
    let price_per_unit = payload.price_per_unit.unwrap_or(existing.price_per_unit);
    let unit_type = payload.unit_type.unwrap_or(existing.unit_type);
    let expiration_date = payload.expiration_date.unwrap_or(existing.expiration_date);

    if price_per_unit < 0.0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }

    let product: Product = sqlx::query_as(
        r#"
        UPDATE products
        SET name = $2, country_id = $3, category_id = $4,
            price_per_unit = $5, unit_type = $6, expiration_date = $7
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(country_id)
    .bind(category_id)
    .bind(price_per_unit)
    .bind(unit_type)
    .bind(expiration_date)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
