use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::reviews::{ReviewCreate, ReviewList, ReviewUpdate},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_active, ensure_owner_or_admin},
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

fn validate_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

pub async fn list_reviews(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();

    let items: Vec<Review> =
        sqlx::query_as("SELECT * FROM reviews ORDER BY id LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.pool)
            .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM reviews")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

pub async fn get_review(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Review>> {
    let review: Option<Review> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let review = review.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Review", review, None))
}

pub async fn list_by_product(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let items: Vec<Review> = sqlx::query_as("SELECT * FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::success("Reviews", ReviewList { items }, None))
}

pub async fn list_by_user(
    state: &AppState,
    user: &CurrentUser,
    target_user_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_owner_or_admin(user, target_user_id)?;

    let user_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(target_user_id)
        .fetch_optional(&state.pool)
        .await?;
    if user_exists.is_none() {
        return Err(AppError::NotFound);
    }

    let items: Vec<Review> = sqlx::query_as("SELECT * FROM reviews WHERE user_id = $1")
        .bind(target_user_id)
        .fetch_all(&state.pool)
        .await?;

    Ok(ApiResponse::success("Reviews", ReviewList { items }, None))
}

/// At most one review per (user, product); a second attempt is rejected.
pub async fn create_review(
    state: &AppState,
    user: &CurrentUser,
    payload: ReviewCreate,
) -> AppResult<ApiResponse<Review>> {
    ensure_active(user)?;
    validate_rating(payload.rating)?;

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::NotFound);
    }

    // The unique (user, product) constraint is the arbiter; a concurrent
    // duplicate surfaces as the same validation error, not a 500.
    let review: Review = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, user_id, product_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(payload.product_id)
    .bind(payload.rating)
    .bind(payload.comment.as_str())
    .fetch_one(&state.pool)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation("you have already reviewed this product".into())
        }
        _ => AppError::from(err),
    })?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::ReviewCreate,
        Some(serde_json::json!({ "review_id": review.id, "product_id": review.product_id })),
    )
    .await;

    Ok(ApiResponse::success("Review created", review, Some(Meta::empty())))
}

pub async fn update_review(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    payload: ReviewUpdate,
) -> AppResult<ApiResponse<Review>> {
    if payload.is_empty() {
        return Err(AppError::Validation("no fields to update".into()));
    }
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let existing: Option<Review> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound)?;

    ensure_owner_or_admin(user, existing.user_id)?;

    let rating = payload.rating.unwrap_or(existing.rating);
    let comment = payload.comment.unwrap_or(existing.comment);

    let review: Review = sqlx::query_as(
        "UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(rating)
    .bind(comment)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Updated", review, Some(Meta::empty())))
}

pub async fn delete_review(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing: Option<Review> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound)?;

    ensure_owner_or_admin(user, existing.user_id)?;

    sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
