use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::users::{UserAdminUpdate, UserList, UserProfileUpdate},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_admin, ensure_owner_or_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    security,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &CurrentUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let items: Vec<User> =
        sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&state.pool)
            .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user(
    state: &AppState,
    user: &CurrentUser,
    target_id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(user, target_id)?;

    let target: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&state.pool)
        .await?;
    let target = target.ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("User", target, None))
}

pub async fn update_profile(
    state: &AppState,
    user: &CurrentUser,
    target_id: Uuid,
    payload: UserProfileUpdate,
) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(user, target_id)?;

    if payload.is_empty() {
        return Err(AppError::Validation("no fields to update".into()));
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound)?;

    if let Some(email) = payload.email.as_deref() {
        if email != existing.email {
            let taken: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = $1")
                    .bind(email)
                    .fetch_optional(&state.pool)
                    .await?;
            if taken.is_some() {
                return Err(AppError::Validation("email is already taken".into()));
            }
        }
    }

    let password_hash = match payload.password.as_deref() {
        Some(plain) if !plain.is_empty() => security::hash_password(plain)?,
        _ => existing.password_hash.clone(),
    };

    let email = payload.email.unwrap_or(existing.email);
    let full_name = payload.full_name.or(existing.full_name);
    let address = payload.address.or(existing.address);
    let phone = payload.phone.or(existing.phone);

    let updated: User = sqlx::query_as(
        r#"
        UPDATE users
        SET email = $2, full_name = $3, address = $4, phone = $5, password_hash = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(target_id)
    .bind(email)
    .bind(full_name)
    .bind(address)
    .bind(phone)
    .bind(password_hash)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Updated", updated, Some(Meta::empty())))
}

pub async fn admin_update(
    state: &AppState,
    user: &CurrentUser,
    target_id: Uuid,
    payload: UserAdminUpdate,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;

    if payload.is_empty() {
        return Err(AppError::Validation("no fields to update".into()));
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = existing.ok_or(AppError::NotFound)?;

    let role = payload.role.unwrap_or(existing.role);
    let is_active = payload.is_active.unwrap_or(existing.is_active);

    let updated: User = sqlx::query_as(
        "UPDATE users SET role = $2, is_active = $3 WHERE id = $1 RETURNING *",
    )
    .bind(target_id)
    .bind(role)
    .bind(is_active)
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserAdminUpdate,
        Some(serde_json::json!({ "target_id": target_id, "role": role, "is_active": is_active })),
    )
    .await;

    Ok(ApiResponse::success("Updated", updated, Some(Meta::empty())))
}

/// Deleting a user cascades to their orders, reviews and cart items.
pub async fn delete_user(
    state: &AppState,
    user: &CurrentUser,
    target_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    if user.id == target_id {
        return Err(AppError::Validation("an admin cannot delete themselves".into()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(target_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserDelete,
        Some(serde_json::json!({ "target_id": target_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
