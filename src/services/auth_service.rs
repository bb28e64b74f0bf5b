use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::auth::{LoginRequest, RegisterRequest, TokenResponse},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
    security,
    state::AppState,
};

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let username_taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = $1")
            .bind(payload.username.as_str())
            .fetch_optional(&state.pool)
            .await?;
    if username_taken.is_some() {
        return Err(AppError::Validation("username is already taken".into()));
    }

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Validation("email is already taken".into()));
    }

    let password_hash = security::hash_password(&payload.password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, full_name, address, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.username.as_str())
    .bind(payload.email.as_str())
    .bind(password_hash)
    .bind(payload.full_name.as_deref())
    .bind(payload.address.as_deref())
    .bind(payload.phone.as_deref())
    .fetch_one(&state.pool)
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserRegister,
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success("User created", user, None))
}

/// Same error for unknown username and wrong password, so the response
/// never leaks which usernames exist.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(payload.username.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let user = user.ok_or(AppError::InvalidCredentials)?;

    if !security::verify_password(&payload.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = security::issue_token(&state.auth, &user.username, user.id, user.role)?;

    audit::record(
        &state.pool,
        Some(user.id),
        AuditAction::UserLogin,
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        TokenResponse::bearer(token),
        Some(Meta::empty()),
    ))
}

/// Admin promotion lives here with the other credential-shaped mutations.
/// Gated inside the service so the check travels with the operation.
pub async fn make_admin(state: &AppState, actor: &CurrentUser, target_id: Uuid) -> AppResult<User> {
    ensure_admin(actor)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(target_id)
        .fetch_optional(&state.pool)
        .await?;
    let user = user.ok_or(AppError::NotFound)?;

    if user.role == Role::Admin {
        return Err(AppError::Validation("user is already an admin".into()));
    }

    let user: User =
        sqlx::query_as("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(target_id)
            .bind(Role::Admin)
            .fetch_one(&state.pool)
            .await?;

    Ok(user)
}
