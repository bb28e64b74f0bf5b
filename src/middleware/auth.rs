use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Role, User},
    security,
    state::AppState,
};

/// The authenticated principal for a request: claims verified, then the
/// user row re-loaded from the store. A token for a since-deleted user
/// fails here with `InvalidCredentials` (tokens are not revocable before
/// expiry, so this lookup is the only stale-token backstop).
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::InvalidCredentials)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::InvalidCredentials)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::InvalidCredentials)?
            .trim();

        let claims = security::decode_token(&state.auth, token)?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(claims.user_id)
            .fetch_optional(&state.pool)
            .await?;
        let user = user.ok_or(AppError::InvalidCredentials)?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            role: user.role,
            is_active: user.is_active,
        })
    }
}

pub fn ensure_active(user: &CurrentUser) -> Result<(), AppError> {
    if !user.is_active {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_role(user: &CurrentUser, role: Role) -> Result<(), AppError> {
    ensure_active(user)?;
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &CurrentUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Ownership gate with unconditional admin bypass. The match is exhaustive
/// so adding a role forces a decision about its bypass rights.
pub fn ensure_owner_or_admin(user: &CurrentUser, owner_id: Uuid) -> Result<(), AppError> {
    ensure_active(user)?;
    match user.role {
        Role::Admin => Ok(()),
        Role::User => {
            if user.id == owner_id {
                Ok(())
            } else {
                Err(AppError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, is_active: bool) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "tester".into(),
            role,
            is_active,
        }
    }

    #[test]
    fn admin_bypasses_ownership() {
        let admin = principal(Role::Admin, true);
        let someone_else = Uuid::new_v4();
        assert!(ensure_owner_or_admin(&admin, someone_else).is_ok());
    }

    #[test]
    fn user_cannot_touch_another_users_resource() {
        let user = principal(Role::User, true);
        let someone_else = Uuid::new_v4();
        let err = ensure_owner_or_admin(&user, someone_else).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn owner_is_allowed() {
        let user = principal(Role::User, true);
        assert!(ensure_owner_or_admin(&user, user.id).is_ok());
    }

    #[test]
    fn inactive_principal_is_forbidden_everywhere() {
        let inactive_admin = principal(Role::Admin, false);
        assert!(matches!(
            ensure_active(&inactive_admin),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            ensure_admin(&inactive_admin),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            ensure_owner_or_admin(&inactive_admin, inactive_admin.id),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let user = principal(Role::User, true);
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }
}
