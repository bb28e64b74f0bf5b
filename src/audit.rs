use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

/// Closed vocabulary of audited actions. Each action knows the resource
/// it touches, so call sites cannot mislabel an entry.
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserAdminUpdate,
    UserDelete,
    OrderCreate,
    OrderStatusUpdate,
    CartUpdate,
    CartRemove,
    ReviewCreate,
}

impl AuditAction {
    fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::UserAdminUpdate => "user_admin_update",
            AuditAction::UserDelete => "user_delete",
            AuditAction::OrderCreate => "order_create",
            AuditAction::OrderStatusUpdate => "order_status_update",
            AuditAction::CartUpdate => "cart_update",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::ReviewCreate => "review_create",
        }
    }

    fn resource(&self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::UserAdminUpdate
            | AuditAction::UserDelete => "users",
            AuditAction::OrderCreate | AuditAction::OrderStatusUpdate => "orders",
            AuditAction::CartUpdate | AuditAction::CartRemove => "cart_items",
            AuditAction::ReviewCreate => "reviews",
        }
    }
}

/// Best-effort audit trail write. A failed insert is logged and swallowed;
/// auditing never fails the operation it describes.
pub async fn record(pool: &DbPool, user_id: Option<Uuid>, action: AuditAction, metadata: Option<Value>) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await;

    if let Err(err) = result {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_map_to_their_resource_table() {
        assert_eq!(AuditAction::OrderCreate.resource(), "orders");
        assert_eq!(AuditAction::CartRemove.resource(), "cart_items");
        assert_eq!(AuditAction::UserLogin.as_str(), "user_login");
        assert_eq!(AuditAction::ReviewCreate.as_str(), "review_create");
    }
}
