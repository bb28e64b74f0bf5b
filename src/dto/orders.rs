use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderDetail, OrderStatus, UnitType};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderDetailRequest {
    pub product_id: Uuid,
    pub quantity: f64,
    /// Must match the product's own unit type.
    pub unit_type: UnitType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderCreate {
    pub details: Vec<OrderDetailRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddOrderDetailRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit_type: UnitType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderDetailUpdate {
    pub quantity: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithDetails {
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailList {
    pub items: Vec<OrderDetail>,
}
