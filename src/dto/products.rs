use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, UnitType};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub country_id: Uuid,
    pub category_id: Uuid,
    pub price_per_unit: f64,
    pub unit_type: UnitType,
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub country_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub price_per_unit: Option<f64>,
    pub unit_type: Option<UnitType>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
