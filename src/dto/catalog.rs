use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Country};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountryList {
    pub items: Vec<Country>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}
