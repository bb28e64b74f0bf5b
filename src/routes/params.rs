use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::OrderStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

fn normalize(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    Name,
    Price,
    ExpirationDate,
}

impl ProductSortBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ProductSortBy::Name => "name",
            ProductSortBy::Price => "price_per_unit",
            ProductSortBy::ExpirationDate => "expiration_date",
        }
    }
}

// Pagination fields are inlined rather than flattened: urlencoded form
// decoding stringifies values under `#[serde(flatten)]`, which rejects
// numeric fields the moment they are supplied.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn normalize(&self) -> (i64, i64, i64) {
        normalize(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination {
            page: None,
            per_page: None,
        };
        assert_eq!(p.normalize(), (1, 20, 0));

        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
    }

    // Filtered list queries arrive urlencoded; numeric page params must
    // survive decoding alongside the filter fields.
    #[test]
    fn product_query_decodes_supplied_page_params() {
        let query: ProductQuery =
            serde_urlencoded::from_str("page=2&per_page=10&q=apple&sort_by=price&sort_order=desc")
                .unwrap();
        assert_eq!(query.normalize(), (2, 10, 10));
        assert_eq!(query.q.as_deref(), Some("apple"));
        assert!(matches!(query.sort_by, Some(ProductSortBy::Price)));
        assert!(matches!(query.sort_order, Some(SortOrder::Desc)));
    }

    #[test]
    fn product_query_decodes_empty_string() {
        let query: ProductQuery = serde_urlencoded::from_str("").unwrap();
        assert_eq!(query.normalize(), (1, 20, 0));
        assert!(query.q.is_none());
    }

    #[test]
    fn order_list_query_decodes_page_and_status() {
        let query: OrderListQuery =
            serde_urlencoded::from_str("page=3&per_page=5&status=pending").unwrap();
        assert_eq!(query.normalize(), (3, 5, 10));
        assert!(matches!(query.status, Some(OrderStatus::Pending)));
    }
}
