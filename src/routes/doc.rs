use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, TokenResponse},
        cart::{AddToCartRequest, CartItemWithProduct, CartList, CartQuantityUpdate},
        catalog::{CategoryList, CountryList, NameRequest},
        orders::{
            AddOrderDetailRequest, OrderCreate, OrderDetailList, OrderDetailRequest,
            OrderDetailUpdate, OrderList, OrderStatusUpdate, OrderWithDetails,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{ReviewCreate, ReviewList, ReviewUpdate},
        users::{UserAdminUpdate, UserList, UserProfileUpdate},
    },
    models::{
        CartItem, Category, Country, Order, OrderDetail, OrderStatus, Product, Review, Role,
        UnitType, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        cart, categories, countries, health, order_details, orders, params, products, reviews,
        users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::list_users,
        users::me,
        users::get_user,
        users::update_user,
        users::admin_update_user,
        users::delete_user,
        users::make_admin,
        countries::list_countries,
        countries::get_country,
        countries::create_country,
        countries::update_country,
        countries::delete_country,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_all_orders,
        orders::create_order,
        orders::get_order,
        orders::get_order_items,
        orders::update_order,
        orders::delete_order,
        order_details::list_all_order_details,
        order_details::get_order_detail,
        order_details::add_order_detail,
        order_details::update_order_detail,
        order_details::delete_order_detail,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        reviews::list_reviews,
        reviews::get_review,
        reviews::reviews_by_product,
        reviews::reviews_by_user,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review
    ),
    components(
        schemas(
            User,
            Role,
            Country,
            Category,
            Product,
            UnitType,
            Order,
            OrderStatus,
            OrderDetail,
            CartItem,
            Review,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserProfileUpdate,
            UserAdminUpdate,
            UserList,
            NameRequest,
            CountryList,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            OrderCreate,
            OrderDetailRequest,
            OrderStatusUpdate,
            AddOrderDetailRequest,
            OrderDetailUpdate,
            OrderWithDetails,
            OrderList,
            OrderDetailList,
            AddToCartRequest,
            CartQuantityUpdate,
            CartItemWithProduct,
            CartList,
            ReviewCreate,
            ReviewUpdate,
            ReviewList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::ProductSortBy,
            params::SortOrder,
            health::HealthData,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithDetails>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<ReviewList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration, login and user management"),
        (name = "Catalog", description = "Countries and categories"),
        (name = "Products", description = "Product endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "OrderDetails", description = "Order line item endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Reviews", description = "Review endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
