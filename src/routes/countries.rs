use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::catalog::{CountryList, NameRequest},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, ensure_admin},
    models::Country,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_countries))
        .route("/", post(create_country))
        .route("/{id}", get(get_country))
        .route("/{id}", put(update_country))
        .route("/{id}", delete(delete_country))
}

#[utoipa::path(
    get,
    path = "/api/countries",
    responses(
        (status = 200, description = "List countries", body = ApiResponse<CountryList>)
    ),
    tag = "Catalog"
)]
pub async fn list_countries(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CountryList>>> {
    let items: Vec<Country> = sqlx::query_as("SELECT * FROM countries ORDER BY name")
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(ApiResponse::success(
        "Countries",
        CountryList { items },
        None,
    )))
}

#[utoipa::path(
    get,
    path = "/api/countries/{id}",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses(
        (status = 200, description = "Get country", body = ApiResponse<Country>),
        (status = 404, description = "Country not found")
    ),
    tag = "Catalog"
)]
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Country>>> {
    let country: Option<Country> = sqlx::query_as("SELECT * FROM countries WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let country = country.ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Country", country, None)))
}

#[utoipa::path(
    post,
    path = "/api/countries",
    request_body = NameRequest,
    responses(
        (status = 201, description = "Create country", body = ApiResponse<Country>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_country(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Country>>> {
    ensure_admin(&user)?;
    let country: Country =
        sqlx::query_as("INSERT INTO countries (id, name) VALUES ($1, $2) RETURNING *")
            .bind(Uuid::new_v4())
            .bind(payload.name)
            .fetch_one(&state.pool)
            .await?;
    Ok(Json(ApiResponse::success(
        "Country created",
        country,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/countries/{id}",
    params(("id" = Uuid, Path, description = "Country ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Updated country", body = ApiResponse<Country>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn update_country(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Country>>> {
    ensure_admin(&user)?;
    let country: Option<Country> =
        sqlx::query_as("UPDATE countries SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(payload.name)
            .fetch_optional(&state.pool)
            .await?;
    let country = country.ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success(
        "Updated",
        country,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/countries/{id}",
    params(("id" = Uuid, Path, description = "Country ID")),
    responses(
        (status = 200, description = "Deleted country"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Country not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn delete_country(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    let result = sqlx::query("DELETE FROM countries WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(Json(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
