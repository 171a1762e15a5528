use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::pizzas::{CreatePizzaRequest, PizzaList, UpdatePizzaRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Pizza,
    response::ApiResponse,
    routes::params::PizzaQuery,
    services::pizza_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pizzas).post(create_pizza))
        .route(
            "/{id}",
            get(get_pizza).put(update_pizza).delete(delete_pizza),
        )
}

#[utoipa::path(
    get,
    path = "/api/pizzas",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search by name"),
        ("category" = Option<String>, Query, description = "Tradicional, Premium or Doce"),
        ("min_price" = Option<f64>, Query, description = "Minimum price"),
        ("max_price" = Option<f64>, Query, description = "Maximum price"),
        ("sort_by" = Option<String>, Query, description = "Sort by: created_at, price, name"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List pizzas", body = ApiResponse<PizzaList>),
        (status = 400, description = "Invalid category")
    ),
    tag = "Pizzas"
)]
pub async fn list_pizzas(
    State(state): State<AppState>,
    Query(query): Query<PizzaQuery>,
) -> AppResult<Json<ApiResponse<PizzaList>>> {
    let resp = pizza_service::list_pizzas(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pizzas/{id}",
    params(("id" = Uuid, Path, description = "Pizza ID")),
    responses(
        (status = 200, description = "Get a pizza", body = ApiResponse<Pizza>),
        (status = 404, description = "Not Found")
    ),
    tag = "Pizzas"
)]
pub async fn get_pizza(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Pizza>>> {
    let resp = pizza_service::get_pizza(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pizzas",
    request_body = CreatePizzaRequest,
    responses(
        (status = 201, description = "Create a pizza (admin only)", body = ApiResponse<Pizza>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = [])),
    tag = "Pizzas"
)]
pub async fn create_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePizzaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Pizza>>)> {
    let resp = pizza_service::create_pizza(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/pizzas/{id}",
    params(("id" = Uuid, Path, description = "Pizza ID")),
    request_body = UpdatePizzaRequest,
    responses(
        (status = 200, description = "Update a pizza (admin only)", body = ApiResponse<Pizza>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = [])),
    tag = "Pizzas"
)]
pub async fn update_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePizzaRequest>,
) -> AppResult<Json<ApiResponse<Pizza>>> {
    let resp = pizza_service::update_pizza(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/pizzas/{id}",
    params(("id" = Uuid, Path, description = "Pizza ID")),
    responses(
        (status = 200, description = "Delete a pizza (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Pizza referenced by orders")
    ),
    security(("bearer_auth" = [])),
    tag = "Pizzas"
)]
pub async fn delete_pizza(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = pizza_service::delete_pizza(&state, &user, id).await?;
    Ok(Json(resp))
}
