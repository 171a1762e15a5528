use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::deliveries::{
        CreateDeliveryRequest, DeliveryList, DeliveryWithOrder, UpdateDeliveryRequest,
        UpdateDeliveryStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::DeliveryListQuery,
    services::delivery_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deliveries).post(create_delivery))
        .route("/order/{order_id}", get(get_delivery_by_order))
        .route(
            "/{id}",
            get(get_delivery).put(update_delivery).delete(delete_delivery),
        )
        .route("/{id}/status", patch(update_delivery_status))
}

#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = CreateDeliveryRequest,
    responses(
        (status = 201, description = "Open a delivery; the order moves to \"Em preparo\"", body = ApiResponse<DeliveryWithOrder>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already has a delivery")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn create_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDeliveryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DeliveryWithOrder>>)> {
    let resp = delivery_service::create_delivery(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/deliveries",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by delivery status")
    ),
    responses(
        (status = 200, description = "List deliveries (admin only)", body = ApiResponse<DeliveryList>),
        (status = 400, description = "Invalid status filter"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DeliveryListQuery>,
) -> AppResult<Json<ApiResponse<DeliveryList>>> {
    let resp = delivery_service::list_deliveries(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delivery with its order", body = ApiResponse<DeliveryWithOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn get_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliveryWithOrder>>> {
    let resp = delivery_service::get_delivery(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/deliveries/order/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Delivery bound to an order", body = ApiResponse<DeliveryWithOrder>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No delivery for this order")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn get_delivery_by_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliveryWithOrder>>> {
    let resp = delivery_service::get_delivery_by_order(&state, &user, order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    request_body = UpdateDeliveryRequest,
    responses(
        (status = 200, description = "Sparse delivery update; status changes propagate to the order", body = ApiResponse<DeliveryWithOrder>),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn update_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryRequest>,
) -> AppResult<Json<ApiResponse<DeliveryWithOrder>>> {
    let resp = delivery_service::update_delivery(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/deliveries/{id}/status",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    request_body = UpdateDeliveryStatusRequest,
    responses(
        (status = 200, description = "Update delivery status and the bound order status", body = ApiResponse<DeliveryWithOrder>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDeliveryStatusRequest>,
) -> AppResult<Json<ApiResponse<DeliveryWithOrder>>> {
    let resp = delivery_service::update_delivery_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 200, description = "Delete a delivery (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Deliveries"
)]
pub async fn delete_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = delivery_service::delete_delivery(&state, &user, id).await?;
    Ok(Json(resp))
}
