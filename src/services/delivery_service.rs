use chrono::{DateTime, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::deliveries::{
        CreateDeliveryRequest, DeliveryList, DeliveryWithOrder, UpdateDeliveryRequest,
        UpdateDeliveryStatusRequest,
    },
    entity::{
        deliveries::{
            ActiveModel as DeliveryActive, Column as DeliveryCol, Entity as Deliveries,
            Model as DeliveryModel,
        },
        orders::{Entity as Orders, Model as OrderModel},
        sea_orm_active_enums::{DeliveryStatus, OrderStatus, WireEnum},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::Delivery,
    response::{ApiResponse, Meta},
    routes::params::DeliveryListQuery,
    services::order_service::{find_order, force_status, load_order_details},
    state::AppState,
};

const DUPLICATE_DELIVERY: &str = "This order already has a delivery";

/// Parsed, validated sparse update of a delivery.
#[derive(Debug, Default)]
struct DeliveryChange {
    delivery_person: Option<String>,
    status: Option<DeliveryStatus>,
    end_time: Option<DateTime<Utc>>,
    estimated_time: Option<i32>,
    notes: Option<String>,
}

impl TryFrom<UpdateDeliveryRequest> for DeliveryChange {
    type Error = AppError;

    fn try_from(payload: UpdateDeliveryRequest) -> Result<Self, Self::Error> {
        payload.validate()?;
        let status = payload
            .status
            .as_deref()
            .map(DeliveryStatus::parse)
            .transpose()?;
        Ok(Self {
            delivery_person: payload.delivery_person,
            status,
            end_time: payload.end_time,
            estimated_time: payload.estimated_time,
            notes: payload.notes,
        })
    }
}

/// Opens a delivery for an order and moves the order to "Em preparo" in the same transaction.
pub async fn create_delivery(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDeliveryRequest,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;

    // The order row lock serializes concurrent attempts for the same order;
    // the unique index on deliveries.order_id is the final guard.
    let order = Orders::find_by_id(payload.order)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let existing = Deliveries::find()
        .filter(DeliveryCol::OrderId.eq(order.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(DUPLICATE_DELIVERY.into()));
    }

    let now = Utc::now();
    let delivery = DeliveryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        delivery_person: Set(payload.delivery_person.trim().to_string()),
        start_time: Set(now.into()),
        end_time: Set(None),
        status: Set(DeliveryStatus::Preparing),
        estimated_time: Set(payload.estimated_time),
        notes: Set(payload.notes),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await
    .map_err(AppError::conflict_on(DUPLICATE_DELIVERY))?;

    let order = force_status(&txn, order, OrderStatus::Preparing).await?;
    txn.commit().await?;

    tracing::info!(
        delivery_id = %delivery.id,
        order_id = %order.id,
        estimated_time = delivery.estimated_time,
        "delivery created"
    );
    audit::record(
        state,
        Some(user.user_id),
        "delivery_create",
        "deliveries",
        serde_json::json!({ "delivery_id": delivery.id, "order_id": order.id }),
    )
    .await;

    let order = load_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Delivery created",
        DeliveryWithOrder {
            delivery: Delivery::from(delivery),
            order,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_deliveries(
    state: &AppState,
    user: &AuthUser,
    query: DeliveryListQuery,
) -> AppResult<ApiResponse<DeliveryList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(DeliveryCol::Status.eq(DeliveryStatus::parse(status)?));
    }

    let finder = Deliveries::find()
        .filter(condition)
        .order_by_desc(DeliveryCol::StartTime);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Delivery::from)
        .collect();

    Ok(ApiResponse::success(
        "Deliveries",
        DeliveryList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_delivery(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    let delivery = Deliveries::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Delivery not found"))?;

    with_order(state, user, delivery, "Delivery").await
}

pub async fn get_delivery_by_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    let delivery = Deliveries::find()
        .filter(DeliveryCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("No delivery found for this order"))?;

    with_order(state, user, delivery, "Delivery").await
}

pub async fn update_delivery_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDeliveryStatusRequest,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    ensure_admin(user)?;
    let change = DeliveryChange {
        status: Some(DeliveryStatus::parse(&payload.status)?),
        ..Default::default()
    };
    apply_change(state, user, id, change, "Delivery status updated").await
}

pub async fn update_delivery(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateDeliveryRequest,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    ensure_admin(user)?;
    let change = DeliveryChange::try_from(payload)?;
    apply_change(state, user, id, change, "Delivery updated").await
}

/// Deleting a delivery leaves the order status untouched.
pub async fn delete_delivery(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Deliveries::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Delivery not found"));
    }

    audit::record(
        state,
        Some(user.user_id),
        "delivery_delete",
        "deliveries",
        serde_json::json!({ "delivery_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Delivery removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Writes a delivery change and the order status it implies in one transaction.
///
/// Rows are locked order first, then delivery, matching `create_delivery` and
/// `order_service::delete_order`, so concurrent writers cannot deadlock.
async fn apply_change(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    change: DeliveryChange,
    message: &str,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    // A delivery's order_id is never updated, so reading it before locking is safe.
    let order_id = Deliveries::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Delivery not found"))?
        .order_id;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    let delivery = Deliveries::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Delivery not found"))?;
    let previous = delivery.status;

    let now = Utc::now();
    let mut active: DeliveryActive = delivery.into();
    if let Some(person) = change.delivery_person {
        active.delivery_person = Set(person.trim().to_string());
    }
    if let Some(estimated_time) = change.estimated_time {
        active.estimated_time = Set(estimated_time);
    }
    if let Some(notes) = change.notes {
        active.notes = Set(non_blank(notes));
    }
    if let Some(end_time) = change.end_time {
        active.end_time = Set(Some(end_time.into()));
    }

    let mut order = order;
    if let Some(status) = change.status {
        active.status = Set(status);
        if status == DeliveryStatus::Delivered {
            active.end_time = Set(Some(now.into()));
        }
        if let Some(order_status) = status.propagated_order_status() {
            order = force_status(&txn, order, order_status).await?;
        }
    }
    active.updated_at = Set(now.into());

    let delivery = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        delivery_id = %delivery.id,
        order_id = %order.id,
        from = previous.as_str(),
        to = delivery.status.as_str(),
        order_status = order.status.as_str(),
        "delivery updated"
    );
    audit::record(
        state,
        Some(user.user_id),
        "delivery_update",
        "deliveries",
        serde_json::json!({
            "delivery_id": delivery.id,
            "status": delivery.status,
            "order_status": order.status,
        }),
    )
    .await;

    let order = load_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        message,
        DeliveryWithOrder {
            delivery: Delivery::from(delivery),
            order,
        },
        Some(Meta::empty()),
    ))
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

async fn with_order(
    state: &AppState,
    user: &AuthUser,
    delivery: DeliveryModel,
    message: &str,
) -> AppResult<ApiResponse<DeliveryWithOrder>> {
    let order: OrderModel = find_order(&state.orm, delivery.order_id).await?;
    ensure_self_or_admin(user, order.user_id)?;

    let order = load_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        message,
        DeliveryWithOrder {
            delivery: Delivery::from(delivery),
            order,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_update_parses_status() {
        let change = DeliveryChange::try_from(UpdateDeliveryRequest {
            status: Some("Em rota".into()),
            notes: Some("portão azul".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(change.status, Some(DeliveryStatus::OnRoute));
        assert_eq!(change.notes.as_deref(), Some("portão azul"));
        assert!(change.delivery_person.is_none());
    }

    #[test]
    fn sparse_update_rejects_order_statuses() {
        let err = DeliveryChange::try_from(UpdateDeliveryRequest {
            status: Some("Em entrega".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(err.to_string().contains("Valid options: Em preparo, Em rota, Entregue, Cancelado"));
    }

    #[test]
    fn sparse_update_rejects_non_positive_estimate() {
        let err = DeliveryChange::try_from(UpdateDeliveryRequest {
            estimated_time: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
