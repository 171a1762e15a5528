use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, OrderLineRequest, OrderList, OrderWithItems, UpdateOrderRequest,
        UpdateOrderStatusRequest, validate_address,
    },
    entity::{
        deliveries::{Column as DeliveryCol, Entity as Deliveries},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        pizzas::{Column as PizzaCol, Entity as Pizzas, Model as PizzaModel},
        sea_orm_active_enums::{OrderStatus, WireEnum},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_self_or_admin},
    models::{Order, OrderItem, Pizza, User},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// A request line matched against the catalog.
#[derive(Debug, Clone)]
pub(crate) struct PricedLine {
    pub pizza: PizzaModel,
    pub quantity: i32,
}

impl PricedLine {
    fn subtotal(&self) -> Decimal {
        self.pizza.price * Decimal::from(self.quantity)
    }
}

/// Matches every requested line against the catalog snapshot, failing on the first unknown pizza.
pub(crate) fn price_lines(
    lines: &[OrderLineRequest],
    catalog: &HashMap<Uuid, PizzaModel>,
) -> AppResult<(Vec<PricedLine>, Decimal)> {
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let pizza = catalog
            .get(&line.pizza)
            .ok_or_else(|| AppError::not_found(format!("Pizza with ID {} not found", line.pizza)))?;
        priced.push(PricedLine {
            pizza: pizza.clone(),
            quantity: line.quantity,
        });
    }
    let total: Decimal = priced.iter().map(PricedLine::subtotal).sum();
    // orders.total_price is NUMERIC(12, 2).
    if total >= Decimal::new(10_000_000_000, 0) {
        return Err(AppError::BadRequest(
            "Order total must be less than 10000000000".into(),
        ));
    }
    Ok((priced, total))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;

    let customer_id = match payload.user {
        Some(id) if id != user.user_id => {
            ensure_admin(user)?;
            id
        }
        _ => user.user_id,
    };

    let txn = state.orm.begin().await?;

    let customer = Users::find_by_id(customer_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let mut pizza_ids: Vec<Uuid> = payload.pizzas.iter().map(|line| line.pizza).collect();
    pizza_ids.sort();
    pizza_ids.dedup();

    // Shared locks keep catalog prices stable until the order is committed.
    let catalog: HashMap<Uuid, PizzaModel> = Pizzas::find()
        .filter(PizzaCol::Id.is_in(pizza_ids))
        .lock(LockType::Share)
        .all(&txn)
        .await?
        .into_iter()
        .map(|pizza| (pizza.id, pizza))
        .collect();

    let (lines, total_price) = price_lines(&payload.pizzas, &catalog)?;

    let address = payload.address;
    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.id),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending),
        street: Set(address.street),
        number: Set(address.number),
        complement: Set(address.complement),
        neighborhood: Set(address.neighborhood),
        city: Set(address.city),
        zip_code: Set(address.zip_code),
        payment_method: Set(payload.payment_method),
        observations: Set(payload.observations),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for (position, line) in lines.into_iter().enumerate() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            pizza_id: Set(line.pizza.id),
            position: Set(position as i32),
            quantity: Set(line.quantity),
            unit_price: Set(line.pizza.price),
        }
        .insert(&txn)
        .await?;

        items.push(OrderItem {
            pizza: Pizza::from(line.pizza),
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        total_price = %order.total_price,
        "order created"
    );
    audit::record(
        state,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": order.total_price.to_string() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: Order::from(order),
            user: User::from(customer),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(OrderStatus::parse(status)?));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_order(&state.orm, id).await?;
    ensure_self_or_admin(user, order.user_id)?;

    let details = load_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", details, Some(Meta::empty())))
}

/// All orders of one customer, oldest first.
pub async fn get_orders_by_user(
    state: &AppState,
    user: &AuthUser,
    user_id: Uuid,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_self_or_admin(user, user_id)?;

    if Users::find_by_id(user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    let items: Vec<Order> = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_asc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let status = match payload.status.as_deref() {
        Some(status) => {
            ensure_admin(user)?;
            Some(OrderStatus::parse(status)?)
        }
        None => None,
    };

    let existing = find_order(&state.orm, id).await?;
    ensure_self_or_admin(user, existing.user_id)?;

    let current_address = Order::from(existing.clone()).address;
    let mut active: OrderActive = existing.into();

    if let Some(patch) = payload.address {
        let address = patch.apply(current_address);
        validate_address(&address)?;
        active.street = Set(address.street);
        active.number = Set(address.number);
        active.complement = Set(address.complement);
        active.neighborhood = Set(address.neighborhood);
        active.city = Set(address.city);
        active.zip_code = Set(address.zip_code);
    }
    if let Some(payment_method) = payload.payment_method {
        active.payment_method = Set(payment_method);
    }
    // An empty string clears the observations.
    if let Some(observations) = payload.observations {
        active.observations = Set(Some(observations).filter(|o| !o.trim().is_empty()));
    }
    if let Some(status) = status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());

    let order = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "order_update",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    let details = load_order_details(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", details, Some(Meta::empty())))
}

/// Any status may follow any other; the transition is an explicit admin decision.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status = OrderStatus::parse(&payload.status)?;

    let existing = find_order(&state.orm, id).await?;
    let previous = existing.status;
    let order = force_status(&state.orm, existing, status).await?;

    tracing::info!(
        order_id = %order.id,
        from = previous.as_str(),
        to = status.as_str(),
        "order status updated"
    );
    audit::record(
        state,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Removes the order together with its delivery, if any.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let removed_deliveries = Deliveries::delete_many()
        .filter(DeliveryCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?
        .rows_affected;

    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, removed_deliveries, "order deleted");
    audit::record(
        state,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id, "removed_deliveries": removed_deliveries }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order removed",
        serde_json::json!({ "removedDeliveries": removed_deliveries }),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn find_order<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

/// Overwrites the order status. Callers own the surrounding transaction.
pub(crate) async fn force_status<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
    status: OrderStatus,
) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Resolves the customer and the catalog entries referenced by an order.
pub(crate) async fn load_order_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let user = Users::find_by_id(order.user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;

    let pizza_ids: Vec<Uuid> = rows.iter().map(|row| row.pizza_id).collect();
    let pizzas: HashMap<Uuid, PizzaModel> = Pizzas::find()
        .filter(PizzaCol::Id.is_in(pizza_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|pizza| (pizza.id, pizza))
        .collect();

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let pizza = pizzas.get(&row.pizza_id).cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "order {} references missing pizza {}",
                order.id,
                row.pizza_id
            ))
        })?;
        items.push(OrderItem {
            pizza: Pizza::from(pizza),
            quantity: row.quantity,
            unit_price: row.unit_price,
        });
    }

    Ok(OrderWithItems {
        order: Order::from(order),
        user: User::from(user),
        items,
    })
}
