use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::pizzas::{CreatePizzaRequest, PizzaList, UpdatePizzaRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        pizzas::{ActiveModel, Column, Entity as Pizzas},
        sea_orm_active_enums::{PizzaCategory, WireEnum},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Pizza,
    response::{ApiResponse, Meta},
    routes::params::{PizzaQuery, PizzaSortBy, SortOrder},
    state::AppState,
};

const DUPLICATE_NAME: &str = "A pizza with this name already exists";

pub async fn list_pizzas(
    state: &AppState,
    query: PizzaQuery,
) -> AppResult<ApiResponse<PizzaList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col(Column::Name).ilike(pattern));
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Category.eq(PizzaCategory::parse(category)?));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(PizzaSortBy::Name);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Asc);
    let sort_col = match sort_by {
        PizzaSortBy::CreatedAt => Column::CreatedAt,
        PizzaSortBy::Price => Column::Price,
        PizzaSortBy::Name => Column::Name,
    };

    let mut finder = Pizzas::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Pizza::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Pizzas", PizzaList { items }, Some(meta)))
}

pub async fn get_pizza(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Pizza>> {
    let pizza = Pizzas::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Pizza not found"))?;
    Ok(ApiResponse::success("Pizza", Pizza::from(pizza), None))
}

pub async fn create_pizza(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePizzaRequest,
) -> AppResult<ApiResponse<Pizza>> {
    ensure_admin(user)?;
    payload.validate()?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        ingredients: Set(trim_all(payload.ingredients)),
        price: Set(payload.price),
        category: Set(payload.category),
        created_at: Set(Utc::now().into()),
    };
    let pizza = active
        .insert(&state.orm)
        .await
        .map_err(AppError::conflict_on(DUPLICATE_NAME))?;

    tracing::info!(pizza_id = %pizza.id, name = %pizza.name, "pizza created");
    audit::record(
        state,
        Some(user.user_id),
        "pizza_create",
        "pizzas",
        serde_json::json!({ "pizza_id": pizza.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pizza created",
        Pizza::from(pizza),
        Some(Meta::empty()),
    ))
}

/// Price edits only affect future orders; placed orders keep their line prices.
pub async fn update_pizza(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePizzaRequest,
) -> AppResult<ApiResponse<Pizza>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = Pizzas::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Pizza not found"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(ingredients) = payload.ingredients {
        active.ingredients = Set(trim_all(ingredients));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }

    let pizza = active
        .update(&state.orm)
        .await
        .map_err(AppError::conflict_on(DUPLICATE_NAME))?;

    audit::record(
        state,
        Some(user.user_id),
        "pizza_update",
        "pizzas",
        serde_json::json!({ "pizza_id": pizza.id, "price": pizza.price.to_string() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pizza updated",
        Pizza::from(pizza),
        Some(Meta::empty()),
    ))
}

pub async fn delete_pizza(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let referenced = OrderItems::find()
        .filter(OrderItemCol::PizzaId.eq(id))
        .count(&state.orm)
        .await?;
    if referenced > 0 {
        return Err(AppError::Conflict(
            "Pizza is part of existing orders and cannot be removed".into(),
        ));
    }

    let result = Pizzas::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(AppError::conflict_on(
            "Pizza is part of existing orders and cannot be removed",
        ))?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Pizza not found"));
    }

    audit::record(
        state,
        Some(user.user_id),
        "pizza_delete",
        "pizzas",
        serde_json::json!({ "pizza_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Pizza removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn trim_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.trim().to_string()).collect()
}
