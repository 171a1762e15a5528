use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    deliveries, orders, pizzas,
    sea_orm_active_enums::{DeliveryStatus, OrderStatus, PaymentMethod, PizzaCategory, UserRole},
    users,
};

/// Account as exposed over the API. The password hash never leaves the service layer.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Pizza {
    pub id: Uuid,
    pub name: String,
    pub ingredients: Vec<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: PizzaCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Eight digits, no separators.
    pub zip_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One resolved line of an order.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub pizza: Pizza,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub delivery_person: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: DeliveryStatus,
    /// Minutes.
    pub estimated_time: i32,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<pizzas::Model> for Pizza {
    fn from(model: pizzas::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            ingredients: model.ingredients,
            price: model.price,
            category: model.category,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            total_price: model.total_price,
            status: model.status,
            address: Address {
                street: model.street,
                number: model.number,
                complement: model.complement,
                neighborhood: model.neighborhood,
                city: model.city,
                zip_code: model.zip_code,
            },
            payment_method: model.payment_method,
            observations: model.observations,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<deliveries::Model> for Delivery {
    fn from(model: deliveries::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            delivery_person: model.delivery_person,
            start_time: model.start_time.with_timezone(&Utc),
            end_time: model.end_time.map(|dt| dt.with_timezone(&Utc)),
            status: model.status,
            estimated_time: model.estimated_time,
            notes: model.notes,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
