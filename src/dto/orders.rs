use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{is_valid_zip_code, require_positive, require_present},
    entity::sea_orm_active_enums::PaymentMethod,
    error::{AppError, AppResult},
    models::{Address, Order, OrderItem, User},
};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub pizza: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Any client-supplied total is ignored; the price is always computed from the catalog.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Customer the order is placed for. Only admins may order on behalf of someone else.
    pub user: Option<Uuid>,
    pub pizzas: Vec<OrderLineRequest>,
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub observations: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.pizzas.is_empty() {
            return Err(AppError::BadRequest(
                "pizzas must contain at least one item".into(),
            ));
        }
        for line in &self.pizzas {
            require_positive("quantity", line.quantity)?;
        }
        validate_address(&self.address)
    }
}

pub fn validate_address(address: &Address) -> AppResult<()> {
    require_present("street", &address.street)?;
    require_present("number", &address.number)?;
    require_present("neighborhood", &address.neighborhood)?;
    require_present("city", &address.city)?;
    if !is_valid_zip_code(&address.zip_code) {
        return Err(AppError::BadRequest(
            "zipCode must contain exactly 8 digits".into(),
        ));
    }
    Ok(())
}

/// Sparse address change. An empty `complement` removes it.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

impl AddressPatch {
    pub fn apply(self, mut address: Address) -> Address {
        if let Some(street) = self.street {
            address.street = street;
        }
        if let Some(number) = self.number {
            address.number = number;
        }
        if let Some(complement) = self.complement {
            address.complement = Some(complement).filter(|c| !c.trim().is_empty());
        }
        if let Some(neighborhood) = self.neighborhood {
            address.neighborhood = neighborhood;
        }
        if let Some(city) = self.city {
            address.city = city;
        }
        if let Some(zip_code) = self.zip_code {
            address.zip_code = zip_code;
        }
        address
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    /// Admin only.
    pub status: Option<String>,
    pub address: Option<AddressPatch>,
    pub payment_method: Option<PaymentMethod>,
    /// An empty string clears the observations.
    pub observations: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub user: User,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
