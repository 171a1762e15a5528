use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Closed set of string literals shared by the database column and the JSON wire format.
pub trait WireEnum: Sized + Copy + 'static {
    const LABEL: &'static str;
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn valid_options() -> String {
        Self::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn parse(value: &str) -> Result<Self, AppError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == value)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Invalid {}. Valid options: {}",
                    Self::LABEL,
                    Self::valid_options()
                ))
            })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pendente")]
    #[serde(rename = "Pendente")]
    Pending,
    #[sea_orm(string_value = "Em preparo")]
    #[serde(rename = "Em preparo")]
    Preparing,
    #[sea_orm(string_value = "Em entrega")]
    #[serde(rename = "Em entrega")]
    OutForDelivery,
    #[sea_orm(string_value = "Entregue")]
    #[serde(rename = "Entregue")]
    Delivered,
    #[sea_orm(string_value = "Cancelado")]
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl WireEnum for OrderStatus {
    const LABEL: &'static str = "order status";
    const ALL: &'static [Self] = &[
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendente",
            OrderStatus::Preparing => "Em preparo",
            OrderStatus::OutForDelivery => "Em entrega",
            OrderStatus::Delivered => "Entregue",
            OrderStatus::Cancelled => "Cancelado",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "Em preparo")]
    #[serde(rename = "Em preparo")]
    Preparing,
    #[sea_orm(string_value = "Em rota")]
    #[serde(rename = "Em rota")]
    OnRoute,
    #[sea_orm(string_value = "Entregue")]
    #[serde(rename = "Entregue")]
    Delivered,
    #[sea_orm(string_value = "Cancelado")]
    #[serde(rename = "Cancelado")]
    Cancelled,
}

impl DeliveryStatus {
    /// Order status forced when a delivery enters this status.
    pub fn propagated_order_status(self) -> Option<OrderStatus> {
        match self {
            DeliveryStatus::Preparing => None,
            DeliveryStatus::OnRoute => Some(OrderStatus::OutForDelivery),
            DeliveryStatus::Delivered => Some(OrderStatus::Delivered),
            DeliveryStatus::Cancelled => Some(OrderStatus::Cancelled),
        }
    }
}

impl WireEnum for DeliveryStatus {
    const LABEL: &'static str = "delivery status";
    const ALL: &'static [Self] = &[
        DeliveryStatus::Preparing,
        DeliveryStatus::OnRoute,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Preparing => "Em preparo",
            DeliveryStatus::OnRoute => "Em rota",
            DeliveryStatus::Delivered => "Entregue",
            DeliveryStatus::Cancelled => "Cancelado",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Dinheiro")]
    #[serde(rename = "Dinheiro")]
    Cash,
    #[sea_orm(string_value = "Cartão de crédito")]
    #[serde(rename = "Cartão de crédito")]
    CreditCard,
    #[sea_orm(string_value = "Cartão de débito")]
    #[serde(rename = "Cartão de débito")]
    DebitCard,
    #[sea_orm(string_value = "PIX")]
    #[serde(rename = "PIX")]
    Pix,
}

impl WireEnum for PaymentMethod {
    const LABEL: &'static str = "payment method";
    const ALL: &'static [Self] = &[
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Pix,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::CreditCard => "Cartão de crédito",
            PaymentMethod::DebitCard => "Cartão de débito",
            PaymentMethod::Pix => "PIX",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum PizzaCategory {
    #[sea_orm(string_value = "Tradicional")]
    #[serde(rename = "Tradicional")]
    Traditional,
    #[sea_orm(string_value = "Premium")]
    #[serde(rename = "Premium")]
    Premium,
    #[sea_orm(string_value = "Doce")]
    #[serde(rename = "Doce")]
    Sweet,
}

impl WireEnum for PizzaCategory {
    const LABEL: &'static str = "pizza category";
    const ALL: &'static [Self] = &[
        PizzaCategory::Traditional,
        PizzaCategory::Premium,
        PizzaCategory::Sweet,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PizzaCategory::Traditional => "Tradicional",
            PizzaCategory::Premium => "Premium",
            PizzaCategory::Sweet => "Doce",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl WireEnum for UserRole {
    const LABEL: &'static str = "role";
    const ALL: &'static [Self] = &[UserRole::User, UserRole::Admin];

    fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_accepts_only_wire_literals() {
        assert_eq!(OrderStatus::parse("Em entrega").unwrap(), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::parse("Pendente").unwrap(), OrderStatus::Pending);
        assert!(OrderStatus::parse("pendente").is_err());
        assert!(OrderStatus::parse("Em rota").is_err());
    }

    #[test]
    fn invalid_status_lists_valid_options() {
        let err = OrderStatus::parse("shipped").unwrap_err();
        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(
                    msg,
                    "Invalid order status. Valid options: Pendente, Em preparo, Em entrega, Entregue, Cancelado"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = DeliveryStatus::parse("Em entrega").unwrap_err();
        assert!(err
            .to_string()
            .contains("Em preparo, Em rota, Entregue, Cancelado"));
    }

    #[test]
    fn delivery_status_propagation_table() {
        assert_eq!(DeliveryStatus::Preparing.propagated_order_status(), None);
        assert_eq!(
            DeliveryStatus::OnRoute.propagated_order_status(),
            Some(OrderStatus::OutForDelivery)
        );
        assert_eq!(
            DeliveryStatus::Delivered.propagated_order_status(),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(
            DeliveryStatus::Cancelled.propagated_order_status(),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn serde_uses_the_same_literals_as_the_database() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            assert_eq!(method.to_value(), method.as_str());
        }
        for category in PizzaCategory::ALL {
            assert_eq!(category.to_value(), category.as_str());
        }
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let status: DeliveryStatus = serde_json::from_str("\"Em rota\"").unwrap();
        assert_eq!(status, DeliveryStatus::OnRoute);
    }
}
