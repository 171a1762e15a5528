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
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        deliveries::{
            CreateDeliveryRequest, DeliveryList, DeliveryWithOrder, UpdateDeliveryRequest,
            UpdateDeliveryStatusRequest,
        },
        orders::{
            AddressPatch, CreateOrderRequest, OrderLineRequest, OrderList, OrderWithItems,
            UpdateOrderRequest, UpdateOrderStatusRequest,
        },
        pizzas::{CreatePizzaRequest, PizzaList, UpdatePizzaRequest},
        users::{UpdateUserRequest, UserList},
    },
    entity::sea_orm_active_enums::{
        DeliveryStatus, OrderStatus, PaymentMethod, PizzaCategory, UserRole,
    },
    models::{Address, Delivery, Order, OrderItem, Pizza, User},
    response::{ApiResponse, Meta},
    routes::{deliveries, health, orders, params, pizzas, users},
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
        users::get_user,
        users::update_user,
        users::delete_user,
        pizzas::list_pizzas,
        pizzas::get_pizza,
        pizzas::create_pizza,
        pizzas::update_pizza,
        pizzas::delete_pizza,
        orders::create_order,
        orders::list_orders,
        orders::get_orders_by_user,
        orders::get_order,
        orders::update_order,
        orders::update_order_status,
        orders::delete_order,
        deliveries::create_delivery,
        deliveries::list_deliveries,
        deliveries::get_delivery,
        deliveries::get_delivery_by_order,
        deliveries::update_delivery,
        deliveries::update_delivery_status,
        deliveries::delete_delivery
    ),
    components(
        schemas(
            User,
            Pizza,
            Address,
            Order,
            OrderItem,
            Delivery,
            UserRole,
            PizzaCategory,
            PaymentMethod,
            OrderStatus,
            DeliveryStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateUserRequest,
            UserList,
            CreatePizzaRequest,
            UpdatePizzaRequest,
            PizzaList,
            OrderLineRequest,
            CreateOrderRequest,
            AddressPatch,
            UpdateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderList,
            CreateDeliveryRequest,
            UpdateDeliveryRequest,
            UpdateDeliveryStatusRequest,
            DeliveryWithOrder,
            DeliveryList,
            params::Pagination,
            params::PizzaQuery,
            params::OrderListQuery,
            params::DeliveryListQuery,
            health::HealthData,
            Meta,
            ApiResponse<User>,
            ApiResponse<Pizza>,
            ApiResponse<OrderWithItems>,
            ApiResponse<DeliveryWithOrder>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Accounts and authentication"),
        (name = "Pizzas", description = "Pizza catalog"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Deliveries", description = "Delivery lifecycle"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/users/register",
            "/api/pizzas/{id}",
            "/api/orders/user/{user_id}",
            "/api/orders/{id}/status",
            "/api/deliveries/order/{order_id}",
            "/api/deliveries/{id}/status",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
