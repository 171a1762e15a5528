use pizza_delivery_api::{
    config::JwtConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        deliveries::{
            CreateDeliveryRequest, DeliveryWithOrder, UpdateDeliveryRequest,
            UpdateDeliveryStatusRequest,
        },
        orders::{CreateOrderRequest, OrderLineRequest, UpdateOrderRequest, UpdateOrderStatusRequest},
        pizzas::{CreatePizzaRequest, UpdatePizzaRequest},
    },
    entity::{
        pizzas::ActiveModel as PizzaActive,
        sea_orm_active_enums::{DeliveryStatus, OrderStatus, PaymentMethod, PizzaCategory, UserRole},
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Address,
    services::{delivery_service, order_service, pizza_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Tests share the database with other runs, so every fixture gets unique names.
async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run order and delivery flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(Some(AppState::new(orm, JwtConfig::new("test-secret", 24))))
}

async fn create_user(state: &AppState, role: UserRole) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Cliente Teste".into()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        password_hash: Set("dummy".into()),
        phone: Set("11987654321".into()),
        role: Set(role),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn create_pizza(state: &AppState, price: Decimal) -> anyhow::Result<Uuid> {
    let pizza = PizzaActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Margherita {}", Uuid::new_v4())),
        ingredients: Set(vec!["molho de tomate".into(), "mussarela".into()]),
        price: Set(price),
        category: Set(PizzaCategory::Traditional),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(pizza.id)
}

fn order_request(pizza: Uuid, quantity: i32) -> CreateOrderRequest {
    CreateOrderRequest {
        user: None,
        pizzas: vec![OrderLineRequest { pizza, quantity }],
        address: Address {
            street: "Rua Augusta".into(),
            number: "100".into(),
            complement: None,
            neighborhood: "Consolação".into(),
            city: "São Paulo".into(),
            zip_code: "01305000".into(),
        },
        payment_method: PaymentMethod::Pix,
        observations: Some("sem cebola".into()),
    }
}

fn delivery_request(order: Uuid) -> CreateDeliveryRequest {
    CreateDeliveryRequest {
        order,
        delivery_person: "João".into(),
        estimated_time: 30,
        notes: None,
    }
}

async fn set_delivery_status(
    state: &AppState,
    admin: &AuthUser,
    delivery_id: Uuid,
    status: &str,
) -> anyhow::Result<DeliveryWithOrder> {
    let resp = delivery_service::update_delivery_status(
        state,
        admin,
        delivery_id,
        UpdateDeliveryStatusRequest {
            status: status.into(),
        },
    )
    .await?;
    Ok(resp.into_data().expect("delivery"))
}

#[tokio::test]
async fn order_total_comes_from_catalog_prices() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let created = order_service::create_order(&state, &customer, order_request(pizza, 2))
        .await?
        .into_data()
        .expect("order");
    assert_eq!(created.order.total_price, Decimal::new(7180, 2));
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.order.user_id, customer.user_id);
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].unit_price, Decimal::new(3590, 2));

    // Later catalog edits do not rewrite placed orders.
    pizza_service::update_pizza(
        &state,
        &admin,
        pizza,
        UpdatePizzaRequest {
            price: Some(Decimal::new(4000, 2)),
            ..Default::default()
        },
    )
    .await?;
    let fetched = order_service::get_order(&state, &customer, created.order.id)
        .await?
        .into_data()
        .expect("order");
    assert_eq!(fetched.order.total_price, Decimal::new(7180, 2));
    assert_eq!(fetched.items[0].unit_price, Decimal::new(3590, 2));

    Ok(())
}

#[tokio::test]
async fn order_with_unknown_pizza_is_not_persisted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let mut request = order_request(pizza, 1);
    request.pizzas.push(OrderLineRequest {
        pizza: Uuid::new_v4(),
        quantity: 1,
    });
    let err = order_service::create_order(&state, &customer, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let orders = order_service::get_orders_by_user(&state, &customer, customer.user_id)
        .await?
        .into_data()
        .expect("orders");
    assert!(orders.items.is_empty());

    Ok(())
}

#[tokio::test]
async fn customers_cannot_read_other_customers_orders() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let owner = create_user(&state, UserRole::User).await?;
    let stranger = create_user(&state, UserRole::User).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &owner, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;

    let err = order_service::get_order(&state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn delivery_lifecycle_propagates_to_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 2))
        .await?
        .into_data()
        .expect("order")
        .order;

    let created = delivery_service::create_delivery(&state, &admin, delivery_request(order.id))
        .await?
        .into_data()
        .expect("delivery");
    assert_eq!(created.delivery.status, DeliveryStatus::Preparing);
    assert_eq!(created.order.order.status, OrderStatus::Preparing);
    let delivery_id = created.delivery.id;

    let on_route = delivery_service::update_delivery_status(
        &state,
        &admin,
        delivery_id,
        UpdateDeliveryStatusRequest {
            status: "Em rota".into(),
        },
    )
    .await?
    .into_data()
    .expect("delivery");
    assert_eq!(on_route.delivery.status, DeliveryStatus::OnRoute);
    assert_eq!(on_route.order.order.status, OrderStatus::OutForDelivery);
    assert!(on_route.delivery.end_time.is_none());

    let delivered = delivery_service::update_delivery(
        &state,
        &admin,
        delivery_id,
        UpdateDeliveryRequest {
            status: Some("Entregue".into()),
            notes: Some("entregue na portaria".into()),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("delivery");
    assert_eq!(delivered.delivery.status, DeliveryStatus::Delivered);
    assert!(delivered.delivery.end_time.is_some());
    assert_eq!(delivered.order.order.status, OrderStatus::Delivered);

    // The customer can follow their own delivery.
    let by_order = delivery_service::get_delivery_by_order(&state, &customer, order.id)
        .await?
        .into_data()
        .expect("delivery");
    assert_eq!(by_order.delivery.id, delivery_id);

    let err = delivery_service::update_delivery_status(
        &state,
        &admin,
        delivery_id,
        UpdateDeliveryStatusRequest {
            status: "Em entrega".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(err.to_string().contains("Em preparo, Em rota, Entregue, Cancelado"));

    Ok(())
}

#[tokio::test]
async fn concurrent_delivery_creation_yields_one_delivery() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;

    let (first, second) = tokio::join!(
        delivery_service::create_delivery(&state, &admin, delivery_request(order.id)),
        delivery_service::create_delivery(&state, &admin, delivery_request(order.id)),
    );

    let results = [first, second];
    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 1);

    Ok(())
}

#[tokio::test]
async fn deleting_an_order_removes_its_delivery() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;
    let delivery = delivery_service::create_delivery(&state, &admin, delivery_request(order.id))
        .await?
        .into_data()
        .expect("delivery")
        .delivery;

    order_service::delete_order(&state, &admin, order.id).await?;

    let err = delivery_service::get_delivery(&state, &admin, delivery.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = order_service::get_order(&state, &admin, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn admin_status_update_is_persisted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;

    let updated = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Em entrega".into(),
        },
    )
    .await?
    .into_data()
    .expect("order");
    assert_eq!(updated.status, OrderStatus::OutForDelivery);

    let fetched = order_service::get_order(&state, &customer, order.id)
        .await?
        .into_data()
        .expect("order");
    assert_eq!(fetched.order.status, OrderStatus::OutForDelivery);

    let err = order_service::update_order_status(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: "Entregue".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let err = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Enviado".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn orders_by_user_are_listed_in_creation_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let mut created = Vec::new();
    for quantity in 1..=3 {
        let order = order_service::create_order(&state, &customer, order_request(pizza, quantity))
            .await?
            .into_data()
            .expect("order")
            .order;
        created.push(order.id);
    }

    let listed: Vec<Uuid> = order_service::get_orders_by_user(&state, &customer, customer.user_id)
        .await?
        .into_data()
        .expect("orders")
        .items
        .into_iter()
        .map(|order| order.id)
        .collect();
    assert_eq!(listed, created);

    let err = order_service::get_orders_by_user(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    Ok(())
}

#[tokio::test]
async fn deliveries_for_unknown_orders_are_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let err = delivery_service::create_delivery(&state, &admin, delivery_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;
    let err = delivery_service::get_delivery_by_order(&state, &admin, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

    // The failed creation above must not have touched any order.
    let fetched = order_service::get_order(&state, &customer, order.id)
        .await?
        .into_data()
        .expect("order");
    assert_eq!(fetched.order.status, OrderStatus::Pending);

    Ok(())
}

#[tokio::test]
async fn cancelled_delivery_cancels_order_and_preparing_keeps_it() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;
    let delivery_id = delivery_service::create_delivery(&state, &admin, delivery_request(order.id))
        .await?
        .into_data()
        .expect("delivery")
        .delivery
        .id;

    let on_route = set_delivery_status(&state, &admin, delivery_id, "Em rota").await?;
    assert_eq!(on_route.order.order.status, OrderStatus::OutForDelivery);

    // Moving the delivery back to preparation leaves the order alone.
    let preparing = set_delivery_status(&state, &admin, delivery_id, "Em preparo").await?;
    assert_eq!(preparing.delivery.status, DeliveryStatus::Preparing);
    assert_eq!(preparing.order.order.status, OrderStatus::OutForDelivery);

    let cancelled = set_delivery_status(&state, &admin, delivery_id, "Cancelado").await?;
    assert_eq!(cancelled.delivery.status, DeliveryStatus::Cancelled);
    assert!(cancelled.delivery.end_time.is_none());
    assert_eq!(cancelled.order.order.status, OrderStatus::Cancelled);

    Ok(())
}

#[tokio::test]
async fn values_beyond_stored_precision_are_bad_requests() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let admin = create_user(&state, UserRole::Admin).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let err = order_service::create_order(&state, &customer, order_request(pizza, 1_000_000_000))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    for price in [Decimal::new(1, 3), Decimal::new(1_000_000_000, 0)] {
        let err = pizza_service::create_pizza(
            &state,
            &admin,
            CreatePizzaRequest {
                name: format!("Calabresa {}", Uuid::new_v4()),
                ingredients: vec!["calabresa".into()],
                price,
                category: PizzaCategory::Traditional,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "price {price}: got {err:?}");
    }

    Ok(())
}

#[tokio::test]
async fn empty_observations_clear_them() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::User).await?;
    let pizza = create_pizza(&state, Decimal::new(3590, 2)).await?;

    let order = order_service::create_order(&state, &customer, order_request(pizza, 1))
        .await?
        .into_data()
        .expect("order")
        .order;
    assert_eq!(order.observations.as_deref(), Some("sem cebola"));

    let updated = order_service::update_order(
        &state,
        &customer,
        order.id,
        UpdateOrderRequest {
            observations: Some(String::new()),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("order");
    assert_eq!(updated.order.observations, None);

    Ok(())
}
