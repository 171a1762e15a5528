use pizza_delivery_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        pizzas::{ActiveModel as PizzaActive, Column as PizzaCol, Entity as Pizzas},
        sea_orm_active_enums::{PizzaCategory, UserRole},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pizza_delivery_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_admin(&orm, &config.admin_email, &config.admin_password).await?;
    let inserted = seed_pizzas(&orm).await?;

    tracing::info!(%admin_id, pizzas_inserted = inserted, "seed completed");
    Ok(())
}

/// Creates the administrator account, or promotes an existing account with that email.
async fn ensure_admin(orm: &OrmConn, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let email = email.trim().to_lowercase();
    let existing = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(orm)
        .await?;

    if let Some(user) = existing {
        if user.role != UserRole::Admin {
            let mut active: UserActive = user.clone().into();
            active.role = Set(UserRole::Admin);
            active.update(orm).await?;
            tracing::info!(user_id = %user.id, "promoted existing account to admin");
        }
        return Ok(user.id);
    }

    let password_hash = hash_password(password)?;
    let admin = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set("Administrador".into()),
        email: Set(email),
        password_hash: Set(password_hash),
        phone: Set("11999999999".into()),
        role: Set(UserRole::Admin),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "admin created");
    Ok(admin.id)
}

async fn seed_pizzas(orm: &OrmConn) -> anyhow::Result<u64> {
    let pizzas = [
        (
            "Margherita",
            &["molho de tomate", "mussarela", "manjericão"][..],
            Decimal::new(3590, 2),
            PizzaCategory::Traditional,
        ),
        (
            "Calabresa",
            &["molho de tomate", "mussarela", "calabresa", "cebola"][..],
            Decimal::new(3890, 2),
            PizzaCategory::Traditional,
        ),
        (
            "Quatro Queijos",
            &["mussarela", "provolone", "parmesão", "gorgonzola"][..],
            Decimal::new(4590, 2),
            PizzaCategory::Premium,
        ),
        (
            "Chocolate com Morango",
            &["chocolate ao leite", "morango"][..],
            Decimal::new(4290, 2),
            PizzaCategory::Sweet,
        ),
    ];

    let mut inserted = 0;
    for (name, ingredients, price, category) in pizzas {
        let active = PizzaActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            ingredients: Set(ingredients.iter().map(|i| i.to_string()).collect()),
            price: Set(price),
            category: Set(category),
            created_at: NotSet,
        };
        inserted += Pizzas::insert(active)
            .on_conflict(OnConflict::column(PizzaCol::Name).do_nothing().to_owned())
            .exec_without_returning(orm)
            .await?;
    }

    Ok(inserted)
}
