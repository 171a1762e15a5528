use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub pizza_id: Uuid,
    pub position: i32,
    pub quantity: i32,
    /// Catalog price at the time the order was placed.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub unit_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_delete = "Cascade"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::pizzas::Entity",
        from = "Column::PizzaId",
        to = "super::pizzas::Column::Id"
    )]
    Pizzas,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::pizzas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pizzas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
