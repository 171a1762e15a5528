use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::require_length,
    entity::sea_orm_active_enums::PizzaCategory,
    error::{AppError, AppResult},
    models::Pizza,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePizzaRequest {
    pub name: String,
    pub ingredients: Vec<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub category: PizzaCategory,
}

impl CreatePizzaRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_length("name", &self.name, 3, 100)?;
        validate_ingredients(&self.ingredients)?;
        validate_price(self.price)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePizzaRequest {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    pub category: Option<PizzaCategory>,
}

impl UpdatePizzaRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_length("name", name, 3, 100)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_ingredients(ingredients)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

fn validate_ingredients(ingredients: &[String]) -> AppResult<()> {
    if ingredients.is_empty() {
        return Err(AppError::BadRequest(
            "ingredients must contain at least one item".into(),
        ));
    }
    if ingredients.iter().any(|i| i.trim().is_empty()) {
        return Err(AppError::BadRequest("ingredients must not be blank".into()));
    }
    Ok(())
}

/// Prices are stored as NUMERIC(10, 2).
fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("price must be positive".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::BadRequest(
            "price must have at most 2 decimal places".into(),
        ));
    }
    if price >= Decimal::new(100_000_000, 0) {
        return Err(AppError::BadRequest(
            "price must be less than 100000000".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, ToSchema)]
pub struct PizzaList {
    pub items: Vec<Pizza>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn price_must_be_positive() {
        let req = CreatePizzaRequest {
            name: "Margherita".into(),
            ingredients: vec!["mussarela".into(), "tomate".into(), "manjericão".into()],
            price: dec("0"),
            category: PizzaCategory::Traditional,
        };
        assert!(req.validate().is_err());

        let req = CreatePizzaRequest { price: dec("35.90"), ..req };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn price_must_fit_the_stored_precision() {
        let req = UpdatePizzaRequest {
            price: Some(dec("0.001")),
            ..Default::default()
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "price must have at most 2 decimal places");

        let req = UpdatePizzaRequest {
            price: Some(dec("1000000000")),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));

        let req = UpdatePizzaRequest {
            price: Some(dec("99999999.99")),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        let req = UpdatePizzaRequest {
            price: Some(dec("35.900")),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_ingredients_are_rejected() {
        let req = UpdatePizzaRequest {
            ingredients: Some(vec![]),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn category_uses_wire_literals() {
        let req: CreatePizzaRequest = serde_json::from_str(
            r#"{"name":"Brigadeiro","ingredients":["chocolate"],"price":42.5,"category":"Doce"}"#,
        )
        .unwrap();
        assert_eq!(req.category, PizzaCategory::Sweet);
        assert_eq!(req.price, dec("42.5"));

        let bad = serde_json::from_str::<CreatePizzaRequest>(
            r#"{"name":"Brigadeiro","ingredients":["chocolate"],"price":42.5,"category":"Sweet"}"#,
        );
        assert!(bad.is_err());
    }
}
