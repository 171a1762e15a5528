use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{orders::OrderWithItems, require_positive, require_present},
    error::AppResult,
    models::Delivery,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeliveryRequest {
    pub order: Uuid,
    pub delivery_person: String,
    /// Minutes.
    pub estimated_time: i32,
    pub notes: Option<String>,
}

impl CreateDeliveryRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_present("deliveryPerson", &self.delivery_person)?;
        require_positive("estimatedTime", self.estimated_time)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliveryRequest {
    pub delivery_person: Option<String>,
    pub status: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
    pub estimated_time: Option<i32>,
    /// An empty string clears the notes.
    pub notes: Option<String>,
}

impl UpdateDeliveryRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(person) = &self.delivery_person {
            require_present("deliveryPerson", person)?;
        }
        if let Some(estimated_time) = self.estimated_time {
            require_positive("estimatedTime", estimated_time)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryWithOrder {
    pub delivery: Delivery,
    pub order: OrderWithItems,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryList {
    pub items: Vec<Delivery>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimated_time_must_be_positive() {
        let mut req = CreateDeliveryRequest {
            order: Uuid::new_v4(),
            delivery_person: "João".into(),
            estimated_time: 0,
            notes: None,
        };
        assert!(req.validate().is_err());
        req.estimated_time = 45;
        assert!(req.validate().is_ok());

        let patch = UpdateDeliveryRequest {
            estimated_time: Some(-5),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn camel_case_wire_names() {
        let req: UpdateDeliveryRequest = serde_json::from_str(
            r#"{"deliveryPerson":"Ana","estimatedTime":30,"status":"Em rota"}"#,
        )
        .unwrap();
        assert_eq!(req.delivery_person.as_deref(), Some("Ana"));
        assert_eq!(req.estimated_time, Some(30));
        assert_eq!(req.status.as_deref(), Some("Em rota"));
    }
}
