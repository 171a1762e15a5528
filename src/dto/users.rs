use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{is_valid_email, require_length},
    entity::sea_orm_active_enums::UserRole,
    error::{AppError, AppResult},
    models::User,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    /// Only honored for admins.
    pub role: Option<UserRole>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_length("name", name, 3, 100)?;
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(AppError::BadRequest("email must be a valid email".into()));
            }
        }
        if let Some(password) = &self.password {
            if password.chars().count() < 6 {
                return Err(AppError::BadRequest(
                    "password must be at least 6 characters".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
