use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{is_valid_email, normalize_phone, require_length},
    error::{AppError, AppResult},
    models::User,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

impl RegisterRequest {
    /// Validates the payload and returns the normalized phone number.
    pub fn validate(&self) -> AppResult<String> {
        require_length("name", &self.name, 3, 100)?;
        if !is_valid_email(&self.email) {
            return Err(AppError::BadRequest("email must be a valid email".into()));
        }
        if self.password.chars().count() < 6 {
            return Err(AppError::BadRequest(
                "password must be at least 6 characters".into(),
            ));
        }
        normalize_phone(&self.phone)
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
