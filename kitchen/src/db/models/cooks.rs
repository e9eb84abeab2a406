//! Database models for cooks.

use crate::types::CookId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new cook
#[derive(Debug, Clone)]
pub struct CookCreateDBRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 PHC string, never the raw password
    pub password_hash: String,
    pub years_of_experience: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Database request for updating a cook. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CookUpdateDBRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub years_of_experience: Option<i32>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl CookUpdateDBRequest {
    /// An update that only touches `years_of_experience`.
    pub fn experience(years: i32) -> Self {
        Self {
            years_of_experience: Some(years),
            ..Default::default()
        }
    }
}

/// Database response for a cook
#[derive(Debug, Clone, FromRow)]
pub struct CookDBResponse {
    pub id: CookId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub years_of_experience: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl CookDBResponse {
    /// First and last name joined by a space, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
