//! Database models for dish types.

use crate::types::DishTypeId;
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DishTypeCreateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DishTypeUpdateDBRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DishTypeDBResponse {
    pub id: DishTypeId,
    pub name: String,
}
