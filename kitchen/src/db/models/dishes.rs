//! Database models for dishes and their cook assignments.

use crate::types::{CookId, DishId, DishTypeId};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database request for creating a dish together with its cook set
#[derive(Debug, Clone)]
pub struct DishCreateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub dish_type_id: DishTypeId,
    pub cook_ids: Vec<CookId>,
}

/// Database request for updating a dish. Every column is replaced, and the cook set is
/// replaced with `cook_ids`.
#[derive(Debug, Clone)]
pub struct DishUpdateDBRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub dish_type_id: DishTypeId,
    pub cook_ids: Vec<CookId>,
}

/// Database response for a dish, joined with the name of its dish type
#[derive(Debug, Clone, FromRow)]
pub struct DishDBResponse {
    pub id: DishId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub dish_type_id: DishTypeId,
    pub dish_type_name: String,
}

/// Outcome of flipping a cook's assignment to a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Assigned,
    Removed,
}
