//! Common type definitions shared across the crate.
//!
//! # ID Types
//!
//! Entity ids are `BIGSERIAL` primary keys, wrapped in type aliases so signatures say which table
//! they point into:
//!
//! - [`CookId`]: Cook account identifier
//! - [`DishTypeId`]: Dish category identifier
//! - [`DishId`]: Menu item identifier
//!
//! [`Resource`] names an entity kind in errors and log lines.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Type aliases for IDs
pub type CookId = i64;
pub type DishTypeId = i64;
pub type DishId = i64;

/// The kinds of entity managed by the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Cook,
    DishType,
    Dish,
}

impl Resource {
    /// Human readable singular name, as shown in page titles.
    pub fn verbose_name(&self) -> &'static str {
        match self {
            Resource::Cook => "cook",
            Resource::DishType => "dish type",
            Resource::Dish => "dish",
        }
    }

    /// Human readable plural name.
    pub fn verbose_name_plural(&self) -> &'static str {
        match self {
            Resource::Cook => "cooks",
            Resource::DishType => "dish types",
            Resource::Dish => "dishes",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Cook => write!(f, "Cook"),
            Resource::DishType => write!(f, "Dish type"),
            Resource::Dish => write!(f, "Dish"),
        }
    }
}
