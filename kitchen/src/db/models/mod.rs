//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each response struct matches a table row and derives `sqlx::FromRow`
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//! - **Ids**: Primary keys use the aliases in [`crate::types`]
//!
//! # Models
//!
//! - [`cooks`]: Cook accounts, their credentials and experience
//! - [`dish_types`]: Dish categories
//! - [`dishes`]: Menu items, their category and their assigned cooks
//!
//! # Conversion to API Models
//!
//! Cook and dish type API models implement `From<...DBResponse>`. A dish response also
//! needs its assigned cooks, which live in a join table:
//!
//! ```ignore
//! use kitchen::api::models::{cooks::CookResponse, dishes::DishResponse};
//!
//! let api_cook: CookResponse = cooks.get_by_id(cook_id).await?.unwrap().into();
//!
//! let db_dish = dishes.get_by_id(dish_id).await?.unwrap();
//! let cook_ids = dishes.cook_ids(dish_id).await?;
//! let api_dish = DishResponse::new(db_dish, cook_ids);
//! ```

pub mod cooks;
pub mod dish_types;
pub mod dishes;

/// Lowercase a catalog name, then capitalize its first character.
///
/// `"BORSCHT soup"` becomes `"Borscht soup"`. Applied to dish type and dish names when
/// `catalog.normalize_names` is enabled.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
