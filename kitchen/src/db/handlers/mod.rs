//! Repository implementations for database access.
//!
//! This module provides repository structs for each table of the back office.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Cooks`]: Cook accounts, credentials and experience
//! - [`DishTypes`]: Dish categories
//! - [`Dishes`]: Menu items and their cook assignments
//!
//! # Common Pattern
//!
//! ```ignore
//! use kitchen::db::handlers::{Dishes, Repository, dishes::DishFilter};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Dishes::new(&mut conn);
//!
//!     let filter = DishFilter::new(0, 5).with_name(Some("soup".to_string()));
//!     let dishes = repo.list(&filter).await?;
//!     let total = repo.count(&filter).await?;
//!     Ok(())
//! }
//! ```
//!
//! Every list is returned in the entity's default order: case-insensitive by username or
//! name, ties broken by id so pages are stable.

pub mod cooks;
pub mod dish_types;
pub mod dishes;
pub mod repository;

pub use cooks::Cooks;
pub use dish_types::DishTypes;
pub use dishes::Dishes;
pub use repository::Repository;

/// Build an `ILIKE` pattern matching `search` anywhere in the column, with the LIKE
/// metacharacters of `search` escaped.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Treat blank search input as no search at all.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
