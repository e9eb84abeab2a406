//! PostgreSQL storage for the back office.
//!
//! Handlers never write SQL themselves. They open a connection from the pool, wrap it in one
//! of the repositories from [`handlers`] and get rows back as the structs in [`models`].
//! Storage failures come back as [`errors::DbError`].
//!
//! ```ignore
//! use kitchen::db::handlers::{Cooks, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! if let Some(cook) = Cooks::new(&mut conn).get_by_username("gordon").await? {
//!     println!("{} has {} years of experience", cook.username, cook.years_of_experience);
//! }
//! ```
//!
//! Repositories take a `&mut PgConnection`, so the same code runs on a pooled connection or
//! inside a caller's transaction. Writes that touch `dishes_cooks` open their own transaction,
//! which nests as a savepoint when the caller already has one.
//!
//! Cascades are declared in the schema: removing a dish type removes its dishes, removing a
//! dish or a cook removes their assignments only. The schema lives in `migrations/` and is
//! applied by [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
