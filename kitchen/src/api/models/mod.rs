//! API request and response data models.
//!
//! The HTML views and the admin API share these types. Form submissions are cleaned into typed
//! values here; anything that needs the database (uniqueness, whether a referenced row
//! exists) is checked by the handlers.
//!
//! # Model Categories
//!
//! ## Resource Models
//!
//! - [`cooks`]: Cook accounts, sign-up and experience forms, admin payloads
//! - [`dish_types`]: Dish categories
//! - [`dishes`]: Menu items with price, category and assigned cooks
//!
//! ## Shared
//!
//! - [`forms`]: Form data, field errors and rendering descriptions
//! - [`pagination`]: Page-numbered lists and offset pagination for the admin API
//! - [`admin`]: Typed admin list filters
//! - [`auth`]: Login form

pub mod admin;
pub mod auth;
pub mod cooks;
pub mod dish_types;
pub mod dishes;
pub mod forms;
pub mod pagination;
