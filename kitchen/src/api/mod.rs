//! HTTP layer: request handlers and the models they exchange.
//!
//! - **[`handlers`]**: Axum route handlers for the pages and the admin API
//! - **[`models`]**: Forms, list queries and JSON bodies
//!
//! # Routes
//!
//! - **Pages** (`/`, `/dish-types/`, `/dishes/`, `/cooks/`): server-rendered HTML, login required
//! - **Accounts** (`/accounts/login/`, `/accounts/logout/`): session cookie management
//! - **Admin API** (`/admin/api/v1/*`): JSON CRUD for superusers
//!
//! The admin API is documented with `utoipa`; the document is served at `/admin/openapi.json`
//! and browsable at `/admin/docs`.

pub mod handlers;
pub mod models;
