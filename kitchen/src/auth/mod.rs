//! Authentication and authorization.
//!
//! Cooks log in with a username and password on `/accounts/login/`. A successful login sets an
//! HttpOnly cookie holding a signed JWT ([`session`]) that names the cook. Every back-office
//! page sits behind [`middleware::login_required`], which resolves that cookie to a live cook
//! row and otherwise redirects to the login page with the requested URL as `next`.
//!
//! The admin API is restricted further: handlers take a
//! [`current_user::Superuser`] extractor, which rejects anonymous callers with `401` and
//! cooks without the superuser flag with `403`.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for the authenticated cook in handlers
//! - [`middleware`]: Login gate for the HTML routes
//! - [`password`]: Argon2 hashing, verification and the password policy for new cooks
//! - [`session`]: JWT session token creation and verification
//! - [`utils`]: Login URLs and redirect-target checks
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use kitchen::api::models::cooks::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.username)
//! }
//! ```

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
pub mod utils;
