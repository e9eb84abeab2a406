//! JSON CRUD for superusers, mounted under `/admin/api/v1`.
//!
//! Every handler takes the [`crate::auth::current_user::Superuser`] extractor. Bodies are
//! cleaned with the same rules as the HTML forms; failures come back as `422` with the field
//! errors, and a clash with an existing username or name as `409`.
//!
//! The list endpoints are offset-paginated with `skip` and `limit`. The cook and dish lists
//! also take a search term `q` and one categorical filter each, described by their
//! `/filters` endpoints.

pub mod cooks;
pub mod dish_types;
pub mod dishes;

use crate::{
    api::{
        handlers::validation::{COOK_USERNAME_TAKEN, DISH_NAME_TAKEN, DISH_TYPE_NAME_TAKEN},
        models::forms::FieldErrors,
    },
    db::errors::DbError,
    errors::Error,
    types::Resource,
};

/// Turn the field errors of a rejected body into a response error.
///
/// Errors made only of uniqueness clashes are a conflict, anything else is a validation failure.
pub(crate) fn rejected(errors: FieldErrors) -> Error {
    let taken = [COOK_USERNAME_TAKEN, DISH_TYPE_NAME_TAKEN, DISH_NAME_TAKEN];
    if errors.messages().all(|message| taken.contains(&message))
        && let Some(message) = errors.messages().next()
    {
        return Error::Conflict {
            message: message.to_string(),
        };
    }
    Error::Validation { errors }
}

/// A missing row on update becomes a 404 naming the resource.
pub(crate) fn missing(resource: Resource, id: i64) -> impl FnOnce(DbError) -> Error {
    move |err| match err {
        DbError::NotFound => Error::not_found(resource, id),
        err => Error::Database(err),
    }
}
