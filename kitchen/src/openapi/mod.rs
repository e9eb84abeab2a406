//! OpenAPI documentation for the admin API at `/admin/api/v1/*`.
//!
//! The document is served as JSON at `/admin/openapi.json` and rendered with Scalar at
//! `/admin/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Session cookie scheme used by every admin endpoint.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "kitchen_session",
                    "Session cookie set by `POST /accounts/login/`. The cook must be a superuser.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kitchen Admin API",
        description = "Superuser CRUD over cooks, dish types and dishes."
    ),
    servers(
        (url = "/admin/api/v1", description = "Admin API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::admin::cooks::list_cooks,
        api::handlers::admin::cooks::list_cook_filters,
        api::handlers::admin::cooks::get_cook,
        api::handlers::admin::cooks::create_cook,
        api::handlers::admin::cooks::update_cook,
        api::handlers::admin::cooks::delete_cook,
        api::handlers::admin::dish_types::list_dish_types,
        api::handlers::admin::dish_types::get_dish_type,
        api::handlers::admin::dish_types::create_dish_type,
        api::handlers::admin::dish_types::update_dish_type,
        api::handlers::admin::dish_types::delete_dish_type,
        api::handlers::admin::dishes::list_dishes,
        api::handlers::admin::dishes::list_dish_filters,
        api::handlers::admin::dishes::get_dish,
        api::handlers::admin::dishes::create_dish,
        api::handlers::admin::dishes::update_dish,
        api::handlers::admin::dishes::delete_dish,
    ),
    components(
        schemas(
            api::models::cooks::CookCreate,
            api::models::cooks::CookUpdate,
            api::models::cooks::CookResponse,
            api::models::dish_types::DishTypeCreate,
            api::models::dish_types::DishTypeResponse,
            api::models::dishes::DishCreate,
            api::models::dishes::DishResponse,
            api::models::admin::ListFilter,
            api::models::admin::FilterChoice,
            api::models::forms::FieldErrors,
            api::models::pagination::PaginatedResponse<api::models::cooks::CookResponse>,
            api::models::pagination::PaginatedResponse<api::models::dish_types::DishTypeResponse>,
            api::models::pagination::PaginatedResponse<api::models::dishes::DishResponse>,
        )
    ),
    tags(
        (name = "cooks", description = "Cook accounts and their experience"),
        (name = "dish-types", description = "Dish categories"),
        (name = "dishes", description = "Menu items and the cooks assigned to them"),
    )
)]
pub struct AdminApiDoc;
