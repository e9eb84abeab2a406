//! Form checks that need the database.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    api::models::{
        dishes::DishForm,
        forms::{FieldErrors, INVALID_CHOICE, invalid_choice_message, validate_max_length},
    },
    config::Config,
    db::{
        errors::DbError,
        handlers::{Cooks, DishTypes, Dishes, Repository},
        models::normalize_name,
    },
    errors::{Error, Result},
    types::{CookId, DishId, DishTypeId},
};

pub const COOK_USERNAME_TAKEN: &str = "A cook with that username already exists.";
pub const DISH_TYPE_NAME_TAKEN: &str = "Dish type with this Name already exists.";
pub const DISH_NAME_TAKEN: &str = "Dish with this Name already exists.";

/// The form field and message for a unique constraint.
fn unique_field(constraint: &str) -> Option<(&'static str, &'static str)> {
    match constraint {
        "cooks_username_unique" => Some(("username", COOK_USERNAME_TAKEN)),
        "dish_types_name_unique" => Some(("name", DISH_TYPE_NAME_TAKEN)),
        "dishes_name_unique" => Some(("name", DISH_NAME_TAKEN)),
        _ => None,
    }
}

/// Turn a unique violation that slipped past the pre-check into a field error.
///
/// Any other error is passed through.
pub fn unique_violation_errors(err: DbError) -> Result<FieldErrors> {
    if let Some((field, message)) = err.unique_constraint().and_then(unique_field) {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        return Ok(errors);
    }
    Err(Error::Database(err))
}

/// Apply the configured name policy to a dish type or dish name.
///
/// Case mapping can lengthen a name, so the limit is checked on the stored form.
pub fn catalog_name(config: &Config, name: String, max_length: usize) -> std::result::Result<String, FieldErrors> {
    let name = if config.catalog.normalize_names {
        normalize_name(&name)
    } else {
        name
    };
    let mut errors = FieldErrors::default();
    validate_max_length("name", &name, max_length, &mut errors);
    errors.into_result(name)
}

#[instrument(skip(conn), err)]
pub async fn check_username(conn: &mut PgConnection, username: &str, exclude: Option<CookId>) -> Result<FieldErrors> {
    let mut errors = FieldErrors::default();
    if Cooks::new(conn).username_taken(username, exclude).await? {
        errors.add("username", COOK_USERNAME_TAKEN);
    }
    Ok(errors)
}

#[instrument(skip(conn), err)]
pub async fn check_dish_type_name(
    conn: &mut PgConnection,
    name: &str,
    exclude: Option<DishTypeId>,
) -> Result<FieldErrors> {
    let mut errors = FieldErrors::default();
    if DishTypes::new(conn).name_taken(name, exclude).await? {
        errors.add("name", DISH_TYPE_NAME_TAKEN);
    }
    Ok(errors)
}

/// Check the dish name is free and that the dish type and every cook exist.
#[instrument(skip(conn, form), fields(name = %form.name), err)]
pub async fn check_dish(conn: &mut PgConnection, form: &DishForm, exclude: Option<DishId>) -> Result<FieldErrors> {
    let mut errors = FieldErrors::default();

    if Dishes::new(&mut *conn).name_taken(&form.name, exclude).await? {
        errors.add("name", DISH_NAME_TAKEN);
    }
    if DishTypes::new(&mut *conn).get_by_id(form.dish_type_id).await?.is_none() {
        errors.add("dish_type", INVALID_CHOICE);
    }
    let cooks = Cooks::new(&mut *conn).get_bulk(form.cook_ids.clone()).await?;
    if let Some(missing) = form.cook_ids.iter().find(|id| !cooks.contains_key(id)) {
        errors.add("cooks", invalid_choice_message(missing));
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_cook, create_test_dish_type};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[test]
    fn test_catalog_name_policy() {
        let mut config = create_test_config();
        assert_eq!(catalog_name(&config, "BORSCHT soup".into(), 100).unwrap(), "BORSCHT soup");
        config.catalog.normalize_names = true;
        assert_eq!(catalog_name(&config, "BORSCHT soup".into(), 100).unwrap(), "Borscht soup");

        // dotted capital I lowercases to two characters
        let dotted = "\u{130}".repeat(255);
        let errors = catalog_name(&config, dotted.clone(), 255).unwrap_err();
        assert_eq!(
            errors.get("name"),
            ["Ensure this value has at most 255 characters (it has 510).".to_string()]
        );
        config.catalog.normalize_names = false;
        assert_eq!(catalog_name(&config, dotted.clone(), 255).unwrap(), dotted);
    }

    #[test]
    fn test_unique_violation_errors() {
        let err = DbError::UniqueViolation {
            constraint: Some("dishes_name_unique".to_string()),
            table: Some("dishes".to_string()),
            message: "duplicate key".to_string(),
        };
        let errors = unique_violation_errors(err).unwrap();
        assert_eq!(errors.get("name"), [DISH_NAME_TAKEN.to_string()]);

        assert!(unique_violation_errors(DbError::NotFound).is_err());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_check_dish_reports_missing_references(pool: PgPool) {
        let cook = create_test_cook(&pool, "gordon", false).await;
        let dish_type = create_test_dish_type(&pool, "Soup").await;
        let mut conn = pool.acquire().await.unwrap();

        let form = DishForm {
            name: "Borscht".into(),
            description: String::new(),
            price: Decimal::new(1250, 2),
            dish_type_id: dish_type.id,
            cook_ids: vec![cook.id],
        };
        assert!(check_dish(&mut conn, &form, None).await.unwrap().is_empty());

        let form = DishForm {
            dish_type_id: dish_type.id + 100,
            cook_ids: vec![cook.id, cook.id + 100],
            ..form
        };
        let errors = check_dish(&mut conn, &form, None).await.unwrap();
        assert_eq!(errors.get("dish_type"), [INVALID_CHOICE.to_string()]);
        assert_eq!(errors.get("cooks"), [invalid_choice_message(cook.id + 100)]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_check_username_excludes_self(pool: PgPool) {
        let cook = create_test_cook(&pool, "gordon", false).await;
        let mut conn = pool.acquire().await.unwrap();

        assert!(check_username(&mut conn, "gordon", None).await.unwrap().has("username"));
        assert!(check_username(&mut conn, "gordon", Some(cook.id)).await.unwrap().is_empty());
        assert!(check_dish_type_name(&mut conn, "Soup", None).await.unwrap().is_empty());
    }
}
