//! API request/response models for dishes.

use super::forms::{
    BoundForm, Choice, FieldErrors, FormData, FormField, Widget, clean_choice, clean_decimal, clean_multiple_choice,
    clean_optional_text, clean_required_text, search_term, validate_decimal, validate_required_text, validate_text,
    REQUIRED,
};
use super::pagination::Pagination;
use crate::db::models::{
    cooks::CookDBResponse,
    dish_types::DishTypeDBResponse,
    dishes::{DishCreateDBRequest, DishDBResponse, DishUpdateDBRequest},
};
use crate::types::{CookId, DishId, DishTypeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const NAME_MAX_LENGTH: usize = 100;
pub const PRICE_MAX_DIGITS: u32 = 6;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Search box of the dish list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishSearch {
    pub name: Option<String>,
    pub page: Option<String>,
}

impl DishSearch {
    pub fn term(&self) -> Option<String> {
        search_term(self.name.as_deref(), NAME_MAX_LENGTH)
    }
}

/// A cleaned dish submission. Whether `dish_type_id` and `cook_ids` exist is checked against
/// the database by the handler.
#[derive(Debug, Clone)]
pub struct DishForm {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub dish_type_id: DishTypeId,
    pub cook_ids: Vec<CookId>,
}

impl DishForm {
    /// Form fields with the dish type dropdown and the cook checkboxes filled from every
    /// existing row.
    pub fn fields(dish_types: &[DishTypeDBResponse], cooks: &[CookDBResponse]) -> Vec<FormField> {
        let mut type_choices = vec![Choice::new("", "---------")];
        type_choices.extend(dish_types.iter().map(|t| Choice::new(t.id, t.name.as_str())));
        let cook_choices = cooks.iter().map(|c| Choice::new(c.id, c.username.as_str())).collect();

        vec![
            FormField::new("name", "Name", Widget::Text).required(),
            FormField::new("description", "Description", Widget::TextArea),
            FormField::new("price", "Price", Widget::Decimal).required(),
            FormField::new("dish_type", "Dish type", Widget::Select)
                .required()
                .choices(type_choices),
            FormField::new("cooks", "Cooks", Widget::CheckboxMultiple)
                .required()
                .choices(cook_choices),
        ]
    }

    pub fn initial(dish: &DishDBResponse, cook_ids: &[CookId]) -> FormData {
        let mut initial = FormData::default();
        initial.push("name", dish.name.as_str());
        initial.push("description", dish.description.as_str());
        initial.push("price", dish.price.to_string());
        initial.push("dish_type", dish.dish_type_id.to_string());
        for id in cook_ids {
            initial.push("cooks", id.to_string());
        }
        initial
    }

    pub fn form(dish_types: &[DishTypeDBResponse], cooks: &[CookDBResponse], data: &FormData) -> BoundForm {
        BoundForm::new(Self::fields(dish_types, cooks)).bind(data)
    }

    pub fn clean(data: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = clean_required_text(data, "name", NAME_MAX_LENGTH, &mut errors);
        let description = clean_optional_text(data, "description", None, &mut errors);
        let price = clean_decimal(data, "price", &mut errors);
        if let Some(price) = price {
            validate_decimal("price", price, PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES, &mut errors);
        }
        let dish_type_id = clean_choice(data, "dish_type", &mut errors);
        let cook_ids = clean_multiple_choice(data, "cooks", &mut errors);

        errors.into_result(Self {
            name,
            description,
            price: price.unwrap_or_default(),
            dish_type_id: dish_type_id.unwrap_or_default(),
            cook_ids,
        })
    }
}

impl From<DishForm> for DishCreateDBRequest {
    fn from(form: DishForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            price: form.price,
            dish_type_id: form.dish_type_id,
            cook_ids: form.cook_ids,
        }
    }
}

impl From<DishForm> for DishUpdateDBRequest {
    fn from(form: DishForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            price: form.price,
            dish_type_id: form.dish_type_id,
            cook_ids: form.cook_ids,
        }
    }
}

// Admin API request models

/// Body for creating or replacing a dish
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DishCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal string with at most 4 whole digits and 2 decimal places, e.g. `"88.88"`
    #[schema(value_type = String, example = "88.88")]
    pub price: Decimal,
    pub dish_type: DishTypeId,
    pub cooks: Vec<CookId>,
}

impl DishCreate {
    pub fn clean(self) -> Result<DishForm, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim().to_string();
        validate_required_text("name", &name, NAME_MAX_LENGTH, &mut errors);
        let description = self.description.trim().to_string();
        validate_text("description", &description, None, &mut errors);
        validate_decimal("price", self.price, PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES, &mut errors);
        let mut cook_ids = Vec::with_capacity(self.cooks.len());
        for id in self.cooks {
            if !cook_ids.contains(&id) {
                cook_ids.push(id);
            }
        }
        if cook_ids.is_empty() {
            errors.add("cooks", REQUIRED);
        }

        errors.into_result(DishForm {
            name,
            description,
            price: self.price,
            dish_type_id: self.dish_type,
            cook_ids,
        })
    }
}

pub type DishUpdate = DishCreate;

/// Query parameters for the admin dish list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListDishesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring of the dish name
    pub q: Option<String>,

    /// Only dishes of this dish type id
    #[serde(rename = "type")]
    pub dish_type: Option<String>,
}

impl ListDishesQuery {
    /// The `q` filter, or `None` when blank or unusable as a name.
    pub fn term(&self) -> Option<String> {
        search_term(self.q.as_deref(), NAME_MAX_LENGTH)
    }

    /// The `type` filter as an id. Blank means no filter.
    pub fn dish_type_id(&self) -> Result<Option<DishTypeId>, String> {
        match self.dish_type.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<DishTypeId>()
                .map(Some)
                .map_err(|_| format!("Invalid dish type filter: {raw}")),
        }
    }
}

// Admin API response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DishResponse {
    pub id: DishId,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "88.88")]
    pub price: Decimal,
    pub dish_type: DishTypeId,
    pub dish_type_name: String,
    pub cooks: Vec<CookId>,
}

impl DishResponse {
    pub fn new(db: DishDBResponse, cooks: Vec<CookId>) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            price: db.price,
            dish_type: db.dish_type_id,
            dish_type_name: db.dish_type_name,
            cooks,
        }
    }
}
