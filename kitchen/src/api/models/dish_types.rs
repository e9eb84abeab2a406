//! API request/response models for dish types.

use super::forms::{
    BoundForm, FieldErrors, FormData, FormField, Widget, clean_required_text, search_term, validate_required_text,
};
use super::pagination::Pagination;
use crate::db::models::dish_types::{DishTypeCreateDBRequest, DishTypeDBResponse, DishTypeUpdateDBRequest};
use crate::types::DishTypeId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const NAME_MAX_LENGTH: usize = 255;

/// Search box of the dish type list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishTypeSearch {
    pub name: Option<String>,
    pub page: Option<String>,
}

impl DishTypeSearch {
    pub fn term(&self) -> Option<String> {
        search_term(self.name.as_deref(), NAME_MAX_LENGTH)
    }
}

#[derive(Debug, Clone)]
pub struct DishTypeForm {
    pub name: String,
}

impl DishTypeForm {
    pub fn fields() -> Vec<FormField> {
        vec![FormField::new("name", "Name", Widget::Text).required()]
    }

    pub fn initial(dish_type: &DishTypeDBResponse) -> BoundForm {
        let mut initial = FormData::default();
        initial.push("name", dish_type.name.as_str());
        BoundForm::new(Self::fields()).bind(&initial)
    }

    pub fn clean(data: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = clean_required_text(data, "name", NAME_MAX_LENGTH, &mut errors);
        errors.into_result(Self { name })
    }
}

impl From<DishTypeForm> for DishTypeCreateDBRequest {
    fn from(form: DishTypeForm) -> Self {
        Self { name: form.name }
    }
}

impl From<DishTypeForm> for DishTypeUpdateDBRequest {
    fn from(form: DishTypeForm) -> Self {
        Self { name: form.name }
    }
}

// Admin API request models

/// Body for creating or replacing a dish type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DishTypeCreate {
    pub name: String,
}

impl DishTypeCreate {
    pub fn clean(self) -> Result<DishTypeForm, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim().to_string();
        validate_required_text("name", &name, NAME_MAX_LENGTH, &mut errors);
        errors.into_result(DishTypeForm { name })
    }
}

pub type DishTypeUpdate = DishTypeCreate;

/// Query parameters for the admin dish type list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListDishTypesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

// Admin API response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DishTypeResponse {
    pub id: DishTypeId,
    pub name: String,
}

impl From<DishTypeDBResponse> for DishTypeResponse {
    fn from(db: DishTypeDBResponse) -> Self {
        Self { id: db.id, name: db.name }
    }
}
