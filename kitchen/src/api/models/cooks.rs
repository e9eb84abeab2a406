//! API request/response models for cooks.

use super::forms::{
    BoundForm, FieldErrors, FormData, FormField, Widget, clean_integer, clean_optional_text, search_term,
    validate_no_null_characters, validate_range, validate_required_text, validate_text, REQUIRED,
};
use super::pagination::Pagination;
use crate::auth::password::password_policy_errors;
use crate::config::PasswordConfig;
use crate::db::models::cooks::CookDBResponse;
use crate::types::CookId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const MIN_EXPERIENCE: i32 = 0;
pub const MAX_EXPERIENCE: i32 = 50;

pub const PASSWORD_MISMATCH: &str = "The two password fields didn’t match.";
const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const INVALID_EMAIL: &str = "Enter a valid email address.";

/// The cook making the request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: CookId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<CookDBResponse> for CurrentUser {
    fn from(db: CookDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            is_staff: db.is_staff,
            is_superuser: db.is_superuser,
        }
    }
}

/// A cook as shown in lists and on detail pages.
#[derive(Debug, Clone, Serialize)]
pub struct CookSummary {
    pub id: CookId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub years_of_experience: i32,
    pub full_name: String,
}

impl From<CookDBResponse> for CookSummary {
    fn from(db: CookDBResponse) -> Self {
        Self {
            full_name: db.full_name(),
            id: db.id,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            email: db.email,
            years_of_experience: db.years_of_experience,
        }
    }
}

pub fn validate_username(field: &str, username: &str, errors: &mut FieldErrors) {
    validate_required_text(field, username, USERNAME_MAX_LENGTH, errors);
    if !username.is_empty() && !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        errors.add(field, INVALID_USERNAME);
    }
}

/// Optional email: empty passes, anything else needs a `local@domain.tld` shape.
pub fn validate_email(field: &str, email: &str, errors: &mut FieldErrors) {
    if email.is_empty() {
        return;
    }
    if !validate_no_null_characters(field, email, errors) {
        return;
    }
    validate_text(field, email, Some(EMAIL_MAX_LENGTH), errors);
    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add(field, INVALID_EMAIL);
    }
}

pub fn validate_experience(field: &str, years: i32, errors: &mut FieldErrors) {
    validate_range(field, years, MIN_EXPERIENCE, MAX_EXPERIENCE, errors);
}

/// Search box of the cook list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CookSearch {
    pub username: Option<String>,
    pub page: Option<String>,
}

impl CookSearch {
    /// The username filter, or `None` when blank or unusable as a username.
    pub fn term(&self) -> Option<String> {
        search_term(self.username.as_deref(), USERNAME_MAX_LENGTH)
    }
}

/// Sign-up form for a new cook.
#[derive(Debug, Clone)]
pub struct CookCreateForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub years_of_experience: i32,
    pub password: String,
}

impl CookCreateForm {
    pub fn fields() -> Vec<FormField> {
        vec![
            FormField::new("username", "Username", Widget::Text)
                .required()
                .help("Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only."),
            FormField::new("password1", "Password", Widget::Password).required(),
            FormField::new("password2", "Password confirmation", Widget::Password)
                .required()
                .help("Enter the same password as before, for verification."),
            FormField::new("first_name", "First name", Widget::Text),
            FormField::new("last_name", "Last name", Widget::Text),
            FormField::new("email", "Email address", Widget::Email),
            FormField::new("years_of_experience", "Years of experience", Widget::Number).required(),
        ]
    }

    pub fn form() -> BoundForm {
        let mut initial = FormData::default();
        initial.push("years_of_experience", "0");
        BoundForm::new(Self::fields()).bind(&initial)
    }

    /// Validate a submission. Password policy failures are reported on `password2`.
    pub fn clean(data: &FormData, policy: &PasswordConfig) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let username = data.value("username").unwrap_or_default().trim().to_string();
        validate_username("username", &username, &mut errors);
        let first_name = clean_optional_text(data, "first_name", Some(NAME_MAX_LENGTH), &mut errors);
        let last_name = clean_optional_text(data, "last_name", Some(NAME_MAX_LENGTH), &mut errors);
        let email = data.value("email").unwrap_or_default().trim().to_string();
        validate_email("email", &email, &mut errors);

        let years_of_experience = clean_integer(data, "years_of_experience", &mut errors);
        if let Some(years) = years_of_experience {
            validate_experience("years_of_experience", years, &mut errors);
        }

        let password1 = data.value("password1").unwrap_or_default();
        let password2 = data.value("password2").unwrap_or_default();
        if password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        let storable = validate_no_null_characters("password1", password1, &mut errors)
            & validate_no_null_characters("password2", password2, &mut errors);
        if storable && !password1.is_empty() && !password2.is_empty() {
            if password1 != password2 {
                errors.add("password2", PASSWORD_MISMATCH);
            } else {
                for message in password_policy_errors(password2, &username, policy) {
                    errors.add("password2", message);
                }
            }
        }

        errors.into_result(Self {
            username,
            first_name,
            last_name,
            email,
            years_of_experience: years_of_experience.unwrap_or_default(),
            password: password1.to_string(),
        })
    }
}

/// The one-field form that changes a cook's experience.
#[derive(Debug, Clone, Copy)]
pub struct CookExperienceForm {
    pub years_of_experience: i32,
}

impl CookExperienceForm {
    pub fn fields() -> Vec<FormField> {
        vec![FormField::new("years_of_experience", "Years of experience", Widget::Number).required()]
    }

    pub fn initial(cook: &CookDBResponse) -> BoundForm {
        let mut initial = FormData::default();
        initial.push("years_of_experience", cook.years_of_experience.to_string());
        BoundForm::new(Self::fields()).bind(&initial)
    }

    pub fn clean(data: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let years = clean_integer(data, "years_of_experience", &mut errors);
        if let Some(years) = years {
            validate_experience("years_of_experience", years, &mut errors);
        }
        errors.into_result(Self {
            years_of_experience: years.unwrap_or_default(),
        })
    }
}

// Admin API request models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CookCreate {
    pub username: String,
    /// Raw password, hashed before storage
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub years_of_experience: i32,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl CookCreate {
    /// Validate the body and return it with surrounding whitespace trimmed.
    pub fn clean(mut self, policy: &PasswordConfig) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();

        validate_username("username", &self.username, &mut errors);
        validate_text("first_name", &self.first_name, Some(NAME_MAX_LENGTH), &mut errors);
        validate_text("last_name", &self.last_name, Some(NAME_MAX_LENGTH), &mut errors);
        validate_email("email", &self.email, &mut errors);
        validate_experience("years_of_experience", self.years_of_experience, &mut errors);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        } else if validate_no_null_characters("password", &self.password, &mut errors) {
            for message in password_policy_errors(&self.password, &self.username, policy) {
                errors.add("password", message);
            }
        }

        errors.into_result(self)
    }
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CookUpdate {
    pub username: Option<String>,
    /// New raw password, hashed before storage
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub years_of_experience: Option<i32>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

impl CookUpdate {
    /// Validate the fields present. `current_username` is used by the password policy when the
    /// username is not being changed.
    pub fn clean(mut self, current_username: &str, policy: &PasswordConfig) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();

        let trim = |value: &mut Option<String>| {
            if let Some(v) = value {
                *v = v.trim().to_string();
            }
        };
        trim(&mut self.username);
        trim(&mut self.first_name);
        trim(&mut self.last_name);
        trim(&mut self.email);

        if let Some(username) = &self.username {
            validate_username("username", username, &mut errors);
        }
        if let Some(first_name) = &self.first_name {
            validate_text("first_name", first_name, Some(NAME_MAX_LENGTH), &mut errors);
        }
        if let Some(last_name) = &self.last_name {
            validate_text("last_name", last_name, Some(NAME_MAX_LENGTH), &mut errors);
        }
        if let Some(email) = &self.email {
            validate_email("email", email, &mut errors);
        }
        if let Some(years) = self.years_of_experience {
            validate_experience("years_of_experience", years, &mut errors);
        }
        if let Some(password) = &self.password {
            let username = self.username.as_deref().unwrap_or(current_username);
            if password.is_empty() {
                errors.add("password", REQUIRED);
            }
            if validate_no_null_characters("password", password, &mut errors) {
                for message in password_policy_errors(password, username, policy) {
                    errors.add("password", message);
                }
            }
        }

        errors.into_result(self)
    }
}

/// Query parameters for the admin cook list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListCooksQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring of the last name
    pub q: Option<String>,

    /// Experience bucket: 5, 10, 15 or 20, see `GET /cooks/filters`
    pub year: Option<String>,
}

impl ListCooksQuery {
    /// The `q` filter, or `None` when blank or unusable as a last name.
    pub fn term(&self) -> Option<String> {
        search_term(self.q.as_deref(), NAME_MAX_LENGTH)
    }
}

// Admin API response models

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CookResponse {
    pub id: CookId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub years_of_experience: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl From<CookDBResponse> for CookResponse {
    fn from(db: CookDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            email: db.email,
            years_of_experience: db.years_of_experience,
            is_staff: db.is_staff,
            is_superuser: db.is_superuser,
            is_active: db.is_active,
            last_login: db.last_login,
            date_joined: db.date_joined,
        }
    }
}
