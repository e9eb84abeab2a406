//! Login form payloads.

use super::forms::{BoundForm, FieldErrors, FormData, FormField, Widget, validate_no_null_characters, REQUIRED};

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Credentials posted to `/accounts/login/`.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn fields() -> Vec<FormField> {
        vec![
            FormField::new("username", "Username", Widget::Text).required(),
            FormField::new("password", "Password", Widget::Password).required(),
        ]
    }

    pub fn form(data: &FormData) -> BoundForm {
        BoundForm::new(Self::fields()).bind(data)
    }

    pub fn clean(data: &FormData) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = data.value("username").unwrap_or_default().trim().to_string();
        let password = data.value("password").unwrap_or_default().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if password.is_empty() {
            errors.add("password", REQUIRED);
        }
        validate_no_null_characters("username", &username, &mut errors);
        validate_no_null_characters("password", &password, &mut errors);
        let next = data.value("next").filter(|n| !n.is_empty()).map(str::to_string);
        errors.into_result(Self { username, password, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::forms::NULL_CHARACTERS;

    #[test]
    fn test_login_form() {
        let form = LoginForm::clean(&FormData::new([
            ("username", " gordon "),
            ("password", " spaced "),
            ("next", "/dishes/"),
        ]))
        .unwrap();
        assert_eq!(form.username, "gordon");
        assert_eq!(form.password, " spaced ");
        assert_eq!(form.next.as_deref(), Some("/dishes/"));

        let errors = LoginForm::clean(&FormData::new([("username", ""), ("next", "")])).unwrap_err();
        assert!(errors.has("username"));
        assert!(errors.has("password"));

        let errors =
            LoginForm::clean(&FormData::new([("username", "gor\0don"), ("password", "pass\0word")])).unwrap_err();
        assert_eq!(errors.get("username"), [NULL_CHARACTERS.to_string()]);
        assert_eq!(errors.get("password"), [NULL_CHARACTERS.to_string()]);
    }
}
