//! Form handling shared by the HTML views and the admin API.
//!
//! HTML forms arrive as urlencoded pairs ([`FormData`]); repeated keys are kept so that
//! multi-select fields survive. Cleaning a field either yields a typed value or records a
//! message in [`FieldErrors`]; the same messages are rendered next to the inputs and returned
//! as `422` bodies by the admin API.
//!
//! [`BoundForm`] is the rendering side: a list of [`FormField`]s bound to submitted or initial
//! values, which the shared `create_update_form.html` template lays out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;

/// Key under which errors not tied to a single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const NULL_CHARACTERS: &str = "Null characters are not allowed.";

/// A raw urlencoded form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn new<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// First value submitted for `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Every value submitted for `name`, in submission order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == name).map(|(_, v)| v.as_str()).collect()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }
}

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every recorded message, field by field.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().flatten().map(String::as_str)
    }

    /// `Ok(value)` when no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(field, msgs)| format!("{field}: {}", msgs.join(" "))).collect();
        write!(f, "{}", parts.join("; "))
    }
}

pub fn max_length_message(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

/// Trimmed text that must be present and at most `max` characters long.
pub fn clean_required_text(data: &FormData, field: &str, max: usize, errors: &mut FieldErrors) -> String {
    let value = data.value(field).unwrap_or_default().trim().to_string();
    validate_required_text(field, &value, max, errors);
    value
}

/// Trimmed text that may be empty; `max` of `None` means unbounded.
pub fn clean_optional_text(data: &FormData, field: &str, max: Option<usize>, errors: &mut FieldErrors) -> String {
    let value = data.value(field).unwrap_or_default().trim().to_string();
    validate_text(field, &value, max, errors);
    value
}

pub fn validate_required_text(field: &str, value: &str, max: usize, errors: &mut FieldErrors) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    } else {
        validate_text(field, value, Some(max), errors);
    }
}

/// Text bound for a Postgres column: no NUL characters, at most `max` characters.
pub fn validate_text(field: &str, value: &str, max: Option<usize>, errors: &mut FieldErrors) {
    if !validate_no_null_characters(field, value, errors) {
        return;
    }
    if let Some(max) = max {
        validate_max_length(field, value, max, errors);
    }
}

/// Records an error and returns `false` when `value` contains a NUL character.
pub fn validate_no_null_characters(field: &str, value: &str, errors: &mut FieldErrors) -> bool {
    if value.contains('\0') {
        errors.add(field, NULL_CHARACTERS);
        return false;
    }
    true
}

/// A list search term: trimmed, and `None` when blank, longer than `max` or not storable text.
pub fn search_term(raw: Option<&str>, max: usize) -> Option<String> {
    let term = raw.unwrap_or_default().trim();
    (!term.is_empty() && !term.contains('\0') && term.chars().count() <= max).then(|| term.to_string())
}

pub fn validate_max_length(field: &str, value: &str, max: usize, errors: &mut FieldErrors) {
    let len = value.chars().count();
    if len > max {
        errors.add(field, max_length_message(max, len));
    }
}

/// A required whole number.
pub fn clean_integer(data: &FormData, field: &str, errors: &mut FieldErrors) -> Option<i32> {
    let raw = data.value(field).unwrap_or_default().trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.parse::<i32>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            None
        }
    }
}

/// Inclusive bounds check with the usual min/max messages.
pub fn validate_range(field: &str, value: i32, min: i32, max: i32, errors: &mut FieldErrors) {
    if value < min {
        errors.add(field, format!("Ensure this value is greater than or equal to {min}."));
    } else if value > max {
        errors.add(field, format!("Ensure this value is less than or equal to {max}."));
    }
}

/// A required decimal number, parsed without going through floating point.
pub fn clean_decimal(data: &FormData, field: &str, errors: &mut FieldErrors) -> Option<Decimal> {
    let raw = data.value(field).unwrap_or_default().trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    // `Decimal::from_str` skips `_` digit separators
    if raw.contains('_') {
        errors.add(field, "Enter a number.");
        return None;
    }
    match Decimal::from_str(raw) {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, "Enter a number.");
            None
        }
    }
}

/// Enforce a `NUMERIC(max_digits, decimal_places)` column shape and a non-negative value.
///
/// Values that do not fit are rejected rather than rounded.
pub fn validate_decimal(field: &str, value: Decimal, max_digits: u32, decimal_places: u32, errors: &mut FieldErrors) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "Ensure this value is greater than or equal to 0.");
        return;
    }
    if value.scale() > decimal_places {
        errors.add(field, format!("Ensure that there are no more than {decimal_places} decimal places."));
        return;
    }
    let whole_digits = max_digits - decimal_places;
    let limit = Decimal::from(10i64.pow(whole_digits));
    if value.trunc() >= limit {
        errors.add(
            field,
            format!("Ensure that there are no more than {whole_digits} digits before the decimal point."),
        );
    }
}

/// A required single choice given by id.
pub fn clean_choice(data: &FormData, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    let raw = data.value(field).unwrap_or_default().trim();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.parse::<i64>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// A required multiple choice given by ids. Duplicates are dropped, order is kept.
pub fn clean_multiple_choice(data: &FormData, field: &str, errors: &mut FieldErrors) -> Vec<i64> {
    let raw: Vec<&str> = data.values(field).into_iter().map(str::trim).filter(|v| !v.is_empty()).collect();
    if raw.is_empty() {
        errors.add(field, REQUIRED);
        return Vec::new();
    }
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        match value.parse::<i64>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => {
                errors.add(field, invalid_choice_message(value));
                return Vec::new();
            }
        }
    }
    ids
}

pub fn invalid_choice_message(value: impl fmt::Display) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

/// A checkbox: present and not "false"/"off" means checked.
pub fn clean_checkbox(data: &FormData, field: &str) -> bool {
    matches!(data.value(field), Some(v) if !matches!(v, "" | "false" | "off" | "0"))
}

/// How an input is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    TextArea,
    Number,
    Decimal,
    Email,
    Password,
    Select,
    CheckboxMultiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    pub help_text: Option<&'static str>,
    pub value: String,
    pub selected: Vec<String>,
    pub choices: Vec<Choice>,
    pub errors: Vec<String>,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, widget: Widget) -> Self {
        Self {
            name,
            label,
            widget,
            required: false,
            help_text: None,
            value: String::new(),
            selected: Vec::new(),
            choices: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn help(mut self, text: &'static str) -> Self {
        self.help_text = Some(text);
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

/// A form ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct BoundForm {
    pub fields: Vec<FormField>,
    pub non_field_errors: Vec<String>,
}

impl BoundForm {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            non_field_errors: Vec::new(),
        }
    }

    /// Fill inputs from `data`. Password inputs are never echoed back.
    pub fn bind(mut self, data: &FormData) -> Self {
        for field in &mut self.fields {
            match field.widget {
                Widget::Password => {}
                Widget::CheckboxMultiple => {
                    field.selected = data.values(field.name).into_iter().map(str::to_string).collect();
                }
                _ => {
                    field.value = data.value(field.name).unwrap_or_default().to_string();
                }
            }
        }
        self
    }

    pub fn with_errors(mut self, errors: &FieldErrors) -> Self {
        for field in &mut self.fields {
            field.errors = errors.get(field.name).to_vec();
        }
        self.non_field_errors = errors.get(NON_FIELD_ERRORS).to_vec();
        self
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
