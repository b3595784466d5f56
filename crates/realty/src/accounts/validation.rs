//! Form rules for account payloads. Field errors accumulate so the storefront can show them all at once.

use serde::Deserialize;

use super::domain::Role;
use crate::error::FieldError;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_CHANGED_PASSWORD_LEN: usize = 6;
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Raw registration payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub terms: Option<serde_json::Value>,
}

/// Registration data that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Loose structural email check: one `@`, a non-empty local part, and a dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty() && !label.starts_with('-') && !label.ends_with('-')
        })
        && labels.last().is_some_and(|tld| tld.len() >= 2)
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Password policy for registration and resets.
pub fn password_errors(path: &'static str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::body(
            path,
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::body(
            path,
            "Password must contain at least one number",
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        errors.push(FieldError::body(
            path,
            "Password must contain at least one special character",
        ));
    }
    errors
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub fn validate_registration(form: RegistrationForm) -> Result<Registration, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = present(&form.name).map(str::to_string);
    match &name {
        None => errors.push(FieldError::body("name", "Name is required")),
        Some(name) if name.chars().count() < MIN_NAME_LEN => errors.push(FieldError::body(
            "name",
            "Name must be at least 2 characters",
        )),
        Some(_) => {}
    }

    let email = present(&form.email).map(normalize_email);
    match &email {
        None => errors.push(FieldError::body("email", "Email is required")),
        Some(email) if !is_valid_email(email) => {
            errors.push(FieldError::body("email", "Please enter a valid email"))
        }
        Some(_) => {}
    }

    let password = form.password.clone().filter(|value| !value.is_empty());
    match &password {
        None => errors.push(FieldError::body("password", "Password is required")),
        Some(password) => errors.extend(password_errors("password", password)),
    }

    match form.confirm_password.as_deref() {
        None | Some("") => errors.push(FieldError::body(
            "confirmPassword",
            "Please confirm your password",
        )),
        Some(confirm) if Some(confirm) != form.password.as_deref() => {
            errors.push(FieldError::body("confirmPassword", "Passwords do not match"))
        }
        Some(_) => {}
    }

    if form.terms != Some(serde_json::Value::Bool(true)) {
        errors.push(FieldError::body(
            "terms",
            "You must accept the terms and privacy policy",
        ));
    }

    let role = match present(&form.role) {
        None => Role::default(),
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                errors.push(FieldError::body("role", "Role must be buyer or agent"));
                Role::default()
            }
        },
    };

    match (name, email, password) {
        (Some(name), Some(email), Some(password)) if errors.is_empty() => Ok(Registration {
            name,
            email,
            password,
            phone: present(&form.phone).map(str::to_string),
            role,
        }),
        _ => Err(errors),
    }
}

/// Returns the normalized email and raw password.
pub fn validate_login(form: LoginForm) -> Result<(String, String), Vec<FieldError>> {
    let mut errors = Vec::new();
    let email = present(&form.email).map(normalize_email);
    match &email {
        None => errors.push(FieldError::body("email", "Email is required")),
        Some(email) if !is_valid_email(email) => {
            errors.push(FieldError::body("email", "Please enter a valid email"))
        }
        Some(_) => {}
    }
    let password = form.password.filter(|value| !value.is_empty());
    if password.is_none() {
        errors.push(FieldError::body("password", "Password is required"));
    }
    match (email, password) {
        (Some(email), Some(password)) if errors.is_empty() => Ok((email, password)),
        _ => Err(errors),
    }
}
