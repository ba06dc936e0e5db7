//! Request payload validation.
//!
//! Incoming bodies are parsed into `serde_json::Value` objects and checked
//! field by field so that every failing field is reported at once, keyed by
//! field name, instead of stopping at the first serde error.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";

pub const USERNAME_MAX_LEN: usize = 150;
pub const NAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PHONE_MAX_LEN: usize = 20;

/// Field-level validation messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.fields().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Borrowing view over a JSON object body that records errors as fields are read.
pub struct Fields<'a> {
    body: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Fields<'a> {
    pub fn new(body: &'a Map<String, Value>) -> Self {
        Self {
            body,
            errors: FieldErrors::new(),
        }
    }

    /// A required, non-blank string.
    pub fn required_str(&mut self, name: &str, max_len: usize) -> Option<String> {
        let body = self.body;
        match body.get(name) {
            None | Some(Value::Null) => {
                self.errors.add(name, REQUIRED);
                None
            }
            Some(value) => {
                let value = self.string_value(name, value)?;
                if value.trim().is_empty() {
                    self.errors.add(name, BLANK);
                    return None;
                }
                self.check_len(name, &value, max_len)?;
                Some(value)
            }
        }
    }

    /// An optional string where blank is allowed. `null` is treated as absent.
    pub fn optional_str(&mut self, name: &str, max_len: Option<usize>) -> Option<String> {
        let body = self.body;
        let value = match body.get(name) {
            None | Some(Value::Null) => return None,
            Some(value) => self.string_value(name, value)?,
        };
        if let Some(max_len) = max_len {
            self.check_len(name, &value, max_len)?;
        }
        Some(value)
    }

    /// Whether the body carries `name` at all, including as `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.body.contains_key(name)
    }

    pub fn add_error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.add(name, message);
    }

    pub fn has_error(&self, name: &str) -> bool {
        self.errors.get(name).is_some()
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn string_value(&mut self, name: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.errors.add(name, NOT_A_STRING);
                None
            }
        }
    }

    fn check_len(&mut self, name: &str, value: &str, max_len: usize) -> Option<()> {
        if value.chars().count() > max_len {
            self.errors.add(
                name,
                format!("Ensure this field has no more than {} characters.", max_len),
            );
            return None;
        }
        Some(())
    }
}

/// Request bodies must be JSON objects.
pub fn expect_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::BadRequest("Expected a JSON object".to_string()))
}

/// Usernames may contain letters, digits and `@ . + - _`.
pub fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Basic `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && tld.len() >= 2
        && !domain.contains(char::is_whitespace)
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.contains("..")
}
