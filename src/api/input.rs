//! Boundary validation for request bodies and path identifiers.
//!
//! Every operation gets its own typed input. Construction is the only way
//! to obtain one, so a `CreateTodoInput` in hand always carries non-blank
//! text and an `UpdateTodoInput` never holds an empty replacement.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::database::models::{NewTodo, TodoId, TodoPatch};

/// Fields the store owns; clients may not send them
const SYSTEM_FIELDS: &[&str] = &["_id", "id", "created"];

const MIN_PASSWORD_LEN: usize = 6;

/// Malformed input, collected per field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn field(field: impl Into<String>, error: impl Into<String>) -> Self {
        let mut err = Self::new("Invalid input");
        err.add(field, error);
        err
    }

    fn add(&mut self, field: impl Into<String>, error: impl Into<String>) {
        self.field_errors.insert(field.into(), error.into());
    }

    fn into_result(self) -> Result<(), Self> {
        if self.field_errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate a raw path segment as a todo identifier
pub fn parse_todo_id(raw: &str) -> Result<TodoId, ValidationError> {
    TodoId::parse(raw).ok_or_else(|| ValidationError::field("todoId", "Invalid todoId format"))
}

/// Body of POST /api/todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodoInput {
    text: String,
    is_done: bool,
}

impl CreateTodoInput {
    pub fn new(text: impl Into<String>, is_done: Option<bool>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::field("todo", "Please include a todo item!"));
        }
        Ok(Self {
            text,
            is_done: is_done.unwrap_or(false),
        })
    }

    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        let map = expect_object(body)?;
        let mut errors = ValidationError::new("Invalid todo");
        reject_system_fields(&map, &mut errors);

        let text = match map.get("todo") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => {
                errors.add("todo", "Please include a todo item!");
                None
            }
        };
        let is_done = optional_bool(&map, "isDone", &mut errors);

        errors.into_result()?;
        match text {
            Some(text) => Self::new(text, is_done),
            None => Err(ValidationError::field("todo", "Please include a todo item!")),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn into_new_todo(self) -> NewTodo {
        NewTodo {
            text: self.text,
            is_done: self.is_done,
        }
    }
}

/// Body of PATCH /api/todo/:id. Both fields may be absent; the service
/// decides what an empty update means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTodoInput {
    text: Option<String>,
    is_done: Option<bool>,
}

impl UpdateTodoInput {
    pub fn new(text: Option<String>, is_done: Option<bool>) -> Result<Self, ValidationError> {
        if matches!(&text, Some(t) if t.trim().is_empty()) {
            return Err(ValidationError::field("todo", "Todo text cannot be empty"));
        }
        Ok(Self { text, is_done })
    }

    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        let map = expect_object(body)?;
        let mut errors = ValidationError::new("Invalid todo update");
        reject_system_fields(&map, &mut errors);

        let text = match map.get("todo") {
            None => None,
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::String(_)) => {
                errors.add("todo", "Todo text cannot be empty");
                None
            }
            Some(_) => {
                errors.add("todo", "Todo text must be a string");
                None
            }
        };
        let is_done = optional_bool(&map, "isDone", &mut errors);

        errors.into_result()?;
        Self::new(text, is_done)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.is_done.is_none()
    }

    pub fn into_patch(self) -> TodoPatch {
        TodoPatch {
            text: self.text,
            is_done: self.is_done,
        }
    }
}

/// Body of POST /api/user
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterInput {
    email: String,
    password: String,
}

// Keep passwords out of logs
impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegisterInput {
    pub fn new(email: &str, password: &str) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new("Invalid registration");
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            errors.add("email", "Please include a valid email");
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Please enter a password with 6 or more characters");
        }
        errors.into_result()?;

        Ok(Self {
            email,
            password: password.to_string(),
        })
    }

    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        let map = expect_object(body)?;
        let email = map.get("email").and_then(Value::as_str).unwrap_or_default();
        let password = map.get("password").and_then(Value::as_str).unwrap_or_default();
        Self::new(email, password)
    }

    /// Lowercased, trimmed email
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    // Domain needs at least one dot with text on both sides
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.starts_with('.'),
        None => false,
    }
}

fn expect_object(body: Value) -> Result<Map<String, Value>, ValidationError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::new("Expected a JSON object")),
    }
}

fn reject_system_fields(map: &Map<String, Value>, errors: &mut ValidationError) {
    for field in SYSTEM_FIELDS {
        if map.contains_key(*field) {
            errors.add(*field, format!("System field '{}' cannot be set via API", field));
        }
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str, errors: &mut ValidationError) -> Option<bool> {
    match map.get(key) {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.add(key, "Please enter a valid boolean value for isDone!");
            None
        }
    }
}
