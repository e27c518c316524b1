use serde::{Deserialize, Serialize};
use std::fmt;

/// Field name used for errors that concern the record as a whole
pub const BASE: &str = "base";

/// The kind of a single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ErrorKind {
    Blank,
    Invalid,
    Taken,
    TooLong { max: usize },
    TooShort { min: usize },
    Confirmation,
    Inclusion,
    /// Free-form message, used for errors on `base`
    Message { text: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Blank => write!(f, "can't be blank"),
            ErrorKind::Invalid => write!(f, "is invalid"),
            ErrorKind::Taken => write!(f, "has already been taken"),
            ErrorKind::TooLong { max } => write!(f, "is too long (maximum is {} characters)", max),
            ErrorKind::TooShort { min } => write!(f, "is too short (minimum is {} characters)", min),
            ErrorKind::Confirmation => write!(f, "doesn't match confirmation"),
            ErrorKind::Inclusion => write!(f, "is not included in the list"),
            ErrorKind::Message { text } => write!(f, "{}", text),
        }
    }
}

/// A validation failure tagged to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    #[serde(flatten)]
    pub kind: ErrorKind,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field == BASE {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} {}", self.field, self.kind)
        }
    }
}

/// Ordered collection of field-tagged validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, field: impl Into<String>, kind: ErrorKind) {
        self.errors.push(FieldError {
            field: field.into(),
            kind,
        });
    }

    /// Add a free-form error on the record itself
    pub fn add_base(&mut self, text: impl Into<String>) {
        self.add(BASE, ErrorKind::Message { text: text.into() });
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// All failures recorded for `field`
    pub fn on(&self, field: &str) -> Vec<&ErrorKind> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| &e.kind)
            .collect()
    }

    pub fn has(&self, field: &str, kind: &ErrorKind) -> bool {
        self.errors.iter().any(|e| e.field == field && &e.kind == kind)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}
