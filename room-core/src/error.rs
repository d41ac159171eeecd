use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rejected property, e.g. `room.closedOn` / "Room is already closed.".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub property_name: String,
    pub error_message: String,
}

impl ValidationFailure {
    pub fn new(property_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            error_message: error_message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("bad request: {}", summary(.0))]
    BadRequest(Vec<ValidationFailure>),
    #[error("not found: {}", summary(.0))]
    NotFound(Vec<ValidationFailure>),
    #[error("forbidden: {}", summary(.0))]
    Forbidden(Vec<ValidationFailure>),
}

pub type RoomResult<T> = Result<T, RoomError>;

impl RoomError {
    pub fn bad_request(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest(vec![ValidationFailure::new(property, message)])
    }

    pub fn not_found(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound(vec![ValidationFailure::new(property, message)])
    }

    pub fn forbidden(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Forbidden(vec![ValidationFailure::new(property, message)])
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        match self {
            Self::BadRequest(f) | Self::NotFound(f) | Self::Forbidden(f) => f,
        }
    }

    /// True if any failure matches the given property and message.
    pub fn contains(&self, property: &str, message: &str) -> bool {
        self.failures()
            .iter()
            .any(|f| f.property_name == property && f.error_message == message)
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.failures().iter().any(|f| f.property_name == property)
    }
}

fn summary(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|f| {
            if f.property_name.is_empty() {
                f.error_message.clone()
            } else {
                format!("{}: {}", f.property_name, f.error_message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
