use std::fmt;
use thiserror::Error as ThisError;

///
/// RenderError
///
/// Public fault surface of one render call or terminal consumption.
/// Every variant is raised synchronously; a failed render returns no partial
/// result.
///

#[derive(Debug, ThisError)]
pub enum RenderError {
    /// A result sequence, terminal operation, or pipeline was used twice.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// An operation has no replay capability and could not be pushed down.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Passed through verbatim from the execution collaborator.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RenderError {
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::IllegalState(_) => ErrorClass::InvariantViolation,
            Self::Unsupported(_) => ErrorClass::Unsupported,
            Self::Store(err) => err.class,
        }
    }
}

///
/// StoreError
///
/// Structured failure reported by a store execution capability.
/// The renderer never retries or rewrites it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("store error ({class}): {message}")]
pub struct StoreError {
    pub class: ErrorClass,
    pub message: String,
}

impl StoreError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unavailable, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, message)
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, message)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    Internal,
    InvariantViolation,
    Unavailable,
    Unsupported,
    Corruption,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::Unavailable => "unavailable",
            Self::Unsupported => "unsupported",
            Self::Corruption => "corruption",
        };
        write!(f, "{label}")
    }
}

///
/// TranslationError
///
/// An operation claimed pushability but could not be rendered into the query
/// representation. Mergers isolate it to that one operation, which then stays
/// behind for replay.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TranslationError {
    #[error("column '{column}' is not defined on entity '{entity}'")]
    UnknownColumn {
        entity: &'static str,
        column: &'static str,
    },

    #[error("null literal in '{op}' comparison on column '{column}'; use is_null instead")]
    NullLiteral {
        column: &'static str,
        op: &'static str,
    },

    #[error("empty value list in '{op}' comparison on column '{column}'")]
    EmptyList {
        column: &'static str,
        op: &'static str,
    },

    #[error("null bound in range comparison on column '{column}'")]
    NullBound { column: &'static str },

    #[error("closure-backed argument has no query form")]
    Opaque,
}

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid renderer config: {0}")]
    Parse(#[from] toml::de::Error),
}
