use thiserror::Error;

/// Errors raised by the Atom document model.
///
/// Absent children are never errors: singular accessors return `None` and
/// plural accessors return an empty `Vec`.
#[derive(Debug, Error)]
pub enum AtomError {
    /// A required value is missing or a configuration key is not recognized.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Timestamp text is not valid RFC 3339 / ISO-8601.
    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Integer accessor text is not a number.
    #[error("Invalid integer '{value}': {source}")]
    Integer {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// XML serialization failed.
    #[error("XML write error: {0}")]
    XmlWrite(String),

    /// The node handed to a typed wrapper is not the element it models.
    #[error("Expected <{expected}> element, found <{found}>")]
    UnexpectedElement { expected: String, found: String },

    /// SEC-003: Element nesting exceeds the configured limit.
    #[error("XML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),

    /// Input exceeds the configured document size limit.
    #[error("Document too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// Reading a byte source failed.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AtomError>;

impl AtomError {
    pub(crate) fn timestamp(value: &str, source: chrono::ParseError) -> Self {
        AtomError::Timestamp {
            value: value.to_string(),
            source,
        }
    }

    pub(crate) fn integer(value: &str, source: std::num::ParseIntError) -> Self {
        AtomError::Integer {
            value: value.to_string(),
            source,
        }
    }
}
