mod code;
mod path;

pub use code::*;
pub use path::*;
use std::borrow::Cow;

pub type FieldResult<T> = Result<T, FieldError>;

/// An error attached to a single field of the response. It never aborts the resolution of sibling
/// fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub message: Cow<'static, str>,
    pub code: ErrorCode,
    pub path: Option<ErrorPath>,
    // Serialized as a map, but kept as a Vec for efficiency.
    pub extensions: Vec<(Cow<'static, str>, serde_json::Value)>,
}

impl FieldError {
    pub fn new(message: impl Into<Cow<'static, str>>, code: ErrorCode) -> Self {
        FieldError {
            message: message.into(),
            code,
            path: None,
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<ErrorPath>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the path unless a more precise one was already attached.
    #[must_use]
    pub fn with_default_path(mut self, path: impl Into<ErrorPath>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<serde_json::Value>) -> Self {
        let key = key.into();
        self.extensions.push((key, value.into()));
        self
    }

    pub fn extension(&self, key: &str) -> Option<&serde_json::Value> {
        self.extensions
            .iter()
            .find_map(|(name, value)| (name == key).then_some(value))
    }

    // ------------- //
    // Common errors //
    // ------------- //

    /// Aggregated validation failures, keyed by attribute path.
    pub fn validation(failures: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let failures = failures
            .into_iter()
            .map(|(attribute, messages)| (attribute, serde_json::Value::from(messages)))
            .collect::<serde_json::Map<_, _>>();

        FieldError::new("Validation failed for the field.", ErrorCode::ValidationError)
            .with_extension("validation", failures)
    }

    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        FieldError::new(message, ErrorCode::ValidationError)
    }

    /// Denial raised by an authorization directive, carrying its name for diagnostics.
    pub fn forbidden(directive: &'static str) -> Self {
        FieldError::new("This action is unauthorized.", ErrorCode::Forbidden).with_extension("directive", directive)
    }

    pub fn not_found(model: &str) -> Self {
        FieldError::new(format!("No query results for model [{model}]."), ErrorCode::NotFound)
            .with_extension("model", model.to_string())
    }

    pub fn ambiguous_result(model: &str, count: usize) -> Self {
        FieldError::new(
            format!("Expected exactly one [{model}] but found {count}."),
            ErrorCode::AmbiguousResult,
        )
        .with_extension("model", model.to_string())
    }

    pub fn page_size_exceeded(requested: usize, max: usize) -> Self {
        FieldError::new(
            format!("Maximum number of {max} requested items exceeded, got {requested}. Fetch smaller chunks."),
            ErrorCode::PageSizeExceeded,
        )
    }

    pub fn malformed_identifier(identifier: &str) -> Self {
        FieldError::new(
            format!("The given identifier `{identifier}` is not a valid global id."),
            ErrorCode::MalformedIdentifier,
        )
    }

    pub fn hashing(message: impl Into<Cow<'static, str>>) -> Self {
        FieldError::new(message, ErrorCode::HashingError)
    }

    pub fn invalid_range_input(argument: &str) -> Self {
        FieldError::new(
            format!("The argument `{argument}` must be an input object with exactly two non-null bounds."),
            ErrorCode::InvalidRangeInput,
        )
    }

    pub fn data_store(message: impl std::fmt::Display) -> Self {
        FieldError::new(format!("Data store error: {message}"), ErrorCode::DataStoreError)
    }

    pub fn request_timeout() -> Self {
        FieldError::new("Request timed out", ErrorCode::RequestTimeout)
    }

    pub fn internal_server_error() -> Self {
        FieldError::new("Internal server error", ErrorCode::InternalServerError)
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl std::error::Error for FieldError {}

impl serde::Serialize for FieldError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        struct Extensions<'a>(&'a FieldError);

        impl serde::Serialize for Extensions<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut map = serializer.serialize_map(Some(self.0.extensions.len() + 1))?;
                for (key, value) in &self.0.extensions {
                    map.serialize_entry(key, value)?;
                }
                map.serialize_entry("code", &self.0.code)?;
                map.end()
            }
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("message", &self.message)?;
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        map.serialize_entry("extensions", &Extensions(self))?;
        map.end()
    }
}
