#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // Arguments
    ValidationError,
    InvalidRangeInput,
    MalformedIdentifier,
    HashingError,
    PageSizeExceeded,
    // Auth
    Forbidden,
    // Lookups
    NotFound,
    AmbiguousResult,
    // Collaborators
    CustomResolverError,
    DataStoreError,
    RequestTimeout,
    InternalServerError,
}

impl ErrorCode {
    /// Whether the error was caused by the client input rather than by the server or one of its
    /// collaborators.
    pub fn is_client_error(self) -> bool {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidRangeInput
            | ErrorCode::MalformedIdentifier
            | ErrorCode::PageSizeExceeded
            | ErrorCode::Forbidden
            | ErrorCode::NotFound
            | ErrorCode::AmbiguousResult => true,
            ErrorCode::HashingError
            | ErrorCode::CustomResolverError
            | ErrorCode::DataStoreError
            | ErrorCode::RequestTimeout
            | ErrorCode::InternalServerError => false,
        }
    }
}
