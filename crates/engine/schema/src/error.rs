/// Schema build errors. All of them are fatal and prevent the engine from starting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Field {field} has more than one resolver directive: {}", .directives.join(", "))]
    AmbiguousResolver { field: String, directives: Vec<&'static str> },
    #[error("Field {field} has no resolver directive")]
    MissingResolver { field: String },
    #[error("Field {field} is defined more than once")]
    DuplicateField { field: String },
    #[error("At {location}, invalid @{directive} directive: {message}")]
    InvalidDirective {
        location: String,
        directive: &'static str,
        message: String,
    },
    #[error("At {location}, invalid validation rule '{rule}'")]
    InvalidRule { location: String, rule: String },
    #[error("Field {field} references the unknown custom {kind} '{name}'")]
    UnknownCustomResolver {
        field: String,
        kind: &'static str,
        name: String,
    },
}
