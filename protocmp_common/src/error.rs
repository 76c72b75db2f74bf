use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoCmpError {
    #[error("schema mismatch: `{actual}` is not comparable with `{expected}`")]
    SchemaMismatch { actual: String, expected: String },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid field path: {0}")]
    InvalidPath(String),

    #[error("message `{message}` has no field `{field}`")]
    UnknownField { message: String, field: String },

    #[error("type mismatch for field `{field}`: {reason}")]
    FieldType { field: String, reason: String },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ProtoCmpError>;
