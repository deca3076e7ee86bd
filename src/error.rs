use thiserror::Error;

/// Errors raised while mapping a request onto a storage operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("cannot insert record with blank id")]
    BlankId,
    #[error("malformed JSON body: {0}")]
    MalformedJson(String),
    #[error("request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("field `id` must be a string")]
    InvalidId,
}
