use thiserror::Error;

use crate::object::ObjectId;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Object {0} does not exist")]
    UnknownObject(ObjectId),

    #[error("Invalid terminal '{0}', expected REFDES-PIN")]
    InvalidTerminal(String),

    #[error("Invalid net name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
