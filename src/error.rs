//! Error taxonomy for the transcoder.
//!
//! Codecs and the streaming decomposer surface errors as values; the driver
//! converts them to messages and exit codes. The display strings here are
//! part of the CLI contract and are asserted by the integration tests.

use thiserror::Error;

use crate::codec::Encoding;

#[derive(Debug, Error)]
pub enum QqError {
    /// Mutually-exclusive flags were combined. Exits 2.
    #[error("{0}")]
    FlagConflict(String),

    /// A format name that is not in the registry.
    #[error("unsupported file type: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed input for the chosen format.
    #[error("error parsing input: {0}")]
    Decode(String),

    /// Value shape incompatible with the output format.
    #[error("error marshaling result to {format}: {detail}")]
    Encode { format: Encoding, detail: String },

    #[error("Error parsing jq expression: {0}")]
    QueryParse(String),

    #[error("Error executing jq expression: {0}")]
    QueryRun(String),

    /// Pretty-printer or lexer failure.
    #[error("{0}")]
    Format(String),
}

impl QqError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            QqError::FlagConflict(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, QqError>;
