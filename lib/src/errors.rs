//! Error type shared by stores, the graph facade and the codecs.

use std::fmt;
use thiserror::Error;

/// What went wrong at a given position of a text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnexpectedCharacter,
    UnexpectedEof,
    TermCount,
    UnterminatedIri,
    UnterminatedLiteral,
    UnterminatedTriple,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            SyntaxErrorKind::UnexpectedCharacter => "unexpected character",
            SyntaxErrorKind::UnexpectedEof => "unexpected end of input",
            SyntaxErrorKind::TermCount => "wrong number of terms in line",
            SyntaxErrorKind::UnterminatedIri => "unterminated IRI, expecting '>'",
            SyntaxErrorKind::UnterminatedLiteral => "unterminated literal, expecting '\"'",
            SyntaxErrorKind::UnterminatedTriple => "unterminated triple, expecting '.'",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input. Lines start at 1, columns (in characters) at 0.
    #[error("line {line}, column {column}: {kind}")]
    Syntax {
        line: usize,
        column: usize,
        kind: SyntaxErrorKind,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{store} does not support {operation}")]
    Unsupported {
        store: &'static str,
        operation: &'static str,
    },

    #[error("no triple at handle {0}")]
    InvalidHandle(usize),

    #[error("literal has both a language and a datatype: {0}")]
    MalformedLiteral(String),

    #[error("term cannot be used as an index key: {0}")]
    UnindexableTerm(String),

    #[error("malformed RDF list: {0}")]
    MalformedList(String),

    #[error("no matching triple")]
    NotFound,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("rdfz: {0}")]
    Rdfz(#[from] rdfz::RdfzError),

    #[error("{format}: {message}")]
    Codec {
        format: &'static str,
        message: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0} thread panicked")]
    CodecPanicked(&'static str),

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("all {0} sources failed to load")]
    AllSourcesFailed(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("no namespace registered for prefix: {0}")]
    UnknownPrefix(String),
}

pub type Result<T> = std::result::Result<T, Error>;
