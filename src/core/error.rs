use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed CQL text
    QuerySyntax,
    /// Predicate references a field without indexing metadata
    UnknownField,
    /// ACL or identity lookup failed (never leaves the permission filter)
    PermissionResolution,
    /// The index engine failed to execute a round
    EngineExecution,
    Cancelled,
    NotFound,
    InvalidArgument,
    /// Query exceeds validator limits
    TooComplex,
    Config,
    Internal,
}

#[derive(Debug, ThisError)]
#[error("{kind:?}: {context}{}", at(.position))]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
    /// Byte offset into the query text, when the error is tied to one
    pub position: Option<usize>,
}

fn at(position: &Option<usize>) -> String {
    match position {
        Some(p) => format!(" (at {})", p),
        None => String::new(),
    }
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
            position: None,
        }
    }

    pub fn syntax(position: usize, context: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::QuerySyntax,
            context: context.into(),
            position: Some(position),
        }
    }

    pub fn unknown_field(field: &str) -> Self {
        Error::new(
            ErrorKind::UnknownField,
            format!("field '{}' has no indexing metadata", field),
        )
    }

    pub fn engine(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::EngineExecution, context)
    }

    pub fn cancelled(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Cancelled, context)
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context)
    }

    pub fn invalid_argument(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, context)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The query engine never retries internally and none of its failures
    /// become valid by repeating the same call.
    pub fn is_retriable(&self) -> bool {
        false
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Config, err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Config, err.to_string())
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error::new(ErrorKind::EngineExecution, format!("FST error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
