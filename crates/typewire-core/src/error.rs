//! Error types for typewire generation

use thiserror::Error;

/// Result type alias for generation operations
pub type GenResult<T> = Result<T, GenError>;

/// Which family of endpoint an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Http,
    Socket,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Http => write!(f, "http endpoint"),
            EndpointKind::Socket => write!(f, "socket endpoint"),
        }
    }
}

/// Identifies the endpoint a generation error was raised for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    pub kind: EndpointKind,
    pub index: usize,
    pub name: String,
}

impl EndpointRef {
    pub fn http(index: usize, name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Http,
            index,
            name: name.into(),
        }
    }

    pub fn socket(index: usize, name: impl Into<String>) -> Self {
        Self {
            kind: EndpointKind::Socket,
            index,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{} `{}`", self.kind, self.index, self.name)
    }
}

/// Direction of a socket message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the client
    Client,
    /// Sent by the server
    Server,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Client => write!(f, "client"),
            Direction::Server => write!(f, "server"),
        }
    }
}

/// Coarse classification of a [`GenError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Inconsistent endpoint or type descriptors, detected before synthesis
    DescriptorValidation,
    /// A type descriptor could not be rendered
    Resolution,
    /// Invalid generator configuration
    Config,
    /// Reading sources or writing artifacts failed
    Io,
}

/// Error type for generation runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    /// Wraps an error with the endpoint it was raised for
    #[error("{endpoint}: {source}")]
    InEndpoint {
        endpoint: EndpointRef,
        source: Box<GenError>,
    },

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("path is empty")]
    EmptyPath,

    #[error("path placeholder `{placeholder}` does not match any path parameter field")]
    UnmappedPlaceholder { placeholder: String },

    #[error("path placeholder `{placeholder}` matches several path parameter fields: {candidates}")]
    AmbiguousPlaceholder {
        placeholder: String,
        candidates: String,
    },

    /// A lookup that needs struct fields was pointed at something else
    #[error("{target} must be a struct, found {found}")]
    NonStructTarget { target: String, found: String },

    #[error("literal union on field `{field}` is empty")]
    EmptyUnion { field: String },

    #[error("literal union on field `{field}` mixes {expected} and {found} literals (`{token}`)")]
    HeterogeneousUnion {
        field: String,
        expected: String,
        found: String,
        token: String,
    },

    #[error("literal union on field `{field}` needs a scalar field type, found {found}")]
    UnionOnNonScalar { field: String, found: String },

    #[error("`{0}` is not a valid identifier")]
    InvalidName(String),

    #[error("endpoint name `{0}` is declared more than once")]
    DuplicateEndpoint(String),

    #[error("message type `{message_type}` has no {direction} payload")]
    MissingPayload {
        message_type: String,
        direction: Direction,
    },

    #[error("message type `{0}` is declared more than once")]
    DuplicateMessageType(String),

    #[error("message types `{first}` and `{second}` both map to method suffix `{suffix}`")]
    MethodNameCollision {
        first: String,
        second: String,
        suffix: String,
    },

    #[error("cannot resolve type: {0}")]
    Resolution(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl GenError {
    /// Attach the endpoint this error was raised for
    pub fn in_endpoint(self, endpoint: EndpointRef) -> Self {
        GenError::InEndpoint {
            endpoint,
            source: Box::new(self),
        }
    }

    /// The innermost error, without endpoint wrappers
    pub fn root(&self) -> &GenError {
        match self {
            GenError::InEndpoint { source, .. } => source.root(),
            other => other,
        }
    }

    /// The endpoint this error was raised for, if known
    pub fn endpoint(&self) -> Option<&EndpointRef> {
        match self {
            GenError::InEndpoint { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            GenError::Resolution(_) => ErrorCategory::Resolution,
            GenError::Config(_) => ErrorCategory::Config,
            GenError::Io(_) => ErrorCategory::Io,
            _ => ErrorCategory::DescriptorValidation,
        }
    }
}

impl From<std::io::Error> for GenError {
    fn from(err: std::io::Error) -> Self {
        GenError::Io(err.to_string())
    }
}
