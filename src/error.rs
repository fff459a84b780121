//! Error types for Cybsi API operations.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the Cybsi API alongside 4xx statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorView {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorView {
    /// Parse an error body, falling back to an empty view for non-JSON bodies.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

impl fmt::Display for ErrorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "code: {}, message: {}",
            self.code.as_deref().unwrap_or("-"),
            self.message.as_deref().unwrap_or("-")
        )
    }
}

/// Errors that can occur during Cybsi API operations.
///
/// Each HTTP error status the API documents gets its own variant so that
/// callers can branch on them without inspecting raw status codes.
#[derive(Debug, Error)]
pub enum CybsiError {
    /// Configuration is missing or incomplete.
    #[error("Cybsi configuration required: {0}")]
    ConfigMissing(String),

    /// HTTP 400. The request was malformed; retrying will not help.
    #[error("invalid request, {0}")]
    InvalidRequest(ErrorView),

    /// HTTP 401. Credentials were rejected even after re-authentication.
    #[error("operation not authorized, {0}")]
    Unauthorized(ErrorView),

    /// HTTP 403.
    #[error("operation forbidden, {view}")]
    Forbidden {
        code: ForbiddenErrorCode,
        view: ErrorView,
    },

    /// HTTP 404.
    #[error("resource not found, {0}")]
    NotFound(ErrorView),

    /// HTTP 405.
    #[error("method not allowed, {0}")]
    MethodNotAllowed(ErrorView),

    /// HTTP 409.
    #[error("resource already exists, {0}")]
    Conflict(ErrorView),

    /// HTTP 412. Re-read the resource and apply the modification again.
    #[error("resource was modified since last read, {0}")]
    ResourceModified(ErrorView),

    /// HTTP 422. Business rules forbid the request.
    #[error("semantic error, code: {code}, message: {message}")]
    Semantic {
        code: SemanticErrorCode,
        message: String,
    },

    /// Any other non-2xx status.
    #[error("unexpected response status code: {status}. Response body: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The server returned data that does not match the expected shape.
    #[error("invalid server data: {0}")]
    InvalidData(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization error on the client side.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// The blocking client could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl CybsiError {
    /// Build the error matching an unsuccessful HTTP status and its body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let view = || ErrorView::from_body(body);
        match status {
            400 => Self::InvalidRequest(view()),
            401 => Self::Unauthorized(view()),
            403 => {
                let view = view();
                Self::Forbidden {
                    code: ForbiddenErrorCode::from(view.code.as_deref().unwrap_or_default()),
                    view,
                }
            }
            404 => Self::NotFound(view()),
            405 => Self::MethodNotAllowed(view()),
            409 => Self::Conflict(view()),
            412 => Self::ResourceModified(view()),
            422 => {
                let view = view();
                Self::Semantic {
                    code: SemanticErrorCode::from(view.code.as_deref().unwrap_or_default()),
                    message: view.message.unwrap_or_default(),
                }
            }
            _ => Self::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }

    /// HTTP status code carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidRequest(_) => Some(400),
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound(_) => Some(404),
            Self::MethodNotAllowed(_) => Some(405),
            Self::Conflict(_) => Some(409),
            Self::ResourceModified(_) => Some(412),
            Self::Semantic { .. } => Some(422),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Semantic error code for HTTP 422 responses.
    pub fn semantic_code(&self) -> Option<&SemanticErrorCode> {
        match self {
            Self::Semantic { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The change cursor is older than the server's change log retention.
    ///
    /// The stream cannot be resumed; take a fresh replist snapshot instead.
    pub fn is_cursor_out_of_range(&self) -> bool {
        matches!(self.semantic_code(), Some(SemanticErrorCode::CursorOutOfRange))
    }

    /// Whether repeating the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::ResourceModified(_) => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

macro_rules! api_codes {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident,)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
            /// A code this client does not know about.
            Other(String),
        }

        impl $name {
            /// Wire representation of the code.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                    Self::Other(code) => code,
                }
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                match code {
                    $(stringify!($variant) => Self::$variant,)*
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

api_codes! {
    /// Codes carried by HTTP 403 responses.
    ForbiddenErrorCode {
        /// User provided invalid credentials.
        InvalidCredentials,
        /// Access level is too low for the resource.
        InsufficientAccessLevel,
        /// User is not authorized to perform the operation.
        MissingPermissions,
        /// Only the owner can edit the resource.
        NotOwner,
        Forbidden,
    }
}

api_codes! {
    /// Codes carried by HTTP 422 responses.
    SemanticErrorCode {
        /// Cursor points outside of the change log.
        CursorOutOfRange,
        DataSourceNotFound,
        EntityNotFound,
        InvalidKey,
        InvalidKeySet,
        InvalidQueryText,
        /// Specified share level is above the API client share level.
        InvalidShareLevel,
        /// Query is not compatible with replists.
        InvalidStoredQuery,
        NonLocalUser,
        PasswordAuthDisabled,
        PermissionsExceeded,
        StoredQueryIsLocked,
        StoredQueryNotFound,
        UserDisabled,
        UserNotFound,
    }
}

/// Result type alias for Cybsi operations.
pub type Result<T> = core::result::Result<T, CybsiError>;
