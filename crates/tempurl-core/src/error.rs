//! Service error types.
//!
//! Every failure that reaches the HTTP layer is a [`TempUrlError`]: a code,
//! a message and the status it maps to. Responses render it as
//! `{"error": "<message>"}`.

use std::fmt;

/// Well-known service error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TempUrlErrorCode {
    /// Malformed body, missing fields or a non-positive duration.
    #[default]
    InvalidRequest,
    /// Request authentication failed.
    Unauthenticated,
    /// No access rule authorizes the request.
    NotAuthorized,
    /// The requestor may not manage the target account.
    Forbidden,
    /// Unknown route.
    NotFound,
    /// Known route, unsupported method.
    MethodNotAllowed,
    /// The named account does not exist.
    UnknownAccount,
    /// More than one access rule matched.
    AmbiguousRule,
    /// The granting account has no signing key provisioned.
    Configuration,
    /// A collaborator failed or timed out.
    Upstream,
    /// Unexpected internal failure.
    Internal,
}

impl TempUrlErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "InvalidRequest",
            Self::Unauthenticated => "Unauthenticated",
            Self::NotAuthorized => "NotAuthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::UnknownAccount => "UnknownAccount",
            Self::AmbiguousRule => "AmbiguousRule",
            Self::Configuration => "Configuration",
            Self::Upstream => "Upstream",
            Self::Internal => "Internal",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::InvalidRequest => http::StatusCode::BAD_REQUEST,
            Self::Unauthenticated => http::StatusCode::UNAUTHORIZED,
            Self::NotAuthorized | Self::Forbidden => http::StatusCode::FORBIDDEN,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::UnknownAccount => http::StatusCode::GONE,
            Self::AmbiguousRule | Self::Configuration | Self::Upstream | Self::Internal => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for TempUrlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service error carrying its HTTP status.
#[derive(Debug)]
pub struct TempUrlError {
    /// The error code.
    pub code: TempUrlErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for TempUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TempUrlError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for TempUrlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl TempUrlError {
    /// Create a new error from a code, using the code name as message.
    #[must_use]
    pub fn new(code: TempUrlErrorCode) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: code.as_str().to_owned(),
            code,
            source: None,
        }
    }

    /// Create a new error with a custom message.
    #[must_use]
    pub fn with_message(code: TempUrlErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether this error is a server-side failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code.is_server_error()
    }

    // -- Convenience constructors --

    /// Malformed request.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::InvalidRequest, message)
    }

    /// Authentication failed. The message is always generic.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::with_message(TempUrlErrorCode::Unauthenticated, "Unauthorized")
    }

    /// No rule authorizes the request.
    #[must_use]
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::NotAuthorized, message)
    }

    /// Requestor may not act on the account.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::Forbidden, message)
    }

    /// Unknown route.
    #[must_use]
    pub fn not_found(path: &str) -> Self {
        Self::with_message(TempUrlErrorCode::NotFound, format!("no route for {path}"))
    }

    /// Unsupported method on a known route.
    #[must_use]
    pub fn method_not_allowed(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            TempUrlErrorCode::MethodNotAllowed,
            format!("method {method} not allowed on {path}"),
        )
    }

    /// Unknown account name.
    #[must_use]
    pub fn unknown_account(name: &str) -> Self {
        Self::with_message(
            TempUrlErrorCode::UnknownAccount,
            format!("account {name} does not exist"),
        )
    }

    /// More than one rule matched.
    #[must_use]
    pub fn ambiguous_rule(matches: usize) -> Self {
        Self::with_message(
            TempUrlErrorCode::AmbiguousRule,
            format!("{matches} access rules matched, expected exactly one"),
        )
    }

    /// Missing signing key or other deployment misconfiguration.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::Configuration, message)
    }

    /// Collaborator failure or timeout.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::Upstream, message)
    }

    /// Internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(TempUrlErrorCode::Internal, message)
    }
}

/// Convenience result type for service operations.
pub type TempUrlResult<T> = Result<T, TempUrlError>;
