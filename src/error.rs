//! Error types for the chatbox client.
//!
//! Every failure the client can observe is one variant of [`Error`]: input
//! that never leaves the session, HTTP statuses from the chat backend,
//! transport failures, and the configuration errors of the front end.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// Text shown when a remote exchange fails for a reason with no dedicated message.
const GENERIC_FAILURE: &str =
    "Sorry, something went wrong talking to the server. Please try again in a moment.";

/// The main error type for chatbox.
#[derive(Clone, Debug)]
pub enum Error {
    /// The input was empty or contained only whitespace.
    EmptyInput,

    /// The input exceeded the configured character limit.
    InputTooLong {
        /// Length of the trimmed input, in characters.
        length: usize,
        /// Configured maximum, in characters.
        max: usize,
    },

    /// The backend answered 404.
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// The backend answered 500.
    InternalServer {
        /// Human-readable error message.
        message: String,
    },

    /// The backend answered with any other non-success status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Reason phrase or response body.
        message: String,
    },

    /// The exchange did not complete before the client-side deadline.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// No response was received at all.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error other than a connection failure.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// Error while reading the configuration file.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new input-too-long error.
    pub fn input_too_long(length: usize, max: usize) -> Self {
        Error::InputTooLong { length, max }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    /// Creates a new API error for an unclassified status.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Returns true if the input was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::EmptyInput | Error::InputTooLong { .. })
    }

    /// Returns true if this error is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        match self {
            Error::InternalServer { .. } => true,
            Error::Api { status_code, .. } => (500..=599).contains(status_code),
            _ => false,
        }
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::InternalServer { .. } => Some(500),
            Error::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the text shown to the user for this error.
    ///
    /// Remote failures become the body of an error-styled assistant message;
    /// validation failures become a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyInput => "Please enter a message.".to_string(),
            Error::InputTooLong { max, .. } => {
                format!("Message is too long. Please keep it to {max} characters or fewer.")
            }
            Error::NotFound { .. } => "The chat endpoint could not be found.".to_string(),
            Error::InternalServer { .. } => {
                "The server encountered an internal error.".to_string()
            }
            Error::Api {
                status_code,
                message,
            } => format!("HTTP {status_code}: {message}"),
            Error::Timeout { .. } => "The request timed out.".to_string(),
            Error::Connection { .. } => "Please check your network connection.".to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "Validation error: input is empty"),
            Error::InputTooLong { length, max } => {
                write!(
                    f,
                    "Validation error: input is {length} characters (maximum {max})"
                )
            }
            Error::NotFound { message } => write!(f, "Not found: {message}"),
            Error::InternalServer { message } => write!(f, "Internal server error: {message}"),
            Error::Api {
                status_code,
                message,
            } => write!(f, "HTTP {status_code}: {message}"),
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => write!(f, "Connection error: {message}"),
            Error::HttpClient { message, .. } => write!(f, "HTTP client error: {message}"),
            Error::Url { message, .. } => write!(f, "URL error: {message}"),
            Error::Io { message, .. } => write!(f, "I/O error: {message}"),
            Error::Serialization { message, .. } => write!(f, "Serialization error: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            Error::Io { source, .. } => Some(source),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization(format!("YAML error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for chatbox operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_predicates() {
        assert!(Error::EmptyInput.is_validation());
        assert!(Error::input_too_long(501, 500).is_validation());
        assert!(!Error::not_found("missing").is_validation());
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::not_found("x").status_code(), Some(404));
        assert_eq!(Error::internal_server("x").status_code(), Some(500));
        assert_eq!(Error::api(418, "I'm a teapot").status_code(), Some(418));
        assert_eq!(Error::timeout("x", None).status_code(), None);
    }

    #[test]
    fn server_error_covers_5xx() {
        assert!(Error::internal_server("boom").is_server_error());
        assert!(Error::api(503, "Service Unavailable").is_server_error());
        assert!(!Error::api(418, "I'm a teapot").is_server_error());
    }

    #[test]
    fn user_messages_by_kind() {
        assert_eq!(
            Error::not_found("x").user_message(),
            "The chat endpoint could not be found."
        );
        assert_eq!(
            Error::internal_server("x").user_message(),
            "The server encountered an internal error."
        );
        assert_eq!(
            Error::api(403, "Forbidden").user_message(),
            "HTTP 403: Forbidden"
        );
        assert_eq!(
            Error::timeout("x", Some(30.0)).user_message(),
            "The request timed out."
        );
        assert!(
            Error::connection("refused", None)
                .user_message()
                .contains("network connection")
        );
        assert!(Error::input_too_long(600, 500).user_message().contains("500"));
    }

    #[test]
    fn display_timeout_with_duration() {
        let err = Error::timeout("request timed out", Some(30.0));
        assert_eq!(
            err.to_string(),
            "Timeout error: request timed out (30 seconds)"
        );
    }
}
