/*!
 * Error types for the ts-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl ProviderError {
    /// Whether another attempt at the same request may succeed.
    ///
    /// Authentication failures and client-side (4xx) API errors are final;
    /// everything else (network trouble, timeouts, throttling, server errors,
    /// unreadable bodies) is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::AuthenticationError(_) => false,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::RequestFailed(_)
            | Self::ParseError(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_)
            | Self::Timeout(_) => true,
        }
    }

    /// Map a reqwest transport error onto the provider taxonomy
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }

    /// Map a non-success HTTP status and its body onto the provider taxonomy
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

/// Errors raised while reading a Linguist `.ts` document.
///
/// Any of these is fatal: the run stops before a single provider call is made.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input is not well-formed XML
    #[error("Malformed XML at byte {position}: {message}")]
    Parse {
        /// Byte offset in the input where the reader gave up
        position: usize,
        /// Reader diagnostic
        message: String,
    },

    /// Well-formed XML that does not follow the Linguist schema
    #[error("Invalid translation file: {0}")]
    Schema(String),

    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A provider completion that cannot be aligned one-to-one with the request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormatError {
    /// No JSON object could be read from the completion
    #[error("Response is not a JSON object of indexed translations: {0}")]
    NotAnObject(String),

    /// The number of returned items differs from the number requested
    #[error("Expected {expected} translations, got {actual}")]
    CountMismatch {
        /// Units in the batch
        expected: usize,
        /// Items in the response
        actual: usize,
    },

    /// A requested index has no translation
    #[error("Missing translation for index {0}")]
    MissingIndex(usize),

    /// An index appears more than once
    #[error("Duplicate translation for index {0}")]
    DuplicateIndex(usize),

    /// An index outside the batch was returned
    #[error("Unexpected index {0} in response")]
    UnexpectedIndex(usize),

    /// A key that is not a non-negative integer
    #[error("Invalid index key {0:?} in response")]
    InvalidIndex(String),

    /// A translation is empty or not a string
    #[error("Empty translation for index {0}")]
    EmptyTranslation(usize),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The completion could not be mapped back onto the batch
    #[error("Response format error: {0}")]
    ResponseFormat(#[from] ResponseFormatError),

    /// A batch ran out of attempts
    #[error("Batch {batch} failed after {attempts} attempt(s): {source}")]
    Failed {
        /// 1-based batch number
        batch: usize,
        /// Attempts made, including the first
        attempts: u32,
        /// The error of the last attempt
        #[source]
        source: Box<TranslationError>,
    },
}

impl TranslationError {
    /// Whether the driver should try the batch again
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_transient(),
            Self::ResponseFormat(_) => true,
            Self::Failed { .. } => false,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error reading or writing a translation file
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
