//! Error types for the controller harness.
//!
//! Assertion mismatches are not represented here: assertion helpers panic the
//! way `assert_eq!` does, so they surface as ordinary test failures.

use thiserror::Error;

/// Main error type for harness operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The redirect hop cap was reached while the response was still a redirect.
    #[error("Maximum redirects exceeded: followed {hops} hop(s), last URI {uri}")]
    MaxRedirectExceeded { hops: u32, uri: String },

    /// The in-process service returned an error instead of a response
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// The response body could not be read
    #[error("Body error: {0}")]
    Body(String),

    #[error("Invalid URI '{uri}': {message}")]
    InvalidUri { uri: String, message: String },

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// Browsing history has no entry in the requested direction
    #[error("History error: {0}")]
    History(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A database operation was requested without a configured database
    #[error("No database configured")]
    NoDatabase,

    #[error("Migration error: {0}")]
    Migration(String),

    /// Table or column name that cannot be safely quoted
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Row filter that cannot be turned into a `WHERE` clause
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
