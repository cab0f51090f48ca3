//! Error types for the posts client and synchronizer.
//!
//! # Design
//! `ApiError` describes what went wrong on the wire and is kept detailed for
//! diagnostics. `SyncError` is what synchronizer operations return: every
//! remote problem collapses into `SyncError::Remote`, while the remaining
//! variants are local precondition failures detected before any request is
//! issued.

use thiserror::Error;

/// Errors returned by `PostsClient` builders and parsers, and by transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The server answered a write without assigning an id to the post.
    #[error("server response carries no post id")]
    MissingId,

    /// The request never produced a response (unreachable host, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Errors returned by `PostSync` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("remote operation failed: {0}")]
    Remote(#[from] ApiError),

    /// The operation targets a post that is not in the local list.
    #[error("post {0} is not in the list")]
    UnknownPost(u64),

    /// An update was requested while the draft is in creating mode.
    #[error("draft is not editing a post")]
    NotEditing,

    /// A create was requested while the draft is editing an existing post.
    #[error("draft is editing post {0}")]
    EditInProgress(u64),
}

impl SyncError {
    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Remote(_))
    }
}
