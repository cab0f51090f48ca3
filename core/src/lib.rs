//! Client-side synchronizer for a JSON REST posts collection.
//!
//! # Overview
//! `PostSync` keeps an ordered, in-memory list of posts and a form draft
//! consistent with a remote collection (`GET/POST /posts`,
//! `PATCH/DELETE /posts/{id}`). The core never touches the network: it builds
//! `HttpRequest` values and consumes `HttpResponse` values (host-does-IO),
//! which keeps it deterministic and lets a mobile host drive it through the
//! C ABI in `posts-ffi`.
//!
//! # Design
//! - `PostsClient` is stateless and only knows the collection URL.
//! - Every operation is split into `build_*` / `parse_*` at the client level
//!   and `begin_*` / `complete` at the synchronizer level.
//! - The synchronizer stores what the server answered, never what it sent.
//! - Failures are returned as `SyncError` and logged through `tracing`; the
//!   state is untouched when an operation fails.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod draft;
pub mod error;
pub mod http;
pub mod sync;
pub mod types;

pub use client::PostsClient;
pub use config::ClientConfig;
pub use draft::{Draft, DraftMode};
pub use error::{ApiError, SyncError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use sync::{Operation, Pending, PostSync, SyncState, DEFAULT_PAGE_SIZE};
pub use types::{NewPost, Post, PostPatch};
