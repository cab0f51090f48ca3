//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use posts_core::{ApiError, Draft, HttpMethod, HttpRequest, Operation, Post, PostSync, SyncError};

/// Opaque handle to a `PostSync`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiPostSync {
    pub(crate) inner: PostSync,
}

/// Convert to a heap C string. Interior NUL bytes are dropped rather than
/// failing, since titles and bodies come from the server.
pub(crate) fn to_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

/// Free a C string produced by `to_c_string`. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Hand a `Vec` to C as a pointer; empty vectors become null.
fn into_raw_vec<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let mut boxed = items.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    std::mem::forget(boxed);
    (ptr, len)
}

/// Take back a pointer produced by `into_raw_vec`.
///
/// # Safety
/// `ptr`/`len` must come from `into_raw_vec` and not have been reclaimed.
pub(crate) unsafe fn from_raw_vec<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Patch = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request has no body.
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_vec(headers);
        FfiHttpRequest {
            method: req.method.into(),
            path: to_c_string(req.path),
            headers,
            headers_len,
            body: req.body.map(to_c_string).unwrap_or(std::ptr::null_mut()),
        }
    }

    /// Release the strings and header array owned by this request.
    pub(crate) fn free_fields(&mut self) {
        free_c_string(self.path);
        free_c_string(self.body);
        for h in unsafe { from_raw_vec(self.headers, self.headers_len) } {
            free_c_string(h.key);
            free_c_string(h.value);
        }
        self.path = std::ptr::null_mut();
        self.body = std::ptr::null_mut();
        self.headers = std::ptr::null_mut();
        self.headers_len = 0;
    }
}

// ---------------------------------------------------------------------------
// Pending operations
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiOperationKind {
    Refresh = 0,
    Create = 1,
    Update = 2,
    Delete = 3,
}

/// A started operation. The C caller executes `request`, then hands this
/// back to `posts_complete` or `posts_fail`, which take ownership of it.
#[repr(C)]
pub struct FfiPending {
    pub kind: FfiOperationKind,
    /// Target post for `Update` / `Delete`; 0 otherwise.
    pub post_id: u64,
    pub request: FfiHttpRequest,
}

impl FfiPending {
    pub(crate) fn from_core(pending: posts_core::Pending) -> *mut Self {
        let (kind, post_id) = match pending.operation {
            Operation::Refresh => (FfiOperationKind::Refresh, 0),
            Operation::Create => (FfiOperationKind::Create, 0),
            Operation::Update(id) => (FfiOperationKind::Update, id),
            Operation::Delete(id) => (FfiOperationKind::Delete, id),
        };
        Box::into_raw(Box::new(FfiPending {
            kind,
            post_id,
            request: FfiHttpRequest::from_core(pending.request),
        }))
    }

    pub(crate) fn operation(&self) -> Operation {
        match self.kind {
            FfiOperationKind::Refresh => Operation::Refresh,
            FfiOperationKind::Create => Operation::Create,
            FfiOperationKind::Update => Operation::Update(self.post_id),
            FfiOperationKind::Delete => Operation::Delete(self.post_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request. The
/// FFI layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiSyncResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Http = 2,
    Deserialization = 3,
    Serialization = 4,
    MissingId = 5,
    Transport = 6,
    UnknownPost = 7,
    NotEditing = 8,
    EditInProgress = 9,
    Panic = 10,
    NullArg = 11,
}

/// Outcome of `posts_complete` / `posts_fail`.
///
/// On success `error_code` is `Ok` and `error_message` is null; the new
/// state is read with `posts_snapshot` / `posts_draft`.
#[repr(C)]
pub struct FfiSyncResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
}

impl FfiSyncResult {
    fn boxed(error_code: FfiErrorCode, message: Option<String>, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiSyncResult {
            error_code,
            error_message: message.map(to_c_string).unwrap_or(std::ptr::null_mut()),
            http_status,
        }))
    }

    pub(crate) fn ok() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, 0)
    }

    pub(crate) fn from_error(err: SyncError) -> *mut Self {
        let (error_code, http_status) = match &err {
            SyncError::Remote(api) => match api {
                ApiError::NotFound => (FfiErrorCode::NotFound, 404),
                ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
                ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
                ApiError::SerializationError(_) => (FfiErrorCode::Serialization, 0),
                ApiError::MissingId => (FfiErrorCode::MissingId, 0),
                ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            },
            SyncError::UnknownPost(_) => (FfiErrorCode::UnknownPost, 0),
            SyncError::NotEditing => (FfiErrorCode::NotEditing, 0),
            SyncError::EditInProgress(_) => (FfiErrorCode::EditInProgress, 0),
        };
        Self::boxed(error_code, Some(err.to_string()), http_status)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(format!("null argument: {name}")), 0)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0)
    }
}

// ---------------------------------------------------------------------------
// State snapshots
// ---------------------------------------------------------------------------

/// A post exposed to C. `id` is meaningful only when `has_id` is true.
#[repr(C)]
pub struct FfiPost {
    pub has_id: bool,
    pub id: u64,
    pub title: *mut c_char,
    pub body: *mut c_char,
}

impl FfiPost {
    fn from_core(post: &Post) -> Self {
        FfiPost {
            has_id: post.id.is_some(),
            id: post.id.unwrap_or(0),
            title: to_c_string(post.title.clone()),
            body: to_c_string(post.body.clone()),
        }
    }

    pub(crate) fn free_fields(&self) {
        free_c_string(self.title);
        free_c_string(self.body);
    }
}

#[repr(C)]
pub struct FfiPostList {
    pub items: *mut FfiPost,
    pub len: u32,
}

impl FfiPostList {
    pub(crate) fn from_core(posts: &[Post]) -> *mut Self {
        let items: Vec<FfiPost> = posts.iter().map(FfiPost::from_core).collect();
        let (items, len) = into_raw_vec(items);
        Box::into_raw(Box::new(FfiPostList { items, len }))
    }
}

/// The form draft. `post_id` is meaningful only when `editing` is true.
#[repr(C)]
pub struct FfiDraft {
    pub title: *mut c_char,
    pub body: *mut c_char,
    pub editing: bool,
    pub post_id: u64,
}

impl FfiDraft {
    pub(crate) fn from_core(draft: &Draft) -> *mut Self {
        Box::into_raw(Box::new(FfiDraft {
            title: to_c_string(draft.title.clone()),
            body: to_c_string(draft.body.clone()),
            editing: draft.is_editing(),
            post_id: draft.editing().unwrap_or(0),
        }))
    }
}
