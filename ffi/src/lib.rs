//! C-ABI wrapper around `posts-core`.
//!
//! # Overview
//! Exposes the posts synchronizer through `extern "C"` functions so a mobile
//! host (Swift, Kotlin via JNI, Dart FFI) can keep its list screen in sync
//! with the server while doing the HTTP itself:
//!
//! 1. `posts_begin_*` returns an `FfiPending` with the request to execute.
//! 2. The host executes it with its platform HTTP stack.
//! 3. `posts_complete` (or `posts_fail` on a transport error) applies the
//!    outcome; `posts_snapshot` / `posts_draft` read the new state.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - The C caller owns all returned pointers and must call the matching
//!   `posts_free_*` function to release them.
//! - A handle must not be used from two threads at once.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use posts_core::{ApiError, ClientConfig, HttpResponse, PostSync, PostsClient};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use types::*;

/// Read a C string, treating invalid UTF-8 as empty.
fn read_str(s: *const c_char) -> String {
    unsafe { CStr::from_ptr(s) }.to_str().unwrap_or("").to_string()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Route `tracing` output to stderr, filtered by `RUST_LOG` (default
/// `info`). Returns false if a subscriber was already installed.
#[unsafe(no_mangle)]
pub extern "C" fn posts_init_logging() -> bool {
    catch_unwind(|| {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init()
            .is_ok()
    })
    .unwrap_or(false)
}

/// Create a synchronizer for `{base_url}/posts` with an empty list.
///
/// A null `base_url` falls back to `POSTS_BASE_URL` / `POSTS_RESOURCE` and
/// then to the public jsonplaceholder endpoint.
/// The caller must free the returned pointer with `posts_sync_free`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_sync_new(base_url: *const c_char) -> *mut FfiPostSync {
    catch_unwind(|| {
        let client = if base_url.is_null() {
            PostsClient::from_config(&ClientConfig::from_env())
        } else {
            PostsClient::new(&read_str(base_url))
        };
        info!(url = client.collection_url(), "created posts sync handle");
        Box::into_raw(Box::new(FfiPostSync {
            inner: PostSync::new(client),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a synchronizer created by `posts_sync_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_sync_free(sync: *mut FfiPostSync) {
    if !sync.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(sync) });
        });
    }
}

// ---------------------------------------------------------------------------
// Draft (local, no request)
// ---------------------------------------------------------------------------

/// Returns false if either argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_set_title(sync: *mut FfiPostSync, title: *const c_char) -> bool {
    catch_unwind(|| {
        if sync.is_null() || title.is_null() {
            return false;
        }
        unsafe { &mut *sync }.inner.set_title(read_str(title));
        true
    })
    .unwrap_or(false)
}

/// Returns false if either argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_set_body(sync: *mut FfiPostSync, body: *const c_char) -> bool {
    catch_unwind(|| {
        if sync.is_null() || body.is_null() {
            return false;
        }
        unsafe { &mut *sync }.inner.set_body(read_str(body));
        true
    })
    .unwrap_or(false)
}

/// Load the post at `index` (as in `posts_snapshot`) into the draft.
///
/// Returns false if `sync` is null or `index` is out of range.
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_edit(sync: *mut FfiPostSync, index: u32) -> bool {
    catch_unwind(|| {
        if sync.is_null() {
            return false;
        }
        let sync = unsafe { &mut *sync };
        match sync.inner.posts().get(index as usize).cloned() {
            Some(post) => {
                sync.inner.begin_edit(&post);
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Drop the draft and return to creating mode. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_cancel_edit(sync: *mut FfiPostSync) {
    if !sync.is_null() {
        let _ = catch_unwind(|| {
            unsafe { &mut *sync }.inner.cancel_edit();
        });
    }
}

// ---------------------------------------------------------------------------
// Begin remote operations
// ---------------------------------------------------------------------------

/// Start a full reload of the list.
///
/// Returns null if `sync` is null.
/// The caller passes the result to `posts_complete` / `posts_fail`, or frees
/// it with `posts_free_pending` to abandon the operation.
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_refresh(sync: *const FfiPostSync) -> *mut FfiPending {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        FfiPending::from_core(unsafe { &*sync }.inner.begin_refresh())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Start creating a post from the draft.
///
/// Returns null if `sync` is null or the draft is editing an existing post.
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_create(sync: *const FfiPostSync) -> *mut FfiPending {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*sync }.inner.begin_create() {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Start patching the edited post with the draft.
///
/// Returns null if `sync` is null, the draft is not editing, or the edited
/// post is no longer in the list.
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_update(sync: *const FfiPostSync) -> *mut FfiPending {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*sync }.inner.begin_update() {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Update when editing, create otherwise (the form's submit button).
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_submit(sync: *const FfiPostSync) -> *mut FfiPending {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*sync }.inner.begin_submit() {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Start deleting post `id`.
///
/// Returns null if `sync` is null or `id` is not in the list.
#[unsafe(no_mangle)]
pub extern "C" fn posts_begin_delete(sync: *const FfiPostSync, id: u64) -> *mut FfiPending {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        match unsafe { &*sync }.inner.begin_delete(id) {
            Ok(pending) => FfiPending::from_core(pending),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Finish remote operations
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        read_str(resp.body)
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Take ownership of a pending handle, returning the operation it carried.
fn take_pending(pending: *mut FfiPending) -> posts_core::Operation {
    let mut pending = unsafe { Box::from_raw(pending) };
    pending.request.free_fields();
    pending.operation()
}

/// Apply the server's response to a pending operation.
///
/// Always consumes `pending` when it is non-null. The caller must free the
/// returned pointer with `posts_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_complete(
    sync: *mut FfiPostSync,
    pending: *mut FfiPending,
    response: *const FfiHttpResponse,
) -> *mut FfiSyncResult {
    catch_unwind(|| {
        if pending.is_null() {
            return FfiSyncResult::null_arg("pending");
        }
        let operation = take_pending(pending);
        if sync.is_null() {
            return FfiSyncResult::null_arg("sync");
        }
        if response.is_null() {
            return FfiSyncResult::null_arg("response");
        }
        let sync = unsafe { &mut *sync };
        let core_resp = ffi_response_to_core(unsafe { &*response });
        match sync.inner.complete(operation, core_resp) {
            Ok(()) => FfiSyncResult::ok(),
            Err(e) => FfiSyncResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiSyncResult::panic("panic in posts_complete"))
}

/// Report that a pending operation got no response (connection refused,
/// timeout, ...). `message` may be null. Always consumes `pending`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_fail(
    sync: *mut FfiPostSync,
    pending: *mut FfiPending,
    message: *const c_char,
) -> *mut FfiSyncResult {
    catch_unwind(|| {
        if pending.is_null() {
            return FfiSyncResult::null_arg("pending");
        }
        let operation = take_pending(pending);
        if sync.is_null() {
            return FfiSyncResult::null_arg("sync");
        }
        let message = if message.is_null() {
            "no response".to_string()
        } else {
            read_str(message)
        };
        let sync = unsafe { &mut *sync };
        match sync.inner.fail(operation, ApiError::Transport(message)) {
            Ok(()) => FfiSyncResult::ok(),
            Err(e) => FfiSyncResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiSyncResult::panic("panic in posts_fail"))
}

// ---------------------------------------------------------------------------
// Read state
// ---------------------------------------------------------------------------

/// Copy the first `limit` posts (0 means all).
///
/// Returns null if `sync` is null.
/// The caller must free the returned pointer with `posts_free_post_list`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_snapshot(sync: *const FfiPostSync, limit: u32) -> *mut FfiPostList {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        let state = unsafe { &*sync }.inner.state();
        let posts = if limit == 0 {
            state.posts.as_slice()
        } else {
            state.page(limit as usize)
        };
        FfiPostList::from_core(posts)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Copy the current draft.
///
/// Returns null if `sync` is null.
/// The caller must free the returned pointer with `posts_free_draft`.
#[unsafe(no_mangle)]
pub extern "C" fn posts_draft(sync: *const FfiPostSync) -> *mut FfiDraft {
    catch_unwind(|| {
        if sync.is_null() {
            return std::ptr::null_mut();
        }
        FfiDraft::from_core(unsafe { &*sync }.inner.draft())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Abandon a pending operation without applying anything. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_pending(pending: *mut FfiPending) {
    if !pending.is_null() {
        let _ = catch_unwind(|| {
            take_pending(pending);
        });
    }
}

/// Free an `FfiSyncResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_result(result: *mut FfiSyncResult) {
    if !result.is_null() {
        let _ = catch_unwind(|| {
            let result = unsafe { Box::from_raw(result) };
            free_c_string(result.error_message);
        });
    }
}

/// Free an `FfiPostList` returned by `posts_snapshot`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_post_list(list: *mut FfiPostList) {
    if !list.is_null() {
        let _ = catch_unwind(|| {
            let list = unsafe { Box::from_raw(list) };
            for post in unsafe { from_raw_vec(list.items, list.len) } {
                post.free_fields();
            }
        });
    }
}

/// Free an `FfiDraft` returned by `posts_draft`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_draft(draft: *mut FfiDraft) {
    if !draft.is_null() {
        let _ = catch_unwind(|| {
            let draft = unsafe { Box::from_raw(draft) };
            free_c_string(draft.title);
            free_c_string(draft.body);
        });
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn posts_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
