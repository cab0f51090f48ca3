//! Domain DTOs for the posts resource.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently
//! so the FFI surface is not coupled to Axum internals. Integration tests
//! catch schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// A single post as known to the client.
///
/// `id` is `None` until the server has assigned one. Servers are free to
/// return extra fields (jsonplaceholder adds `userId`); they are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Post {
    pub fn new(id: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Request payload for creating a post. The server assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

/// Request payload for a partial update. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_ignores_unknown_fields() {
        let post: Post =
            serde_json::from_str(r#"{"userId":1,"id":7,"title":"t","body":"b"}"#).unwrap();
        assert_eq!(post, Post::new(7, "t", "b"));
    }

    #[test]
    fn post_without_id_deserializes_to_none() {
        let post: Post = serde_json::from_str(r#"{"title":"draft"}"#).unwrap();
        assert_eq!(post.id, None);
        assert_eq!(post.title, "draft");
        assert_eq!(post.body, "");
    }

    #[test]
    fn post_without_id_omits_it_when_serialized() {
        let json = serde_json::to_value(Post::default()).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["title"], "");
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = PostPatch {
            title: Some("only title".to_string()),
            body: None,
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["title"], "only title");
        assert!(json.get("body").is_none());
    }
}
