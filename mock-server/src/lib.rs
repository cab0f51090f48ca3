use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct CreatePost {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Posts keyed by id; iteration order is creation order.
#[derive(Debug, Default)]
pub struct Store {
    posts: BTreeMap<u64, Post>,
    next_id: u64,
}

impl Store {
    pub fn with_posts(posts: impl IntoIterator<Item = Post>) -> Self {
        let posts: BTreeMap<u64, Post> = posts.into_iter().map(|p| (p.id, p)).collect();
        let next_id = posts.keys().next_back().copied().unwrap_or(0) + 1;
        Self { posts, next_id }
    }

    /// `count` placeholder posts with ids `1..=count`.
    pub fn seeded(count: u64) -> Self {
        Self::with_posts((1..=count).map(|id| Post {
            id,
            title: format!("post {id}"),
            body: format!("body of post {id}"),
        }))
    }

    fn insert(&mut self, title: String, body: String) -> Post {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let post = Post { id, title, body };
        self.posts.insert(id, post.clone());
        post
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Store::default())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Store::default()).await
}

pub async fn run_with(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(store)).await
}

async fn list_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    let store = db.read().await;
    debug!(count = store.posts.len(), "list posts");
    Json(store.posts.values().cloned().collect())
}

async fn create_post(
    State(db): State<Db>,
    Json(input): Json<CreatePost>,
) -> (StatusCode, Json<Post>) {
    let post = db.write().await.insert(input.title, input.body);
    info!(id = post.id, "created post");
    (StatusCode::CREATED, Json(post))
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    let store = db.read().await;
    store.posts.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UpdatePost>,
) -> Result<Json<Post>, StatusCode> {
    let mut store = db.write().await;
    let post = store.posts.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        post.title = title;
    }
    if let Some(body) = input.body {
        post.body = body;
    }
    info!(id, "updated post");
    Ok(Json(post.clone()))
}

/// Answers `200 {}` like jsonplaceholder does.
async fn delete_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut store = db.write().await;
    store.posts.remove(&id).ok_or(StatusCode::NOT_FOUND)?;
    info!(id, "deleted post");
    Ok(Json(serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_serializes_to_json() {
        let post = Post {
            id: 1,
            title: "Test".to_string(),
            body: "Body".to_string(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "title": "Test", "body": "Body"}));
    }

    #[test]
    fn create_post_defaults_body_to_empty() {
        let input: CreatePost = serde_json::from_str(r#"{"title":"No body"}"#).unwrap();
        assert_eq!(input.title, "No body");
        assert_eq!(input.body, "");
    }

    #[test]
    fn create_post_rejects_missing_title() {
        let result: Result<CreatePost, _> = serde_json::from_str(r#"{"body":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_post_all_fields_optional() {
        let input: UpdatePost = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.title.is_none());
        assert!(input.body.is_none());
    }

    #[test]
    fn store_assigns_increasing_ids() {
        let mut store = Store::default();
        assert_eq!(store.insert("a".into(), String::new()).id, 1);
        assert_eq!(store.insert("b".into(), String::new()).id, 2);
    }

    #[test]
    fn seeded_store_continues_after_last_id() {
        let mut store = Store::seeded(3);
        assert_eq!(store.posts.len(), 3);
        assert_eq!(store.insert("next".into(), String::new()).id, 4);
    }
}
