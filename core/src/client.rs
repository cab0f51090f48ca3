//! Stateless HTTP request builder and response parser for the posts resource.
//!
//! # Design
//! `PostsClient` holds only the collection URL and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the round-trip, which keeps the core
//! deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewPost, Post, PostPatch};

/// Synchronous, stateless client for a JSON posts collection.
#[derive(Debug, Clone)]
pub struct PostsClient {
    collection_url: String,
}

impl PostsClient {
    /// Client for `{base_url}/posts`.
    pub fn new(base_url: &str) -> Self {
        Self::with_resource(base_url, crate::config::DEFAULT_RESOURCE)
    }

    pub fn with_resource(base_url: &str, resource: &str) -> Self {
        Self {
            collection_url: format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                resource.trim_matches('/')
            ),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_resource(&config.base_url, &config.resource)
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn build_list_posts(&self) -> HttpRequest {
        self.request(HttpMethod::Get, self.collection_url.clone(), None)
    }

    pub fn build_get_post(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Get, self.item_url(id), None)
    }

    pub fn build_create_post(&self, input: &NewPost) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Post, self.collection_url.clone(), Some(body)))
    }

    pub fn build_update_post(&self, id: u64, input: &PostPatch) -> Result<HttpRequest, ApiError> {
        let body = to_json(input)?;
        Ok(self.request(HttpMethod::Patch, self.item_url(id), Some(body)))
    }

    pub fn build_delete_post(&self, id: u64) -> HttpRequest {
        self.request(HttpMethod::Delete, self.item_url(id), None)
    }

    pub fn parse_list_posts(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_get_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<Post, ApiError> {
        check_status(&response)?;
        from_json(&response.body)
    }

    /// The acknowledgement body differs between servers (`{}`, empty, the
    /// deleted post) and is not inspected.
    pub fn parse_delete_post(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/{id}", self.collection_url)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        debug!(method = method.as_str(), %path, "built request");
        let headers = if body.is_some() {
            vec![("content-type".to_string(), "application/json".to_string())]
        } else {
            Vec::new()
        };
        HttpRequest {
            method,
            path,
            headers,
            body,
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
