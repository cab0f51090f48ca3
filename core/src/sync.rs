//! Local mirror of the remote posts collection.
//!
//! # Design
//! `PostSync` owns an explicit `SyncState` (the ordered post list plus the
//! form draft) and keeps it consistent with the server one operation at a
//! time. Each remote operation has two halves:
//!
//! - `begin_*` checks preconditions against the current state and returns a
//!   `Pending` holding the `HttpRequest` to execute. Nothing is mutated.
//! - `complete` (or `fail`, when no response arrived) applies the outcome.
//!
//! The host may await the network between the halves and may have several
//! operations in flight; `complete` re-checks the state it is about to touch.
//! Whatever is stored always comes from the server response, never from the
//! submitted draft. On any error the state is left exactly as it was.

use tracing::{debug, error, info, warn};

use crate::client::PostsClient;
use crate::draft::Draft;
use crate::error::{ApiError, SyncError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::Post;

/// Number of posts a list screen shows by default.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Which remote operation a `Pending` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Create,
    Update(u64),
    Delete(u64),
}

/// A started operation waiting for its HTTP round-trip.
#[derive(Debug, Clone)]
pub struct Pending {
    pub operation: Operation,
    pub request: HttpRequest,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub posts: Vec<Post>,
    pub draft: Draft,
}

impl SyncState {
    pub fn position(&self, id: u64) -> Option<usize> {
        self.posts.iter().position(|p| p.id == Some(id))
    }

    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: u64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == Some(id))
    }

    /// The first `limit` posts.
    pub fn page(&self, limit: usize) -> &[Post] {
        &self.posts[..limit.min(self.posts.len())]
    }
}

#[derive(Debug, Clone)]
pub struct PostSync {
    client: PostsClient,
    state: SyncState,
}

impl PostSync {
    pub fn new(client: PostsClient) -> Self {
        Self::with_state(client, SyncState::default())
    }

    pub fn with_state(client: PostsClient, state: SyncState) -> Self {
        Self { client, state }
    }

    pub fn client(&self) -> &PostsClient {
        &self.client
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn posts(&self) -> &[Post] {
        &self.state.posts
    }

    pub fn draft(&self) -> &Draft {
        &self.state.draft
    }

    pub fn into_state(self) -> SyncState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Local draft operations
    // -----------------------------------------------------------------------

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.state.draft.set_title(title);
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.state.draft.set_body(body);
    }

    /// Load `post` into the draft and switch to editing it. No request.
    pub fn begin_edit(&mut self, post: &Post) {
        debug!(id = ?post.id, "editing post");
        self.state.draft.load(post);
    }

    pub fn cancel_edit(&mut self) {
        self.state.draft.reset();
    }

    // -----------------------------------------------------------------------
    // Starting remote operations
    // -----------------------------------------------------------------------

    pub fn begin_refresh(&self) -> Pending {
        Pending {
            operation: Operation::Refresh,
            request: self.client.build_list_posts(),
        }
    }

    pub fn begin_create(&self) -> Result<Pending, SyncError> {
        if let Some(id) = self.state.draft.editing() {
            return Err(rejected("create", SyncError::EditInProgress(id)));
        }
        let request = self.client.build_create_post(&self.state.draft.to_new_post())?;
        Ok(Pending {
            operation: Operation::Create,
            request,
        })
    }

    /// Patch the post the draft is editing with the draft's fields.
    pub fn begin_update(&self) -> Result<Pending, SyncError> {
        let Some(id) = self.state.draft.editing() else {
            return Err(rejected("update", SyncError::NotEditing));
        };
        if !self.state.contains(id) {
            return Err(rejected("update", SyncError::UnknownPost(id)));
        }
        let request = self.client.build_update_post(id, &self.state.draft.to_patch())?;
        Ok(Pending {
            operation: Operation::Update(id),
            request,
        })
    }

    /// Update when editing, create otherwise.
    pub fn begin_submit(&self) -> Result<Pending, SyncError> {
        if self.state.draft.is_editing() {
            self.begin_update()
        } else {
            self.begin_create()
        }
    }

    pub fn begin_delete(&self, id: u64) -> Result<Pending, SyncError> {
        if !self.state.contains(id) {
            return Err(rejected("delete", SyncError::UnknownPost(id)));
        }
        Ok(Pending {
            operation: Operation::Delete(id),
            request: self.client.build_delete_post(id),
        })
    }

    // -----------------------------------------------------------------------
    // Finishing remote operations
    // -----------------------------------------------------------------------

    /// Apply the server's answer to `operation`.
    pub fn complete(
        &mut self,
        operation: Operation,
        response: HttpResponse,
    ) -> Result<(), SyncError> {
        let result = self.apply(operation, response);
        if let Err(err) = &result {
            report(operation, err);
        }
        result
    }

    /// Record that `operation` produced no response at all.
    pub fn fail(&mut self, operation: Operation, err: ApiError) -> Result<(), SyncError> {
        let err = SyncError::Remote(err);
        report(operation, &err);
        Err(err)
    }

    fn apply(&mut self, operation: Operation, response: HttpResponse) -> Result<(), SyncError> {
        match operation {
            Operation::Refresh => {
                let posts = self.client.parse_list_posts(response)?;
                info!(count = posts.len(), "refreshed posts");
                self.state.posts = posts;
            }
            Operation::Create => {
                let post = self.client.parse_create_post(response)?;
                let id = post.id.ok_or(ApiError::MissingId)?;
                if let Some(stale) = self.state.position(id) {
                    warn!(id, "server reused an id already in the list, replacing it");
                    self.state.posts.remove(stale);
                }
                info!(id, "created post");
                self.state.posts.insert(0, post);
                if !self.state.draft.is_editing() {
                    self.state.draft.reset();
                }
            }
            Operation::Update(id) => {
                let post = self.client.parse_update_post(response)?;
                match post.id {
                    Some(returned) if returned == id => {}
                    Some(returned) => {
                        return Err(ApiError::DeserializationError(format!(
                            "expected post {id}, server returned post {returned}"
                        ))
                        .into())
                    }
                    None => return Err(ApiError::MissingId.into()),
                }
                let index = self.state.position(id).ok_or(SyncError::UnknownPost(id))?;
                info!(id, "updated post");
                self.state.posts[index] = post;
                if self.state.draft.editing() == Some(id) {
                    self.state.draft.reset();
                }
            }
            Operation::Delete(id) => {
                self.client.parse_delete_post(response)?;
                match self.state.position(id) {
                    Some(index) => {
                        info!(id, "deleted post");
                        self.state.posts.remove(index);
                    }
                    None => debug!(id, "deleted post was already gone locally"),
                }
                if self.state.draft.editing() == Some(id) {
                    self.state.draft.reset();
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Blocking drivers
    // -----------------------------------------------------------------------

    pub fn refresh<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SyncError> {
        let pending = self.begin_refresh();
        self.run(transport, pending)
    }

    pub fn create<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SyncError> {
        let pending = self.begin_create()?;
        self.run(transport, pending)
    }

    pub fn update<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SyncError> {
        let pending = self.begin_update()?;
        self.run(transport, pending)
    }

    pub fn submit<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SyncError> {
        let pending = self.begin_submit()?;
        self.run(transport, pending)
    }

    pub fn delete<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        id: u64,
    ) -> Result<(), SyncError> {
        let pending = self.begin_delete(id)?;
        self.run(transport, pending)
    }

    fn run<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        pending: Pending,
    ) -> Result<(), SyncError> {
        let Pending { operation, request } = pending;
        match transport.execute(request) {
            Ok(response) => self.complete(operation, response),
            Err(err) => self.fail(operation, err),
        }
    }
}

fn rejected(action: &str, err: SyncError) -> SyncError {
    warn!(action, %err, "operation rejected");
    err
}

fn report(operation: Operation, err: &SyncError) {
    if err.is_remote() {
        error!(?operation, %err, "remote operation failed");
    } else {
        warn!(?operation, %err, "discarded stale response");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::draft::DraftMode;
    use crate::http::HttpMethod;

    /// Replays canned outcomes and records every request it sees.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: VecDeque<Result<HttpResponse, ApiError>>,
        requests: Vec<HttpRequest>,
    }

    impl ScriptedTransport {
        fn respond(status: u16, body: &str) -> Self {
            let mut transport = Self::default();
            transport.outcomes.push_back(Ok(response(status, body)));
            transport
        }

        fn unreachable() -> Self {
            let mut transport = Self::default();
            transport
                .outcomes
                .push_back(Err(ApiError::Transport("connection refused".to_string())));
            transport
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.push(request);
            self.outcomes
                .pop_front()
                .expect("transport called more often than scripted")
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn sync_with(posts: Vec<Post>) -> PostSync {
        PostSync::with_state(
            PostsClient::new("http://localhost:3000"),
            SyncState {
                posts,
                draft: Draft::new(),
            },
        )
    }

    fn titled(id: u64, title: &str) -> Post {
        Post::new(id, title, "")
    }

    #[test]
    fn refresh_replaces_wholesale() {
        let mut sync = sync_with(vec![titled(1, "A"), titled(2, "B")]);
        let mut transport =
            ScriptedTransport::respond(200, r#"[{"id":3,"title":"C","body":""}]"#);

        sync.refresh(&mut transport).unwrap();

        assert_eq!(sync.posts(), &[titled(3, "C")]);
        assert_eq!(transport.requests[0].method, HttpMethod::Get);
    }

    #[test]
    fn refresh_leaves_draft_alone() {
        let mut sync = sync_with(vec![titled(1, "A")]);
        sync.begin_edit(&titled(1, "A"));
        sync.set_body("half typed");
        let draft_before = sync.draft().clone();
        let mut transport = ScriptedTransport::respond(200, "[]");

        sync.refresh(&mut transport).unwrap();

        assert!(sync.posts().is_empty());
        assert_eq!(sync.draft(), &draft_before);
    }

    #[test]
    fn create_stores_server_response_at_front() {
        let mut sync = sync_with(vec![titled(1, "A")]);
        sync.set_title("x");
        sync.set_body("y");
        let mut transport =
            ScriptedTransport::respond(201, r#"{"id":5,"title":"x","body":"y","userId":1}"#);

        sync.create(&mut transport).unwrap();

        assert_eq!(sync.posts(), &[Post::new(5, "x", "y"), titled(1, "A")]);
        assert_eq!(sync.draft(), &Draft::new());
        let sent: serde_json::Value =
            serde_json::from_str(transport.requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({"title": "x", "body": "y"}));
    }

    #[test]
    fn create_keeps_server_normalization() {
        let mut sync = sync_with(Vec::new());
        sync.set_title("  padded  ");
        let mut transport =
            ScriptedTransport::respond(201, r#"{"id":9,"title":"padded","body":""}"#);

        sync.create(&mut transport).unwrap();

        assert_eq!(sync.posts()[0].title, "padded");
    }

    #[test]
    fn create_without_assigned_id_fails() {
        let mut sync = sync_with(vec![titled(1, "A")]);
        sync.set_title("x");
        let before = sync.state().clone();
        let mut transport = ScriptedTransport::respond(201, r#"{"title":"x","body":""}"#);

        let err = sync.create(&mut transport).unwrap_err();

        assert_eq!(err, SyncError::Remote(ApiError::MissingId));
        assert_eq!(sync.state(), &before);
    }

    #[test]
    fn create_with_reused_id_keeps_ids_unique() {
        let mut sync = sync_with(vec![titled(1, "A"), titled(101, "first")]);
        sync.set_title("second");
        let mut transport =
            ScriptedTransport::respond(201, r#"{"id":101,"title":"second","body":""}"#);

        sync.create(&mut transport).unwrap();

        assert_eq!(sync.posts(), &[titled(101, "second"), titled(1, "A")]);
    }

    #[test]
    fn create_while_editing_is_rejected_without_request() {
        let mut sync = sync_with(vec![titled(1, "A")]);
        sync.begin_edit(&titled(1, "A"));
        let mut transport = ScriptedTransport::default();

        let err = sync.create(&mut transport).unwrap_err();

        assert_eq!(err, SyncError::EditInProgress(1));
        assert!(transport.requests.is_empty());
    }

    #[test]
    fn update_replaces_by_id_with_server_response() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.begin_edit(&titled(1, "a"));
        sync.set_title("z");
        let mut transport = ScriptedTransport::respond(200, r#"{"id":1,"title":"z","body":""}"#);

        sync.update(&mut transport).unwrap();

        assert_eq!(sync.posts(), &[titled(1, "z"), titled(2, "b")]);
        assert_eq!(sync.draft(), &Draft::new());
        let request = &transport.requests[0];
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.path, "http://localhost:3000/posts/1");
    }

    #[test]
    fn update_stores_fields_the_server_added() {
        let mut sync = sync_with(vec![titled(1, "a")]);
        sync.begin_edit(&titled(1, "a"));
        let mut transport =
            ScriptedTransport::respond(200, r#"{"id":1,"title":"a","body":"filled in"}"#);

        sync.update(&mut transport).unwrap();

        assert_eq!(sync.posts()[0].body, "filled in");
    }

    #[test]
    fn update_with_mismatched_id_fails() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.begin_edit(&titled(1, "a"));
        let before = sync.state().clone();
        let mut transport = ScriptedTransport::respond(200, r#"{"id":2,"title":"a","body":""}"#);

        let err = sync.update(&mut transport).unwrap_err();

        assert!(err.is_remote());
        assert_eq!(sync.state(), &before);
    }

    #[test]
    fn update_without_edit_mode_is_rejected() {
        let sync = sync_with(vec![titled(1, "a")]);
        assert_eq!(sync.begin_update().unwrap_err(), SyncError::NotEditing);
    }

    #[test]
    fn update_of_missing_post_is_rejected_without_request() {
        let mut sync = sync_with(vec![titled(1, "a")]);
        sync.begin_edit(&titled(7, "gone"));
        let mut transport = ScriptedTransport::default();

        let err = sync.update(&mut transport).unwrap_err();

        assert_eq!(err, SyncError::UnknownPost(7));
        assert!(transport.requests.is_empty());
    }

    #[test]
    fn update_racing_delete_does_not_resurrect_post() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.begin_edit(&titled(1, "a"));
        sync.set_title("z");
        let update = sync.begin_update().unwrap();
        let delete = sync.begin_delete(1).unwrap();

        sync.complete(delete.operation, response(200, "{}")).unwrap();
        let err = sync
            .complete(update.operation, response(200, r#"{"id":1,"title":"z","body":""}"#))
            .unwrap_err();

        assert_eq!(err, SyncError::UnknownPost(1));
        assert_eq!(sync.posts(), &[titled(2, "b")]);
    }

    #[test]
    fn update_finishing_after_new_edit_keeps_new_draft() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.begin_edit(&titled(1, "a"));
        let update = sync.begin_update().unwrap();
        sync.begin_edit(&titled(2, "b"));

        sync.complete(update.operation, response(200, r#"{"id":1,"title":"a2","body":""}"#))
            .unwrap();

        assert_eq!(sync.posts()[0].title, "a2");
        assert_eq!(sync.draft().mode, DraftMode::Editing(2));
    }

    #[test]
    fn submit_dispatches_on_draft_mode() {
        let mut sync = sync_with(vec![titled(1, "a")]);
        assert_eq!(sync.begin_submit().unwrap().operation, Operation::Create);
        sync.begin_edit(&titled(1, "a"));
        assert_eq!(sync.begin_submit().unwrap().operation, Operation::Update(1));
    }

    #[test]
    fn delete_removes_by_id_and_keeps_order() {
        let mut sync = sync_with(vec![titled(1, ""), titled(2, ""), titled(3, "")]);
        let mut transport = ScriptedTransport::respond(200, "{}");

        sync.delete(&mut transport, 2).unwrap();

        assert_eq!(sync.posts(), &[titled(1, ""), titled(3, "")]);
        assert_eq!(transport.requests[0].method, HttpMethod::Delete);
    }

    #[test]
    fn delete_of_edited_post_resets_draft() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.begin_edit(&titled(2, "b"));
        let mut transport = ScriptedTransport::respond(204, "");

        sync.delete(&mut transport, 2).unwrap();

        assert_eq!(sync.draft(), &Draft::new());
    }

    #[test]
    fn delete_of_unknown_id_is_rejected() {
        let sync = sync_with(vec![titled(1, "a")]);
        assert_eq!(sync.begin_delete(5).unwrap_err(), SyncError::UnknownPost(5));
    }

    #[test]
    fn failures_leave_state_untouched() {
        let mut sync = sync_with(vec![titled(1, "a"), titled(2, "b")]);
        sync.set_title("typed");
        let before = sync.state().clone();

        assert!(sync.refresh(&mut ScriptedTransport::unreachable()).unwrap_err().is_remote());
        assert_eq!(sync.state(), &before);

        assert!(sync
            .create(&mut ScriptedTransport::respond(500, "boom"))
            .unwrap_err()
            .is_remote());
        assert_eq!(sync.state(), &before);

        assert!(sync
            .delete(&mut ScriptedTransport::respond(404, ""), 2)
            .unwrap_err()
            .is_remote());
        assert_eq!(sync.state(), &before);

        sync.begin_edit(&titled(1, "a"));
        let editing = sync.state().clone();
        assert!(sync
            .update(&mut ScriptedTransport::respond(200, "not json"))
            .unwrap_err()
            .is_remote());
        assert_eq!(sync.state(), &editing);
    }

    #[test]
    fn begin_edit_is_local() {
        let mut sync = sync_with(vec![titled(1, "a")]);
        let transport = ScriptedTransport::default();

        sync.begin_edit(&Post::new(1, "title", "body"));

        assert!(transport.requests.is_empty());
        assert_eq!(sync.draft().title, "title");
        assert_eq!(sync.draft().body, "body");
        assert_eq!(sync.draft().editing(), Some(1));
    }

    #[test]
    fn cancel_edit_returns_to_creating() {
        let mut sync = sync_with(vec![titled(1, "a")]);
        sync.begin_edit(&titled(1, "a"));
        sync.cancel_edit();
        assert_eq!(sync.draft(), &Draft::new());
    }

    #[test]
    fn page_is_clamped_to_list_length() {
        let posts: Vec<Post> = (1..=12).map(|id| titled(id, "")).collect();
        let state = SyncState {
            posts,
            draft: Draft::new(),
        };
        assert_eq!(state.page(DEFAULT_PAGE_SIZE).len(), 10);
        assert_eq!(state.page(50).len(), 12);
        assert!(state.page(0).is_empty());
    }
}
