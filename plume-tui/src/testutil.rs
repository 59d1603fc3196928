//! Shared test helpers for `#[cfg(test)]` modules in the crate.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, ApiResult, HttpRequest, HttpResponse, Transport};
use crate::session::SessionContext;
use crate::storage::MemoryStorage;
use plume_types::User;

/// Transport that replays scripted responses in order and records requests.
///
/// An exhausted script answers 500 so a missing expectation fails loudly.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    pub fn push_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 500,
                    body: "unscripted request".to_string(),
                })
            })
    }
}

pub fn alice() -> User {
    User {
        id: 42,
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
    }
}

/// Session logged in as alice with `access-1` / `refresh-1`
pub fn logged_in_session() -> (SessionContext, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let session = SessionContext::hydrate(storage.clone());
    session.set_credentials(&alice(), "access-1").unwrap();
    session.set_refresh_token("refresh-1").unwrap();
    (session, storage)
}

pub fn post_json(id: i64, username: &str, likes: i64, liked: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Post {}", id),
        "content": format!("Body of post {}", id),
        "username": username,
        "created_datetime": "2024-05-01T10:00:00Z",
        "updated_datetime": "2024-05-01T10:00:00Z",
        "likes_count": likes,
        "is_liked": liked,
    })
}

pub fn page_json(posts: &[serde_json::Value], next: Option<&str>) -> String {
    serde_json::json!({
        "results": posts,
        "next": next,
        "previous": null,
    })
    .to_string()
}
