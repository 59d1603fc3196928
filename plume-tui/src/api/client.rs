use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use super::{ApiError, ApiResult};
use crate::session::SessionContext;
use plume_types::*;

/// Which page of the feed to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// First page, optionally restricted to usernames containing the filter
    First { filter: Option<String> },
    /// A `next` cursor exactly as the server returned it
    Cursor(String),
}

impl PageRequest {
    /// First page for a raw filter string. Blank filters mean "everyone".
    pub fn first(filter: &str) -> Self {
        let trimmed = filter.trim();
        PageRequest::First {
            filter: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }
}

/// API client for the Plume backend.
///
/// Authenticated calls read the access token from the session at send time
/// and go through a single refresh-and-retry when the backend answers 401.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    /// Create a new API client using reqwest
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()), base_url, session)
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        session: SessionContext,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the URL for a page request. Cursors are replayed verbatim and the
    /// filter is only ever applied to the first page.
    pub fn page_url(&self, request: &PageRequest) -> String {
        match request {
            PageRequest::First { filter } => {
                let mut url = self.endpoint("/post/");
                if let Some(filter) = filter {
                    url.push_str("?user__username__icontains=");
                    url.push_str(&urlencoding::encode(filter));
                }
                url
            }
            PageRequest::Cursor(next) => {
                if next.starts_with("http://") || next.starts_with("https://") {
                    next.clone()
                } else {
                    format!("{}/{}", self.base_url, next.trim_start_matches('/'))
                }
            }
        }
    }

    /// Map a raw response into a typed result
    fn decode<T: DeserializeOwned>(response: HttpResponse) -> ApiResult<T> {
        let response = Self::check_status(response)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    fn check_status(response: HttpResponse) -> ApiResult<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }

        let HttpResponse { status, body } = response;

        // Clean up HTML error pages from proxies
        let body = if body.contains("<html>") || body.contains("<!DOCTYPE") {
            format!("Server returned {} error. Please check the server URL.", status)
        } else {
            body
        };

        match status {
            404 => Err(ApiError::NotFound(body)),
            401 => Err(ApiError::Unauthorized(body)),
            400 => Err(ApiError::BadRequest(body)),
            _ => Err(ApiError::Api { status, body }),
        }
    }

    /// Send without credentials (login, register, refresh)
    async fn send_public(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        log::debug!(target: "api_calls", "{} {}", request.method, request.url);
        self.transport.send(&request).await
    }

    /// Send with the stored bearer token, refreshing once on 401
    async fn send_authorized(&self, mut request: HttpRequest) -> ApiResult<HttpResponse> {
        request.bearer = self.session.access_token();
        log::debug!(target: "api_calls", "{} {}", request.method, request.url);

        let response = self.transport.send(&request).await?;
        if response.status != 401 || request.retried {
            return Ok(response);
        }

        request.retried = true;
        log::info!("Intercepted 401 on {}, refreshing access token", request.url);

        let access_token = match self.refresh_access_token().await {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Token refresh failed, clearing session: {}", e);
                self.session.teardown();
                return Err(ApiError::SessionExpired(e.to_string()));
            }
        };

        log::info!("Refreshed access token, retrying {}", request.url);
        request.bearer = Some(access_token);
        self.transport.send(&request).await
    }

    /// Exchange the stored refresh token for a new access token
    async fn refresh_access_token(&self) -> ApiResult<String> {
        let refresh = self
            .session
            .refresh_token()
            .ok_or_else(|| ApiError::Unauthorized("No refresh token found".to_string()))?;

        let request = HttpRequest::new(Method::POST, self.endpoint("/auth/refresh/"))
            .with_json(&RefreshRequest { refresh })?;
        let response = self.send_public(request).await?;
        let RefreshResponse { access } = Self::decode(response)?;

        self.session
            .store_access_token(&access)
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        Ok(access)
    }

    // Authentication endpoints

    /// Exchange credentials for an access/refresh token pair
    pub async fn login(&self, email: String, password: String) -> ApiResult<LoginResponse> {
        let request = HttpRequest::new(Method::POST, self.endpoint("/auth/login/"))
            .with_json(&LoginRequest { email, password })?;
        let response = self.send_public(request).await?;
        Self::decode(response)
    }

    /// Create an account. Field errors come back as `BadRequest` with the raw body
    pub async fn register(&self, username: String, email: String, password: String) -> ApiResult<()> {
        let request = HttpRequest::new(Method::POST, self.endpoint("/auth/register/"))
            .with_json(&RegisterRequest {
                username,
                email,
                password,
            })?;
        let response = self.send_public(request).await?;
        Self::check_status(response)?;
        Ok(())
    }

    // Post endpoints

    /// Fetch one page of the feed
    pub async fn list_posts(&self, page: &PageRequest) -> ApiResult<Page<Post>> {
        let request = HttpRequest::new(Method::GET, self.page_url(page));
        let response = self.send_authorized(request).await?;
        let payload: Page<PostPayload> = Self::decode(response)?;

        let viewer = self.session.current_user_id();
        Ok(payload.map(|post| post.into_post(viewer)))
    }

    /// Get a single post by ID
    pub async fn get_post(&self, post_id: PostId) -> ApiResult<Post> {
        let request = HttpRequest::new(Method::GET, self.endpoint(&format!("/post/{}/", post_id)));
        let response = self.send_authorized(request).await?;
        let payload: PostPayload = Self::decode(response)?;
        Ok(payload.into_post(self.session.current_user_id()))
    }

    /// Create a new post
    pub async fn create_post(&self, title: String, content: String) -> ApiResult<Post> {
        let request = HttpRequest::new(Method::POST, self.endpoint("/post/"))
            .with_json(&CreatePostRequest { title, content })?;
        let response = self.send_authorized(request).await?;
        let payload: PostPayload = Self::decode(response)?;
        Ok(payload.into_post(self.session.current_user_id()))
    }

    /// Update title and/or content of a post
    pub async fn update_post(&self, post_id: PostId, update: UpdatePostRequest) -> ApiResult<Post> {
        let request = HttpRequest::new(Method::PATCH, self.endpoint(&format!("/post/{}/", post_id)))
            .with_json(&update)?;
        let response = self.send_authorized(request).await?;
        let payload: PostPayload = Self::decode(response)?;
        Ok(payload.into_post(self.session.current_user_id()))
    }

    /// Delete a post
    pub async fn delete_post(&self, post_id: PostId) -> ApiResult<()> {
        let request = HttpRequest::new(Method::DELETE, self.endpoint(&format!("/post/{}/", post_id)));
        let response = self.send_authorized(request).await?;
        Self::check_status(response)?;
        Ok(())
    }

    /// Toggle the current user's like on a post
    pub async fn toggle_like(&self, post_id: PostId) -> ApiResult<()> {
        let request = HttpRequest::new(Method::POST, self.endpoint(&format!("/post/{}/like/", post_id)));
        let response = self.send_authorized(request).await?;
        Self::check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{keys, StorageAdapter};
    use crate::testutil::{logged_in_session, page_json, post_json, ScriptedTransport};

    const BASE: &str = "http://api.test";

    fn client(transport: &Arc<ScriptedTransport>, session: SessionContext) -> ApiClient {
        ApiClient::with_transport(transport.clone(), BASE, session)
    }

    #[test]
    fn test_first_page_url_encodes_trimmed_filter() {
        let (session, _) = logged_in_session();
        let api = client(&ScriptedTransport::new(), session);

        assert_eq!(
            api.page_url(&PageRequest::first(" alice")),
            "http://api.test/post/?user__username__icontains=alice"
        );
        assert_eq!(
            api.page_url(&PageRequest::first("al ice&x")),
            "http://api.test/post/?user__username__icontains=al%20ice%26x"
        );
        assert_eq!(api.page_url(&PageRequest::first("   ")), "http://api.test/post/");
    }

    #[test]
    fn test_cursor_url_is_replayed_verbatim() {
        let (session, _) = logged_in_session();
        let api = client(&ScriptedTransport::new(), session);

        let next = "http://api.test/post/?cursor=cD0yMDI0LTA1&user__username__icontains=alice";
        assert_eq!(api.page_url(&PageRequest::Cursor(next.to_string())), next);

        // Relative cursors are joined to the base URL, never rebuilt
        assert_eq!(
            api.page_url(&PageRequest::Cursor("/post/?cursor=abc".to_string())),
            "http://api.test/post/?cursor=abc"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_stored_bearer_token() {
        let transport = ScriptedTransport::new();
        transport.push(200, page_json(&[post_json(1, "bob", 0, false)], None));
        let (session, _) = logged_in_session();
        let api = client(&transport, session);

        let page = api.list_posts(&PageRequest::first("")).await.unwrap();

        assert_eq!(page.results.len(), 1);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bearer.as_deref(), Some("access-1"));
        assert!(!requests[0].retried);
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries_with_new_token() {
        let transport = ScriptedTransport::new();
        transport.push(401, r#"{"detail": "Token expired"}"#);
        transport.push(200, r#"{"access": "access-2"}"#);
        transport.push(200, page_json(&[post_json(9, "carol", 2, true)], None));
        let (session, storage) = logged_in_session();
        let api = client(&transport, session.clone());

        let page = api.list_posts(&PageRequest::first("")).await.unwrap();

        assert_eq!(page.results[0].id, 9);
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].url, "http://api.test/auth/refresh/");
        assert!(requests[1].bearer.is_none());
        assert_eq!(
            requests[1].body,
            Some(serde_json::json!({ "refresh": "refresh-1" }))
        );
        assert_eq!(requests[2].url, requests[0].url);
        assert_eq!(requests[2].bearer.as_deref(), Some("access-2"));
        assert!(requests[2].retried);
        assert_eq!(
            storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(),
            Some("access-2")
        );
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_second_401_is_final() {
        let transport = ScriptedTransport::new();
        transport.push(401, "{}");
        transport.push(200, r#"{"access": "access-2"}"#);
        transport.push(401, r#"{"detail": "still no"}"#);
        let (session, _) = logged_in_session();
        let api = client(&transport, session.clone());

        let err = api.delete_post(3).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(transport.requests().len(), 3);
        // A final 401 after a successful refresh does not wipe the session
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_every_session_key() {
        let transport = ScriptedTransport::new();
        transport.push(401, "{}");
        transport.push(401, r#"{"detail": "Token is blacklisted"}"#);
        let (session, storage) = logged_in_session();
        let api = client(&transport, session.clone());

        let err = api.toggle_like(5).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(transport.requests().len(), 2);
        for key in keys::ALL {
            assert_eq!(storage.get(key).unwrap(), None);
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_clears_session_without_refresh_call() {
        let transport = ScriptedTransport::new();
        transport.push(401, "{}");
        let (session, storage) = logged_in_session();
        storage.remove(keys::REFRESH_TOKEN).unwrap();
        let api = client(&transport, session.clone());

        let err = api.get_post(1).await.unwrap_err();

        assert!(err.is_session_expired());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(storage.get(keys::USER).unwrap(), None);
    }

    #[tokio::test]
    async fn test_network_failure_during_refresh_clears_session() {
        let transport = ScriptedTransport::new();
        transport.push(401, "{}");
        transport.push_error(ApiError::Api {
            status: 0,
            body: "connection reset".to_string(),
        });
        let (session, _) = logged_in_session();
        let api = client(&transport, session.clone());

        let err = api.get_post(1).await.unwrap_err();

        match err {
            ApiError::SessionExpired(cause) => assert!(cause.contains("connection reset")),
            other => panic!("expected SessionExpired, got {:?}", other),
        }
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_non_401_errors_pass_through() {
        let transport = ScriptedTransport::new();
        transport.push(400, r#"{"content": ["Ensure this field has no more than 500 characters."]}"#);
        transport.push(500, "<html>oops</html>");
        let (session, _) = logged_in_session();
        let api = client(&transport, session);

        let err = api
            .create_post("t".to_string(), "c".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref body) if body.contains("500 characters")));

        let err = api.delete_post(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_update_sends_patch_with_fields() {
        let transport = ScriptedTransport::new();
        transport.push(200, post_json(4, "alice", 1, false).to_string());
        let (session, _) = logged_in_session();
        let api = client(&transport, session);

        let update = UpdatePostRequest {
            title: Some("New title".to_string()),
            content: Some("New body".to_string()),
        };
        let post = api.update_post(4, update).await.unwrap();

        assert_eq!(post.id, 4);
        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::PATCH);
        assert_eq!(requests[0].url, "http://api.test/post/4/");
        assert_eq!(
            requests[0].body,
            Some(serde_json::json!({ "title": "New title", "content": "New body" }))
        );
    }

    #[tokio::test]
    async fn test_login_is_unauthenticated() {
        let transport = ScriptedTransport::new();
        transport.push(
            200,
            r#"{"user": {"id": 42, "username": "alice", "email": "a@x.io"}, "access": "a", "refresh": "r"}"#,
        );
        let (session, _) = logged_in_session();
        let api = client(&transport, session);

        let response = api
            .login("a@x.io".to_string(), "hunter2".to_string())
            .await
            .unwrap();

        assert_eq!(response.user.username, "alice");
        assert!(transport.requests()[0].bearer.is_none());
    }
}
