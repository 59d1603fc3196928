use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// A like record as returned by the backend when `is_liked` is expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user: UserId,
    pub post: PostId,
    #[serde(with = "datetime_format")]
    pub created_datetime: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub like: bool,
}

fn default_true() -> bool {
    true
}

/// The backend reports "liked" either as a flag or as the list of like records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LikedField {
    Flag(bool),
    Records(Vec<Like>),
}

impl LikedField {
    /// Collapse the field into a single flag for `viewer`.
    pub fn resolve(&self, viewer: Option<UserId>) -> bool {
        match self {
            LikedField::Flag(liked) => *liked,
            LikedField::Records(records) => match viewer {
                Some(id) => records.iter().any(|record| record.user == id),
                None => false,
            },
        }
    }
}

/// Post exactly as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPayload {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub username: String,
    #[serde(with = "datetime_format")]
    pub created_datetime: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_datetime: DateTime<Utc>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub is_liked: Option<LikedField>,
}

impl PostPayload {
    /// Resolve the payload into the canonical post seen by `viewer`.
    pub fn into_post(self, viewer: Option<UserId>) -> Post {
        let liked_by_current_user = self
            .is_liked
            .as_ref()
            .map(|field| field.resolve(viewer))
            .unwrap_or(false);

        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            author_username: self.username,
            created_at: self.created_datetime,
            updated_at: self.updated_datetime,
            like_count: u32::try_from(self.likes_count.max(0)).unwrap_or(u32::MAX),
            liked_by_current_user,
        }
    }
}

/// Canonical post used everywhere past ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: u32,
    pub liked_by_current_user: bool,
}

/// One page of a cursor-paginated listing. Cursors are opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            results: self.results.into_iter().map(f).collect(),
            next: self.next,
            previous: self.previous,
        }
    }
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A backend validation message: either a bare string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMessage {
    One(String),
    Many(Vec<String>),
}

impl FieldMessage {
    pub fn text(&self) -> Option<String> {
        match self {
            FieldMessage::One(message) if !message.is_empty() => Some(message.clone()),
            FieldMessage::One(_) => None,
            FieldMessage::Many(messages) if !messages.is_empty() => Some(messages.join(" ")),
            FieldMessage::Many(_) => None,
        }
    }
}

/// Error body shape shared by the backend's 4xx responses.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<FieldMessage>,
    #[serde(default)]
    pub username: Option<FieldMessage>,
    #[serde(default)]
    pub email: Option<FieldMessage>,
    #[serde(default)]
    pub title: Option<FieldMessage>,
    #[serde(default)]
    pub content: Option<FieldMessage>,
}

impl ErrorBody {
    /// Parse a raw response body, tolerating non-JSON bodies.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Registration errors: the email message wins over the username one.
    pub fn registration_message(&self) -> Option<String> {
        self.email
            .as_ref()
            .and_then(FieldMessage::text)
            .or_else(|| self.username.as_ref().and_then(FieldMessage::text))
    }

    /// Post mutation errors: the message for the offending field, else `detail`.
    pub fn post_message(&self) -> Option<String> {
        self.content
            .as_ref()
            .and_then(FieldMessage::text)
            .or_else(|| self.title.as_ref().and_then(FieldMessage::text))
            .or_else(|| self.detail.as_ref().and_then(FieldMessage::text))
    }

    pub fn detail_message(&self) -> Option<String> {
        self.detail.as_ref().and_then(FieldMessage::text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_json(is_liked: &str) -> String {
        format!(
            r#"{{
                "id": 7,
                "title": "Hello",
                "content": "World",
                "username": "alice",
                "created_datetime": "2024-05-01T10:00:00Z",
                "updated_datetime": "2024-05-01T11:30:00.123456Z",
                "likes_count": 3,
                "is_liked": {}
            }}"#,
            is_liked
        )
    }

    #[test]
    fn test_liked_flag_is_used_directly() {
        let payload: PostPayload = serde_json::from_str(&payload_json("true")).unwrap();
        let post = payload.into_post(Some(99));
        assert!(post.liked_by_current_user);
        assert_eq!(post.like_count, 3);
        assert_eq!(post.author_username, "alice");
    }

    #[test]
    fn test_liked_records_containing_viewer() {
        let records = r#"[{"user": 1, "post": 7, "created_datetime": "2024-05-01T10:00:00Z", "like": true},
                          {"user": 42, "post": 7, "created_datetime": "2024-05-01T10:05:00Z", "like": true}]"#;
        let payload: PostPayload = serde_json::from_str(&payload_json(records)).unwrap();

        assert!(payload.clone().into_post(Some(42)).liked_by_current_user);
        assert!(!payload.clone().into_post(Some(5)).liked_by_current_user);
        assert!(!payload.into_post(None).liked_by_current_user);
    }

    #[test]
    fn test_liked_missing_defaults_to_not_liked() {
        let payload: PostPayload = serde_json::from_str(&payload_json("null")).unwrap();
        assert!(!payload.into_post(Some(1)).liked_by_current_user);
    }

    #[test]
    fn test_negative_like_count_is_clamped() {
        let mut payload: PostPayload = serde_json::from_str(&payload_json("false")).unwrap();
        payload.likes_count = -4;
        assert_eq!(payload.into_post(None).like_count, 0);
    }

    #[test]
    fn test_page_keeps_cursors_verbatim() {
        let raw = r#"{"results": [], "next": "http://api/post/?cursor=cD0yMDI0", "previous": null}"#;
        let page: Page<PostPayload> = serde_json::from_str(raw).unwrap();
        assert_eq!(page.next.as_deref(), Some("http://api/post/?cursor=cD0yMDI0"));
        assert!(page.previous.is_none());
    }

    #[test]
    fn test_registration_message_prefers_email() {
        let body = ErrorBody::parse(
            r#"{"username": ["A user with that username already exists."], "email": ["Enter a valid email address."]}"#,
        );
        assert_eq!(
            body.registration_message().as_deref(),
            Some("Enter a valid email address.")
        );

        let body = ErrorBody::parse(r#"{"username": "taken"}"#);
        assert_eq!(body.registration_message().as_deref(), Some("taken"));
    }

    #[test]
    fn test_error_body_tolerates_html() {
        let body = ErrorBody::parse("<html>Bad Gateway</html>");
        assert!(body.post_message().is_none());
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        let request = UpdatePostRequest {
            title: Some("New".to_string()),
            content: None,
        };
        assert_eq!(serde_json::to_string(&request).unwrap(), r#"{"title":"New"}"#);
    }
}
