use plume_types::{ErrorBody, Post, PostId, UpdatePostRequest};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::feed::FeedLoader;

pub const TITLE_MAX_CHARS: usize = 100;
pub const CONTENT_MAX_CHARS: usize = 500;
pub const EMPTY_POST_MESSAGE: &str = "Title and content cannot be empty";

#[derive(Debug, Error)]
pub enum MutationError {
    /// Rejected locally, no request was sent
    #[error("{0}")]
    Invalid(&'static str),

    /// The backend refused the request; the message is user-facing
    #[error("{0}")]
    Rejected(String),

    #[error("Session expired: {0}")]
    SessionExpired(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn success_message(self) -> &'static str {
        match self {
            MutationKind::Create => "Post Created Successfully",
            MutationKind::Update => "Post Updated Successfully",
            MutationKind::Delete => "Post Deleted Successfully",
        }
    }

    fn fallback_message(self) -> &'static str {
        match self {
            MutationKind::Create => "Error Creating Post",
            MutationKind::Update => "Error Updating Post",
            MutationKind::Delete => "Error Deleting Post",
        }
    }

    /// Translate a backend failure into what the user sees
    fn translate(self, error: ApiError) -> MutationError {
        if let ApiError::SessionExpired(cause) = error {
            return MutationError::SessionExpired(cause);
        }

        log::warn!("{:?} failed: {}", self, error);
        let message = error
            .body()
            .and_then(|body| ErrorBody::parse(body).post_message())
            .unwrap_or_else(|| self.fallback_message().to_string());
        MutationError::Rejected(message)
    }
}

/// Title and content of a post being written or edited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    /// Build a draft, cutting each field at its length limit
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.chars().take(TITLE_MAX_CHARS).collect(),
            content: content.chars().take(CONTENT_MAX_CHARS).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), MutationError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(MutationError::Invalid(EMPTY_POST_MESSAGE));
        }
        Ok(())
    }
}

/// A delete the user asked for but has not confirmed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    post_id: PostId,
    title: String,
}

impl PendingDelete {
    pub fn new(post: &Post) -> Self {
        Self {
            post_id: post.id,
            title: post.title.clone(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete {
            post_id: self.post_id,
        }
    }
}

/// Proof that the user confirmed a delete; only obtainable from [`PendingDelete::confirm`]
#[derive(Debug)]
pub struct ConfirmedDelete {
    post_id: PostId,
}

/// Create, update and delete posts.
///
/// Every successful mutation invalidates the feed so the next read refetches
/// from the first page. Post lists are never edited optimistically.
#[derive(Clone)]
pub struct PostMutator {
    api: ApiClient,
}

impl PostMutator {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create(&self, draft: &PostDraft, feed: &mut FeedLoader) -> Result<Post, MutationError> {
        draft.validate()?;

        let post = self
            .api
            .create_post(draft.title.clone(), draft.content.clone())
            .await
            .map_err(|e| MutationKind::Create.translate(e))?;

        log::info!("Created post {}", post.id);
        feed.invalidate();
        Ok(post)
    }

    pub async fn update(
        &self,
        post_id: PostId,
        draft: &PostDraft,
        feed: &mut FeedLoader,
    ) -> Result<Post, MutationError> {
        draft.validate()?;

        let update = UpdatePostRequest {
            title: Some(draft.title.clone()),
            content: Some(draft.content.clone()),
        };
        let post = self
            .api
            .update_post(post_id, update)
            .await
            .map_err(|e| MutationKind::Update.translate(e))?;

        log::info!("Updated post {}", post_id);
        feed.invalidate();
        Ok(post)
    }

    pub async fn delete(
        &self,
        confirmed: ConfirmedDelete,
        feed: &mut FeedLoader,
    ) -> Result<PostId, MutationError> {
        let post_id = confirmed.post_id;
        self.api
            .delete_post(post_id)
            .await
            .map_err(|e| MutationKind::Delete.translate(e))?;

        log::info!("Deleted post {}", post_id);
        feed.invalidate();
        Ok(post_id)
    }
}
