use plume_types::{Post, PostId};
use std::collections::HashMap;

/// Displayed like status of one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub count: u32,
}

impl LikeState {
    pub fn from_post(post: &Post) -> Self {
        Self {
            liked: post.liked_by_current_user,
            count: post.like_count,
        }
    }

    /// Flip the state; the count never drops below zero
    pub fn toggled(self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: self.count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                count: self.count.saturating_add(1),
            }
        }
    }
}

/// Optimistic like state per post.
///
/// Toggles apply locally before the request resolves and are never rolled
/// back; a failed request leaves the local state diverged until fresh server
/// data for the post is reconciled.
#[derive(Debug, Default)]
pub struct LikeController {
    states: HashMap<PostId, LikeState>,
}

impl LikeController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite local state with what the server just reported
    pub fn reconcile(&mut self, post: &Post) {
        self.states.insert(post.id, LikeState::from_post(post));
    }

    pub fn reconcile_all<'a>(&mut self, posts: impl IntoIterator<Item = &'a Post>) {
        for post in posts {
            self.reconcile(post);
        }
    }

    /// What to display for `post`
    pub fn state(&self, post: &Post) -> LikeState {
        self.states
            .get(&post.id)
            .copied()
            .unwrap_or_else(|| LikeState::from_post(post))
    }

    /// Apply a toggle immediately and return the new state
    pub fn toggle(&mut self, post: &Post) -> LikeState {
        let next = self.state(post).toggled();
        self.states.insert(post.id, next);
        log::debug!(target: "likes", "Post {} optimistically {:?}", post.id, next);
        next
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
