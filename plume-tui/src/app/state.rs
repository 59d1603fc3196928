use plume_types::{Post, PostId};
use std::time::{Duration, Instant};
use tui_textarea::TextArea;

use crate::debounce::Debouncer;
use crate::feed::FeedLoader;
use crate::likes::LikeController;
use crate::mutations::{PendingDelete, PostDraft, CONTENT_MAX_CHARS, TITLE_MAX_CHARS};
use crate::viewport::{LoadMoreObserver, Viewport};

/// How long inline messages stay on screen
pub const MESSAGE_TTL: Duration = Duration::from_secs(3);
/// The post-registration notice on the login screen lingers a little longer
pub const REGISTERED_NOTICE_TTL: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Feed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

/// An inline message that clears itself after its time to live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    shown_at: Instant,
    ttl: Duration,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self::with_ttl(text, MessageKind::Success, MESSAGE_TTL)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_ttl(text, MessageKind::Error, MESSAGE_TTL)
    }

    pub fn with_ttl(text: impl Into<String>, kind: MessageKind, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.ttl
    }
}

/// Drop `slot`'s message once it has expired
pub fn clear_if_expired(slot: &mut Option<StatusMessage>, now: Instant) {
    if slot.as_ref().is_some_and(|message| message.is_expired(now)) {
        *slot = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub show_password: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Shown in place of the title right after a successful registration
    pub notice: Option<StatusMessage>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            focus: LoginField::Email,
            show_password: false,
            loading: false,
            error: None,
            notice: None,
        }
    }

    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.email.is_empty() && !self.password.is_empty()
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Username,
    Email,
    Password,
}

#[derive(Debug)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub focus: RegisterField,
    pub show_password: bool,
    pub loading: bool,
    /// Replaces the form title while visible
    pub message: Option<StatusMessage>,
}

impl RegisterForm {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            focus: RegisterField::Username,
            show_password: false,
            loading: false,
            message: None,
        }
    }

    pub fn focused_input(&mut self) -> &mut String {
        match self.focus {
            RegisterField::Username => &mut self.username,
            RegisterField::Email => &mut self.email,
            RegisterField::Password => &mut self.password,
        }
    }

    /// Input cap for the focused field
    pub fn focused_limit(&self) -> usize {
        match self.focus {
            RegisterField::Username => *crate::auth::USERNAME_LENGTH.end(),
            RegisterField::Email => 254,
            RegisterField::Password => *crate::auth::PASSWORD_LENGTH.end(),
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            RegisterField::Username => RegisterField::Email,
            RegisterField::Email => RegisterField::Password,
            RegisterField::Password => RegisterField::Username,
        };
    }

    pub fn can_submit(&self) -> bool {
        !self.loading && !self.username.is_empty() && !self.email.is_empty() && !self.password.is_empty()
    }

    /// Clear every field, keeping any message on screen
    pub fn clear_fields(&mut self) {
        self.username.clear();
        self.email.clear();
        self.password.clear();
        self.focus = RegisterField::Username;
    }
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new()
    }
}

/// What the composer is writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerMode {
    NewPost,
    EditPost { post_id: PostId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerField {
    Title,
    Content,
}

/// Post composer with a title and a content area, both using tui-textarea
pub struct ComposerState {
    pub mode: Option<ComposerMode>,
    pub title: TextArea<'static>,
    pub content: TextArea<'static>,
    pub focus: ComposerField,
    pub error: Option<StatusMessage>,
    pub submitting: bool,
}

impl ComposerState {
    pub fn new() -> Self {
        Self {
            mode: None,
            title: TextArea::default(),
            content: TextArea::default(),
            focus: ComposerField::Title,
            error: None,
            submitting: false,
        }
    }

    pub fn open_new(&mut self) {
        *self = Self::new();
        self.mode = Some(ComposerMode::NewPost);
    }

    pub fn open_edit(&mut self, post: &Post) {
        *self = Self::new();
        self.mode = Some(ComposerMode::EditPost { post_id: post.id });
        self.title.insert_str(&post.title);
        self.content.insert_str(&post.content);
    }

    pub fn close(&mut self) {
        *self = Self::new();
    }

    pub fn is_open(&self) -> bool {
        self.mode.is_some()
    }

    pub fn title_text(&self) -> String {
        self.title.lines().join(" ")
    }

    pub fn content_text(&self) -> String {
        self.content.lines().join("\n")
    }

    pub fn title_chars(&self) -> usize {
        self.title_text().chars().count()
    }

    pub fn content_chars(&self) -> usize {
        self.content_text().chars().count()
    }

    /// Remaining room in the focused field
    pub fn focused_has_room(&self) -> bool {
        match self.focus {
            ComposerField::Title => self.title_chars() < TITLE_MAX_CHARS,
            ComposerField::Content => self.content_chars() < CONTENT_MAX_CHARS,
        }
    }

    pub fn focused_textarea(&mut self) -> &mut TextArea<'static> {
        match self.focus {
            ComposerField::Title => &mut self.title,
            ComposerField::Content => &mut self.content,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            ComposerField::Title => ComposerField::Content,
            ComposerField::Content => ComposerField::Title,
        };
    }

    pub fn draft(&self) -> PostDraft {
        PostDraft::new(&self.title_text(), &self.content_text())
    }
}

impl Default for ComposerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything shown on the feed screen
pub struct FeedState {
    pub loader: FeedLoader,
    pub likes: LikeController,
    pub selected: usize,
    pub viewport: Viewport,
    pub observer: LoadMoreObserver,
    pub filter_input: String,
    pub filter_focused: bool,
    pub filter_debounce: Debouncer<String>,
    pub pending_delete: Option<PendingDelete>,
    /// Post opened with Enter, refreshed from the single-post endpoint
    pub detail: Option<Post>,
    pub message: Option<StatusMessage>,
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            loader: FeedLoader::new(),
            likes: LikeController::new(),
            selected: 0,
            viewport: Viewport::default(),
            observer: LoadMoreObserver::default(),
            filter_input: String::new(),
            filter_focused: false,
            filter_debounce: Debouncer::default(),
            pending_delete: None,
            detail: None,
            message: None,
        }
    }

    /// Drop all view state. The loader keeps counting generations so pages
    /// still in flight from before the reset are discarded.
    pub fn clear(&mut self) {
        let mut loader = std::mem::take(&mut self.loader);
        loader.reset();
        *self = Self {
            loader,
            ..Self::new()
        };
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.loader.posts().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let count = self.loader.post_count();
        if count > 0 && self.selected + 1 < count {
            self.selected += 1;
        }
        self.scroll_to_selection();
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.scroll_to_selection();
    }

    /// Keep the selection inside the post list and the visible window
    pub fn clamp_selection(&mut self) {
        let count = self.loader.post_count();
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        let height = self.viewport.height.max(1);
        if self.selected < self.viewport.top {
            self.viewport.top = self.selected;
        } else if self.selected >= self.viewport.top + height {
            self.viewport.top = self.selected + 1 - height;
        }
    }

    /// Row index of the "load more" sentinel, directly after the last post
    pub fn sentinel_row(&self) -> usize {
        self.loader.post_count()
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}
