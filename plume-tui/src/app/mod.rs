mod handlers;
mod state;


pub use handlers::{handle_key_event, Action};
pub use state::*;

use anyhow::Result;
use crossterm::event::KeyEvent;
use plume_types::{Page, Post, PostId};
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{ApiClient, ApiResult};
use crate::auth::{AuthFlow, Registration, REGISTERED_NOTICE};
use crate::feed::PageTicket;
use crate::logging::LogConfig;
use crate::mutations::{MutationError, MutationKind, PendingDelete, PostMutator};
use crate::session::SessionContext;
use crate::log_pagination;

pub const FEED_ERROR: &str = "Error loading posts";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Results of background work, drained by the main loop
#[derive(Debug)]
pub enum AppEvent {
    PageLoaded {
        generation: u64,
        result: ApiResult<Page<Post>>,
    },
    LikeSettled {
        post_id: PostId,
        result: ApiResult<()>,
    },
}

/// Application state
pub struct App {
    pub running: bool,
    pub screen: Screen,
    pub show_help: bool,
    pub login: LoginForm,
    pub register: RegisterForm,
    pub feed: FeedState,
    pub composer: ComposerState,
    pub log_config: LogConfig,
    api: ApiClient,
    auth: AuthFlow,
    mutator: PostMutator,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl App {
    /// Build the app around an API client; an existing session opens the feed
    pub fn new(api: ApiClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            running: true,
            screen: Screen::Login,
            show_help: false,
            login: LoginForm::new(),
            register: RegisterForm::new(),
            feed: FeedState::new(),
            composer: ComposerState::new(),
            log_config: LogConfig::default(),
            auth: AuthFlow::new(api.clone()),
            mutator: PostMutator::new(api.clone()),
            api,
            events_tx,
            events_rx,
        };

        if app.session().is_authenticated() {
            log::info!("Restored session, opening feed");
            app.enter_feed();
        }
        app
    }

    pub fn session(&self) -> &SessionContext {
        self.api.session()
    }

    pub fn server_url(&self) -> &str {
        self.api.base_url()
    }

    pub fn current_username(&self) -> Option<String> {
        self.session().current_user().map(|user| user.username)
    }

    /// Edit and delete are only offered on the viewer's own posts
    pub fn is_own_post(&self, post: &Post) -> bool {
        self.current_username()
            .is_some_and(|username| username == post.author_username)
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    // Screens

    pub fn show_register(&mut self) {
        self.register = RegisterForm::new();
        self.screen = Screen::Register;
    }

    pub fn show_login(&mut self) {
        self.screen = Screen::Login;
    }

    fn enter_feed(&mut self) {
        self.feed.clear();
        self.feed.observer.connect();
        self.screen = Screen::Feed;
    }

    /// Discard every piece of view state and return to the login screen
    pub fn hard_reset(&mut self) {
        self.feed.observer.disconnect();
        self.feed.filter_debounce.cancel();
        self.feed.clear();
        self.composer.close();
        self.register = RegisterForm::new();
        self.login = LoginForm::new();
        self.show_help = false;
        self.screen = Screen::Login;
    }

    fn on_session_expired(&mut self, cause: &str) {
        if self.screen != Screen::Feed {
            // A late result from before the last redirect
            log::debug!("Ignoring session expiry outside the feed: {}", cause);
            return;
        }
        log::warn!("Session expired, redirecting to login: {}", cause);
        self.hard_reset();
        self.login.error = Some(SESSION_EXPIRED.to_string());
    }

    pub fn logout(&mut self) {
        self.auth.logout();
        self.hard_reset();
    }

    // Main loop hooks

    /// Time-driven work for one loop iteration
    pub fn tick(&mut self, now: Instant) {
        self.clear_expired_messages(now);
        self.process_events();

        if self.screen != Screen::Feed {
            return;
        }
        if !self.session().is_authenticated() {
            log::info!("No access token, leaving the feed");
            self.hard_reset();
            return;
        }

        if let Some(filter) = self.feed.filter_debounce.poll(now) {
            self.apply_filter(&filter);
        }

        self.request_first_page();
        self.load_more_if_visible();
    }

    pub fn clear_expired_messages(&mut self, now: Instant) {
        clear_if_expired(&mut self.feed.message, now);
        clear_if_expired(&mut self.composer.error, now);
        clear_if_expired(&mut self.register.message, now);
        clear_if_expired(&mut self.login.notice, now);
    }

    /// Record a keystroke in the filter box; applied once typing pauses
    pub fn on_filter_input(&mut self, now: Instant) {
        self.feed
            .filter_debounce
            .input(self.feed.filter_input.clone(), now);
    }

    fn apply_filter(&mut self, filter: &str) {
        if self.feed.loader.set_filter(filter) {
            self.feed.selected = 0;
            self.feed.viewport.top = 0;
        }
    }

    fn request_first_page(&mut self) {
        if let Some(ticket) = self.feed.loader.begin_first_page() {
            self.spawn_page_fetch(ticket);
        }
    }

    /// Fetch the next page when the sentinel row scrolls into view
    pub fn load_more_if_visible(&mut self) {
        if !self.feed.loader.has_next_page() {
            return;
        }
        let sentinel = self.feed.sentinel_row();
        if !self
            .feed
            .observer
            .is_intersecting(self.feed.viewport, sentinel, 1)
        {
            return;
        }

        if let Some(ticket) = self.feed.loader.begin_next_page() {
            log_pagination!(
                self.log_config,
                "Sentinel row {} visible from {:?}",
                sentinel,
                self.feed.viewport
            );
            self.spawn_page_fetch(ticket);
        }
    }

    /// Clear a failed page load so the loop requests it again
    pub fn retry_feed(&mut self) {
        self.feed.loader.retry();
        self.request_first_page();
        self.load_more_if_visible();
    }

    fn spawn_page_fetch(&self, ticket: PageTicket) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.list_posts(&ticket.request).await;
            let _ = events.send(AppEvent::PageLoaded {
                generation: ticket.generation,
                result,
            });
        });
    }

    /// Apply every finished background result without blocking
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    /// Wait for the next background result and apply it
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply_event(event);
                true
            }
            None => false,
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::PageLoaded {
                generation,
                result: Ok(page),
            } => {
                if generation == self.feed.loader.generation() {
                    self.feed.likes.reconcile_all(page.results.iter());
                }
                if self.feed.loader.complete_page(generation, page) {
                    self.feed.clamp_selection();
                }
            }
            AppEvent::PageLoaded {
                generation,
                result: Err(e),
            } => {
                if let crate::api::ApiError::SessionExpired(cause) = &e {
                    self.on_session_expired(cause);
                    return;
                }
                log::error!("Failed to load feed page: {}", e);
                self.feed.loader.fail_page(generation, FEED_ERROR.to_string());
            }
            AppEvent::LikeSettled {
                post_id,
                result: Ok(()),
            } => {
                log::debug!(target: "likes", "Like toggle on post {} confirmed, refreshing feed", post_id);
                // Refetch so server counts replace the optimistic ones
                self.feed.loader.invalidate();
            }
            AppEvent::LikeSettled {
                post_id,
                result: Err(e),
            } => {
                if let crate::api::ApiError::SessionExpired(cause) = &e {
                    self.on_session_expired(cause);
                    return;
                }
                // No rollback: the optimistic state stays until the next reconcile
                log::warn!(target: "likes", "Like toggle on post {} failed: {}", post_id, e);
            }
        }
    }

    // Likes

    /// Post the user is looking at: the open detail view, else the selection
    fn focused_post(&self) -> Option<Post> {
        self.feed
            .detail
            .clone()
            .or_else(|| self.feed.selected_post().cloned())
    }

    pub fn toggle_like(&mut self) {
        let Some(post) = self.focused_post() else {
            return;
        };

        self.feed.likes.toggle(&post);

        let api = self.api.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.toggle_like(post.id).await;
            let _ = events.send(AppEvent::LikeSettled {
                post_id: post.id,
                result,
            });
        });
    }

    // Detail view

    pub async fn open_detail(&mut self) -> Result<()> {
        let Some(post) = self.feed.selected_post().cloned() else {
            return Ok(());
        };

        match self.api.get_post(post.id).await {
            Ok(fresh) => {
                self.feed.likes.reconcile(&fresh);
                self.feed.detail = Some(fresh);
            }
            Err(crate::api::ApiError::SessionExpired(cause)) => self.on_session_expired(&cause),
            Err(e) => {
                log::error!("Failed to load post {}: {}", post.id, e);
                self.feed.message = Some(StatusMessage::error("Error loading post"));
            }
        }
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.feed.detail = None;
    }

    // Mutations

    pub fn open_composer_new(&mut self) {
        self.composer.open_new();
    }

    pub fn open_composer_edit(&mut self) {
        match self.focused_post() {
            Some(post) if self.is_own_post(&post) => self.composer.open_edit(&post),
            Some(_) => {
                self.feed.message = Some(StatusMessage::error("You can only edit your own posts"));
            }
            None => {}
        }
    }

    pub fn close_composer(&mut self) {
        self.composer.close();
    }

    pub async fn submit_composer(&mut self) -> Result<()> {
        let Some(mode) = self.composer.mode else {
            return Ok(());
        };
        let draft = self.composer.draft();

        self.composer.submitting = true;
        let (kind, result) = match mode {
            ComposerMode::NewPost => (
                MutationKind::Create,
                self.mutator.create(&draft, &mut self.feed.loader).await,
            ),
            ComposerMode::EditPost { post_id } => (
                MutationKind::Update,
                self.mutator
                    .update(post_id, &draft, &mut self.feed.loader)
                    .await,
            ),
        };
        self.composer.submitting = false;

        match result {
            Ok(post) => {
                self.feed.likes.reconcile(&post);
                if self.feed.detail.as_ref().is_some_and(|d| d.id == post.id) {
                    self.feed.detail = Some(post);
                }
                self.composer.close();
                self.feed.message = Some(StatusMessage::success(kind.success_message()));
            }
            Err(MutationError::SessionExpired(cause)) => self.on_session_expired(&cause),
            Err(e) => {
                self.composer.error = Some(StatusMessage::error(e.to_string()));
            }
        }
        Ok(())
    }

    /// Ask for confirmation before deleting the focused post
    pub fn request_delete(&mut self) {
        match self.focused_post() {
            Some(post) if self.is_own_post(&post) => {
                self.feed.pending_delete = Some(PendingDelete::new(&post));
            }
            Some(_) => {
                self.feed.message =
                    Some(StatusMessage::error("You can only delete your own posts"));
            }
            None => {}
        }
    }

    pub fn cancel_delete(&mut self) {
        self.feed.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) -> Result<()> {
        let Some(pending) = self.feed.pending_delete.take() else {
            return Ok(());
        };

        match self
            .mutator
            .delete(pending.confirm(), &mut self.feed.loader)
            .await
        {
            Ok(post_id) => {
                if self.feed.detail.as_ref().is_some_and(|d| d.id == post_id) {
                    self.feed.detail = None;
                }
                self.feed.message = Some(StatusMessage::success(
                    MutationKind::Delete.success_message(),
                ));
            }
            Err(MutationError::SessionExpired(cause)) => self.on_session_expired(&cause),
            Err(e) => {
                self.feed.message = Some(StatusMessage::error(e.to_string()));
            }
        }
        Ok(())
    }

    // Authentication

    pub async fn submit_login(&mut self) -> Result<()> {
        if !self.login.can_submit() {
            return Ok(());
        }

        self.login.loading = true;
        self.login.error = None;
        let result = self.auth.login(&self.login.email, &self.login.password).await;
        self.login.loading = false;

        match result {
            Ok(_) => {
                self.login = LoginForm::new();
                self.enter_feed();
            }
            Err(e) => self.login.error = Some(e.to_string()),
        }
        Ok(())
    }

    pub async fn submit_register(&mut self) -> Result<()> {
        if !self.register.can_submit() {
            return Ok(());
        }

        let registration = match Registration::new(
            &self.register.username,
            &self.register.email,
            &self.register.password,
        ) {
            Ok(registration) => registration,
            Err(e) => {
                self.register.message = Some(StatusMessage::error(e.to_string()));
                return Ok(());
            }
        };

        self.register.loading = true;
        let result = self.auth.register(registration).await;
        self.register.loading = false;

        match result {
            Ok(()) => {
                self.register = RegisterForm::new();
                self.login = LoginForm::new();
                self.login.notice = Some(StatusMessage::with_ttl(
                    REGISTERED_NOTICE,
                    MessageKind::Success,
                    REGISTERED_NOTICE_TTL,
                ));
                self.screen = Screen::Login;
            }
            Err(e) => {
                if e.clears_form() {
                    self.register.clear_fields();
                }
                self.register.message = Some(StatusMessage::error(e.to_string()));
            }
        }
        Ok(())
    }

    // Keys

    /// Handle a key press, running any network work it triggers
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(action) = handle_key_event(self, key)? else {
            return Ok(());
        };

        match action {
            Action::SubmitLogin => self.submit_login().await,
            Action::SubmitRegister => self.submit_register().await,
            Action::SubmitComposer => self.submit_composer().await,
            Action::ConfirmDelete => self.confirm_delete().await,
            Action::OpenDetail => self.open_detail().await,
        }
    }
}
