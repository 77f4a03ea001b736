//! Application state for the board TUI.
//!
//! ## State Hierarchy
//!
//! ```text
//! AppState
//! ├── route: Route              (which view is active)
//! ├── session: SessionState     (guard verdict for the active view)
//! ├── feed: FeedState           (list state machine + subscription handle)
//! ├── composer: ComposerState   (content buffer, attachment path)
//! └── login: LoginState         (credential form)
//! ```
//!
//! All state mutation happens in the reducer (`update`); the runtime only
//! executes the effects the reducer returns.

use tokio_util::sync::CancellationToken;

use pinboard_core::types::{Post, UserInfo};

use crate::input::{LineInput, TextBuffer};

/// Active view. `Feed` and `Compose` are protected; `Login` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Feed,
    Compose,
}

impl Route {
    /// Protected routes require a verified session before rendering.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

/// Session guard state for the active protected view.
///
/// The guard re-queries the backend on every protected view activation;
/// `Checking` suppresses the protected content until a verdict arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Checking,
    Authenticated(UserInfo),
    Anonymous,
}

impl SessionState {
    /// Returns the verified user, if any.
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Displayed list state machine.
///
/// `Loading` is the initial state and the state re-entered on every change
/// notification; the next load outcome resolves it. There is no terminal
/// state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FeedList {
    #[default]
    Loading,
    Loaded(Vec<Post>),
    Errored(String),
}

/// Handle to the active change-feed watcher.
///
/// The id distinguishes watcher generations: an end notice from a cancelled
/// watcher must not clear a newer subscription.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: u64,
    pub cancel: CancellationToken,
}

/// Feed view state.
#[derive(Debug, Default)]
pub struct FeedState {
    pub list: FeedList,
    /// Selected row index into the loaded list.
    pub selected: usize,
    /// The active change-feed watcher. Exactly one per active feed view;
    /// `None` when the view is inactive or the watcher has ended.
    pub subscription: Option<Subscription>,
    /// Transient operation error (delete, logout), shown under the list.
    pub error: Option<String>,
}

impl FeedState {
    /// Returns the loaded posts, if the list is in `Loaded`.
    pub fn posts(&self) -> Option<&[Post]> {
        match &self.list {
            FeedList::Loaded(posts) => Some(posts),
            _ => None,
        }
    }

    /// Returns the currently selected post, if any.
    pub fn selected_post(&self) -> Option<&Post> {
        self.posts().and_then(|posts| posts.get(self.selected))
    }
}

/// Which composer field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerFocus {
    #[default]
    Content,
    Attachment,
}

/// Composer view state.
#[derive(Debug, Default)]
pub struct ComposerState {
    pub content: TextBuffer,
    /// Path to an optional attachment file.
    pub attachment: LineInput,
    pub focus: ComposerFocus,
    /// True while a submission is in flight; blocks double submits.
    pub submitting: bool,
    pub error: Option<String>,
}

impl ComposerState {
    pub fn reset(&mut self) {
        self.content.clear();
        self.attachment.clear();
        self.focus = ComposerFocus::Content;
        self.submitting = false;
        self.error = None;
    }
}

/// Which login field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginFocus {
    #[default]
    Email,
    Password,
}

/// Login view state.
#[derive(Debug, Default)]
pub struct LoginState {
    pub email: LineInput,
    pub password: LineInput,
    pub focus: LoginFocus,
    pub submitting: bool,
    pub error: Option<String>,
}

/// Top-level TUI state.
#[derive(Debug)]
pub struct AppState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    pub route: Route,
    pub session: SessionState,
    pub feed: FeedState,
    pub composer: ComposerState,
    pub login: LoginState,
}

impl AppState {
    /// Creates the initial state, parked on the login view.
    ///
    /// The runtime navigates to the requested initial route, which runs the
    /// session guard for protected routes.
    pub fn new() -> Self {
        Self {
            should_quit: false,
            route: Route::Login,
            session: SessionState::Anonymous,
            feed: FeedState::default(),
            composer: ComposerState::default(),
            login: LoginState::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
