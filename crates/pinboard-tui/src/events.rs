//! UI event types.
//!
//! All external inputs (terminal input, timer ticks, async backend results,
//! change notifications) are converted to `UiEvent` before being processed
//! by the reducer.

use crossterm::event::Event as CrosstermEvent;
use tokio_util::sync::CancellationToken;

use pinboard_core::types::{Post, UserInfo};

/// Unified event enum for the board TUI.
#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (render cadence).
    Tick,

    /// Terminal input event (key, paste, resize).
    Terminal(CrosstermEvent),

    /// Session guard verdict for the active protected view.
    SessionChecked(Result<UserInfo, String>),

    /// Async sign-in completed (credentials already persisted on success).
    SignInFinished(Result<UserInfo, String>),

    /// Feed load completed.
    PostsLoaded(Result<Vec<Post>, String>),

    /// One change notification arrived on the posts collection.
    FeedChanged,

    /// The change-feed watcher is running; the token cancels it.
    SubscriptionStarted { id: u64, cancel: CancellationToken },

    /// The change-feed watcher ended (stream closed, errored, or cancelled).
    SubscriptionEnded { id: u64 },

    /// Post submission completed.
    SubmitFinished(Result<(), String>),

    /// Row deletion completed (attachment cleanup is fire-and-forget and
    /// never reports here).
    DeleteFinished(Result<i64, String>),

    /// Logout completed.
    LogoutFinished(Result<(), String>),
}
