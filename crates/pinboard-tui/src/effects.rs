//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never performs I/O or spawns tasks directly.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use pinboard_core::types::Post;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// Run the session guard query for the active protected view.
    CheckSession,

    /// Exchange credentials for a session.
    SignIn { email: String, password: String },

    /// Re-fetch the whole feed (full-refetch reconciliation).
    LoadPosts,

    /// Start the change-feed watcher for the feed view.
    SubscribeFeed,

    /// Stop a change-feed watcher.
    CancelSubscription { cancel: CancellationToken },

    /// Run the post submission sequence.
    SubmitPost {
        content: String,
        attachment: Option<PathBuf>,
    },

    /// Delete a post row (and best-effort its attachment).
    DeletePost { post: Post },

    /// Terminate the session.
    Logout,

    /// Open a post's attachment URL in the system browser.
    OpenAttachment { user_id: String, image_id: String },
}
