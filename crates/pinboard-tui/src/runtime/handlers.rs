//! Effect handlers for the board runtime.
//!
//! Handlers are pure async functions that return a `UiEvent`. The runtime
//! spawns them and sends the result to the inbox; they perform I/O but never
//! touch state. The change-feed watcher is the one long-lived exception: it
//! owns the inbox sender and emits an event per notification.

use std::path::PathBuf;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use pinboard_core::backend::storage::attachment_path;
use pinboard_core::backend::{BackendClient, ChangeEvent, auth};
use pinboard_core::types::Post;
use pinboard_core::{compose, feed};

use crate::events::UiEvent;
use crate::runtime::inbox::UiEventSender;

/// Session guard query: all failures collapse to "no session".
pub async fn check_session(client: BackendClient) -> UiEvent {
    UiEvent::SessionChecked(client.current_user().await.map_err(|e| e.to_string()))
}

/// Exchanges credentials for a session and persists the token.
pub async fn sign_in(client: BackendClient, email: String, password: String) -> UiEvent {
    let result = match client.sign_in(&email, &password).await {
        Ok(resp) => {
            let creds = auth::Credentials {
                access_token: resp.access_token,
            };
            match auth::save_credentials(&creds) {
                Ok(()) => Ok(resp.user),
                Err(e) => Err(format!("Failed to save credentials: {}", e)),
            }
        }
        Err(e) => Err(e.to_string()),
    };
    UiEvent::SignInFinished(result)
}

/// Full feed refetch.
pub async fn load_feed(client: BackendClient) -> UiEvent {
    UiEvent::PostsLoaded(feed::load_posts(&client).await.map_err(|e| e.to_string()))
}

/// Runs the post submission sequence.
pub async fn submit(client: BackendClient, content: String, attachment: Option<PathBuf>) -> UiEvent {
    let result = compose::submit_post(&client, &content, attachment.as_deref())
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());
    UiEvent::SubmitFinished(result)
}

/// Deletes a post row, then fires off best-effort attachment removal.
///
/// The cleanup task's outcome is never surfaced: a failed removal leaves an
/// orphaned object, which is an accepted leak, and must not block or fail
/// the user-visible row deletion.
pub async fn delete_post(client: BackendClient, post: Post) -> UiEvent {
    match client.delete_post(post.id).await {
        Ok(()) => {
            if let Some(image_id) = &post.image_id {
                let path = attachment_path(&post.user_id, image_id);
                tokio::spawn(async move {
                    if let Err(e) = client.remove_object(&path).await {
                        tracing::warn!("attachment cleanup failed for {}: {}", path, e);
                    }
                });
            }
            UiEvent::DeleteFinished(Ok(post.id))
        }
        Err(e) => UiEvent::DeleteFinished(Err(e.to_string())),
    }
}

/// Terminates the session and clears stored credentials.
pub async fn logout(client: BackendClient) -> UiEvent {
    match client.sign_out().await {
        Ok(()) => {
            if let Err(e) = auth::clear_credentials() {
                tracing::warn!("failed to clear stored credentials: {}", e);
            }
            UiEvent::LogoutFinished(Ok(()))
        }
        Err(e) => UiEvent::LogoutFinished(Err(e.to_string())),
    }
}

/// Change-feed watcher: one `FeedChanged` per change notification until the
/// stream ends or the token cancels it. No reconnection is attempted;
/// recovery is user-initiated.
pub async fn watch_changes(
    client: BackendClient,
    id: u64,
    cancel: CancellationToken,
    tx: UiEventSender,
) {
    let mut stream = match client.subscribe_changes().await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("change feed subscription failed: {}", e);
            let _ = tx.send(UiEvent::SubscriptionEnded { id });
            return;
        }
    };

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            item = stream.next() => match item {
                Some(Ok(ChangeEvent::Change { .. })) => {
                    let _ = tx.send(UiEvent::FeedChanged);
                }
                Some(Ok(ChangeEvent::Ping)) => {}
                Some(Ok(ChangeEvent::Error { message })) => {
                    tracing::warn!("change feed reported: {}", message);
                }
                Some(Err(e)) => {
                    tracing::warn!("change feed stream error: {}", e);
                    break;
                }
                None => break,
            }
        }
    }

    let _ = tx.send(UiEvent::SubscriptionEnded { id });
}
