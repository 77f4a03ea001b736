//! Feed loading and ordering.
//!
//! Loading is always a full refetch: a change notification never patches the
//! displayed list incrementally, it re-runs `load_posts` and replaces the
//! whole sequence.

use crate::backend::{BackendClient, BackendError};
use crate::types::Post;

/// Fetches all posts and enforces the deterministic display order.
///
/// The request already asks the backend for newest-first with an id
/// tie-break; the client re-sorts so the displayed order never depends on
/// what the backend actually did with ties.
pub async fn load_posts(client: &BackendClient) -> Result<Vec<Post>, BackendError> {
    let mut posts = client.select_posts().await?;
    sort_posts(&mut posts);
    Ok(posts)
}

/// Sorts posts newest-first; equal timestamps fall back to id descending.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
