//! Post submission sequencing.
//!
//! The write order is fixed: resolve identity, insert the row (already
//! carrying the attachment id), then upload the attachment. A failed upload
//! leaves the inserted row with a dangling image_id; that is the accepted
//! consistency model, not something to roll back or retry here. Resubmitting
//! after any failure inserts a fresh row; there is no idempotency key.

use std::path::Path;

use crate::backend::storage::{attachment_path, mime_type_for_extension};
use crate::backend::{BackendClient, BackendError, BackendErrorKind};
use crate::types::{NewPost, Post};

/// Content type used when the attachment extension is not a known image.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmittedPost {
    pub post: Post,
    /// True when an attachment was uploaded alongside the row.
    pub uploaded: bool,
}

/// Generates a fresh attachment identifier.
///
/// 128-bit random; collisions are not checked server-side, the randomness
/// is the uniqueness guarantee.
pub fn new_attachment_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Submits a post with optional attachment, in fixed order:
///
/// 1. generate the attachment id (no backend side effect)
/// 2. resolve the current user (auth failure stops everything)
/// 3. insert the row, image_id included
/// 4. upload the attachment to `{user_id}/{image_id}`
///
/// A storage failure after step 3 surfaces as an error even though the row
/// persists: the caller reports it and the feed will show the post with a
/// broken attachment link.
pub async fn submit_post(
    client: &BackendClient,
    content: &str,
    attachment: Option<&Path>,
) -> Result<SubmittedPost, BackendError> {
    let image_id = attachment.map(|_| new_attachment_id());

    let user = client.current_user().await?;

    let post = client
        .insert_post(&NewPost {
            content: content.to_string(),
            user_id: user.id.clone(),
            image_id: image_id.clone(),
        })
        .await?;

    if let (Some(path), Some(image_id)) = (attachment, image_id.as_deref()) {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            BackendError::new(
                BackendErrorKind::Storage,
                format!("Failed to read {}: {}", path.display(), e),
            )
        })?;

        let content_type = path
            .to_str()
            .and_then(mime_type_for_extension)
            .unwrap_or(FALLBACK_CONTENT_TYPE);

        client
            .upload_object(&attachment_path(&user.id, image_id), bytes, content_type)
            .await?;

        return Ok(SubmittedPost {
            post,
            uploaded: true,
        });
    }

    Ok(SubmittedPost {
        post,
        uploaded: false,
    })
}
