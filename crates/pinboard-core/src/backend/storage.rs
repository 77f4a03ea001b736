//! Object storage operations for post attachments.
//!
//! Attachments live at `{user_id}/{image_id}` inside the configured bucket,
//! independent of the post row. The public URL is a pure derivation with no
//! existence check, so a dangling reference simply yields a URL that
//! resolves to a missing object.

use reqwest::Method;

use super::errors::{BackendError, BackendErrorKind};
use super::BackendClient;

/// Returns the storage path for an attachment.
pub fn attachment_path(user_id: &str, image_id: &str) -> String {
    format!("{}/{}", user_id, image_id)
}

/// Returns MIME type inferred from file extension for supported image formats.
pub fn mime_type_for_extension(path: &str) -> Option<&'static str> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

impl BackendClient {
    /// Uploads an object to the attachment bucket.
    pub async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let url_path = format!("/storage/v1/object/{}/{}", self.config().bucket, path);
        let response = self
            .request(Method::POST, &url_path)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Storage, e))?;

        Self::check_status(BackendErrorKind::Storage, response).await?;
        Ok(())
    }

    /// Removes an object from the attachment bucket.
    pub async fn remove_object(&self, path: &str) -> Result<(), BackendError> {
        let url_path = format!("/storage/v1/object/{}", self.config().bucket);
        let response = self
            .request(Method::DELETE, &url_path)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Storage, e))?;

        Self::check_status(BackendErrorKind::Storage, response).await?;
        Ok(())
    }

    /// Returns the public URL for an object path.
    ///
    /// Pure derivation from config: no I/O, never fails.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config().base_url,
            self.config().bucket,
            path
        )
    }
}
