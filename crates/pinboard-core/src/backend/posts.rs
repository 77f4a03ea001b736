//! Row operations on the posts table.
//!
//! The select joins the author projection (`user_data(email)`) and asks the
//! backend for newest-first order with an explicit id tie-break, so the
//! returned sequence never depends on natural row order.

use reqwest::Method;

use super::errors::{BackendError, BackendErrorKind};
use super::BackendClient;
use crate::types::{NewPost, Post};

impl BackendClient {
    /// Fetches all posts joined with their author projection.
    pub async fn select_posts(&self) -> Result<Vec<Post>, BackendError> {
        let path = format!("/rest/v1/{}", self.config().posts_table);
        let response = self
            .request(Method::GET, &path)
            .query(&[
                ("select", "*,user_data(email)"),
                ("order", "created_at.desc,id.desc"),
            ])
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Persistence, e))?;

        let response = Self::check_status(BackendErrorKind::Persistence, response).await?;
        response.json::<Vec<Post>>().await.map_err(|e| {
            BackendError::new(
                BackendErrorKind::Persistence,
                format!("Malformed posts response: {}", e),
            )
        })
    }

    /// Inserts a new post row and returns the server-assigned row.
    pub async fn insert_post(&self, new: &NewPost) -> Result<Post, BackendError> {
        let path = format!("/rest/v1/{}", self.config().posts_table);
        let response = self
            .request(Method::POST, &path)
            .header("Prefer", "return=representation")
            .json(new)
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Persistence, e))?;

        let response = Self::check_status(BackendErrorKind::Persistence, response).await?;
        let mut rows = response.json::<Vec<Post>>().await.map_err(|e| {
            BackendError::new(
                BackendErrorKind::Persistence,
                format!("Malformed insert response: {}", e),
            )
        })?;

        if rows.is_empty() {
            return Err(BackendError::new(
                BackendErrorKind::Persistence,
                "Insert returned no row",
            ));
        }
        Ok(rows.remove(0))
    }

    /// Deletes a post row by id.
    pub async fn delete_post(&self, id: i64) -> Result<(), BackendError> {
        let path = format!("/rest/v1/{}", self.config().posts_table);
        let response = self
            .request(Method::DELETE, &path)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(BackendErrorKind::Persistence, e))?;

        Self::check_status(BackendErrorKind::Persistence, response).await?;
        Ok(())
    }
}
