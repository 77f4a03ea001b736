//! Wire types for the message-board backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user, as reported by the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
}

/// Joined author projection attached to each post for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub email: String,
}

/// A post row joined with its author projection.
///
/// `id` and `created_at` are server-assigned. `image_id` is set client-side
/// before insert and immutable afterwards; a non-null `image_id` whose upload
/// failed is a dangling reference, rendered as a broken link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub user_id: String,
    #[serde(default)]
    pub image_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Joined `user_data(email)` projection; absent if the join returned
    /// nothing for this row.
    #[serde(rename = "user_data", default)]
    pub author: Option<Author>,
}

impl Post {
    /// Returns the author email for display, or a placeholder when the
    /// join produced no row.
    pub fn author_email(&self) -> &str {
        self.author.as_ref().map_or("(unknown)", |a| a.email.as_str())
    }
}

/// Insert payload for a new post row.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub content: String,
    pub user_id: String,
    pub image_id: Option<String>,
}
