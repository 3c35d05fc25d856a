use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{config::OwnerIdentity, data_formats::CommentRequest};

/// The site owner. Only the argon2 hash of the password is ever stored and it
/// is deliberately left out of every serialized form.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub blog_title: String,
    pub blog_sub_title: String,
    pub name: String,
    pub about: String,
    pub custom_footer: Option<String>,
    pub custom_css: Option<String>,
    pub custom_js: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    pub const DEFAULT_ID: i64 = 1;

    pub fn is_default(&self) -> bool {
        self.id == Self::DEFAULT_ID
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub no_comment: bool,
    pub category_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentState {
    Pending,
    Published,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub email: String,
    pub site: Option<String>,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
    pub reviewed: bool,
    pub reviewed_time: Option<DateTime<Utc>>,
    pub from_admin: bool,
    pub replied_id: Option<i64>,
    pub post_id: i64,
}

impl Comment {
    pub fn state(&self) -> CommentState {
        if self.reviewed {
            CommentState::Published
        } else {
            CommentState::Pending
        }
    }

    /// Publishes the comment. Calling it again on a published comment only
    /// moves `reviewed_time` forward; there is no way back to pending.
    pub fn review(&mut self, now: DateTime<Utc>) {
        self.reviewed = true;
        self.reviewed_time = Some(now);
    }
}

/// A comment that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author: String,
    pub email: String,
    pub site: Option<String>,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub reviewed: bool,
    pub reviewed_time: Option<DateTime<Utc>>,
    pub from_admin: bool,
    pub replied_id: Option<i64>,
    pub post_id: i64,
}

impl NewComment {
    /// Owner comments are published on creation and always carry the owner
    /// identity, whatever the submitted author fields said.
    pub fn new(
        CommentRequest {
            author,
            email,
            site,
            body,
        }: CommentRequest,
        from_admin: bool,
        post_id: i64,
        owner: &OwnerIdentity,
        now: DateTime<Utc>,
    ) -> Self {
        let site = site.filter(|site| !site.trim().is_empty());
        if from_admin {
            NewComment {
                author: owner.name.clone(),
                email: owner.email.clone(),
                site: Some(owner.site.clone()),
                body,
                created_time: now,
                reviewed: true,
                reviewed_time: Some(now),
                from_admin,
                replied_id: None,
                post_id,
            }
        } else {
            NewComment {
                author,
                email,
                site,
                body,
                created_time: now,
                reviewed: false,
                reviewed_time: None,
                from_admin,
                replied_id: None,
                post_id,
            }
        }
    }

    /// Threads this comment under `replied`. The reply always lands on the
    /// replied comment's post.
    pub fn reply_to(mut self, replied: &Comment) -> Self {
        self.replied_id = Some(replied.id);
        self.post_id = replied.post_id;
        self
    }

    pub fn state(&self) -> CommentState {
        if self.reviewed {
            CommentState::Published
        } else {
            CommentState::Pending
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn owner() -> OwnerIdentity {
        OwnerIdentity {
            name: "Admin".to_string(),
            email: "owner@example.com".to_string(),
            site: "/".to_string(),
        }
    }

    fn request() -> CommentRequest {
        CommentRequest {
            author: "Mallory".to_string(),
            email: "mallory@example.com".to_string(),
            site: Some("https://mallory.example".to_string()),
            body: "Nice post".to_string(),
        }
    }

    fn stored(id: i64, post_id: i64) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            author: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            site: None,
            body: "first".to_string(),
            created_time: now,
            updated_time: now,
            reviewed: false,
            reviewed_time: None,
            from_admin: false,
            replied_id: None,
            post_id,
        }
    }

    #[test]
    fn admin_comment_is_published_with_owner_identity() {
        let now = Utc::now();
        let comment = NewComment::new(request(), true, 7, &owner(), now);
        assert_eq!(comment.state(), CommentState::Published);
        assert_eq!(comment.reviewed_time, Some(now));
        assert_eq!(comment.author, "Admin");
        assert_eq!(comment.email, "owner@example.com");
        assert_eq!(comment.site.as_deref(), Some("/"));
        assert_eq!(comment.body, "Nice post");
    }

    #[test]
    fn public_comment_starts_pending() {
        let comment = NewComment::new(request(), false, 7, &owner(), Utc::now());
        assert_eq!(comment.state(), CommentState::Pending);
        assert_eq!(comment.author, "Mallory");
        assert!(comment.reviewed_time.is_none());
    }

    #[test]
    fn blank_site_is_dropped() {
        let mut request = request();
        request.site = Some("  ".to_string());
        let comment = NewComment::new(request, false, 7, &owner(), Utc::now());
        assert!(comment.site.is_none());
    }

    #[test]
    fn reply_inherits_post_of_replied_comment() {
        let replied = stored(3, 11);
        let reply = NewComment::new(request(), false, 99, &owner(), Utc::now()).reply_to(&replied);
        assert_eq!(reply.post_id, 11);
        assert_eq!(reply.replied_id, Some(3));
    }

    #[test]
    fn review_is_monotonic_and_restamps() {
        let mut comment = stored(1, 1);
        let first = Utc::now();
        comment.review(first);
        assert_eq!(comment.state(), CommentState::Published);
        let later = first + Duration::seconds(5);
        comment.review(later);
        assert_eq!(comment.state(), CommentState::Published);
        assert_eq!(comment.reviewed_time, Some(later));
    }

    #[test]
    fn state_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&CommentState::Published).unwrap(),
            r#""published""#
        );
        let state: CommentState = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(state, CommentState::Pending);
    }
}
