use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Admin, Category, Comment, CommentState, Link, Post};

use super::pagination::Paginated;
use crate::uploads::UPLOAD_URL_PREFIX;

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AdminSettingsResponse {
    pub username: String,
    pub name: String,
    pub blog_title: String,
    pub blog_sub_title: String,
    pub about: String,
    pub custom_footer: Option<String>,
    pub custom_css: Option<String>,
    pub custom_js: Option<String>,
}

/// Public view of a comment: the author's email stays private.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub site: Option<String>,
    pub body: String,
    pub created_time: DateTime<Utc>,
    pub state: CommentState,
    pub from_admin: bool,
    pub replied_id: Option<i64>,
    pub post_id: i64,
}

#[derive(Serialize, Debug)]
pub struct PostPageResponse {
    pub post: Post,
    pub category: Category,
    pub reviewed_count: i64,
    pub comments: Paginated<CommentResponse>,
}

#[derive(Serialize, Debug)]
pub struct CategoryPageResponse {
    pub category: Category,
    pub posts: Paginated<Post>,
}

#[derive(Serialize, Debug)]
pub struct SidebarResponse {
    pub admin: Option<AdminSettingsResponse>,
    pub categories: Vec<Category>,
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_comments: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct UploadResponse {
    pub uploaded: u8,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub url: String,
}

impl AdminSettingsResponse {
    pub fn new(
        Admin {
            username,
            name,
            blog_title,
            blog_sub_title,
            about,
            custom_footer,
            custom_css,
            custom_js,
            ..
        }: Admin,
    ) -> Self {
        AdminSettingsResponse {
            username,
            name,
            blog_title,
            blog_sub_title,
            about,
            custom_footer,
            custom_css,
            custom_js,
        }
    }
}

impl CommentResponse {
    pub fn new(comment: Comment) -> Self {
        let state = comment.state();
        let Comment {
            id,
            author,
            site,
            body,
            created_time,
            from_admin,
            replied_id,
            post_id,
            ..
        } = comment;
        CommentResponse {
            id,
            author,
            site,
            body,
            created_time,
            state,
            from_admin,
            replied_id,
            post_id,
        }
    }
}

impl UploadResponse {
    pub fn new(file_name: String) -> Self {
        UploadResponse {
            uploaded: 1,
            url: format!("{}{}", UPLOAD_URL_PREFIX, file_name),
            file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn comment_response_hides_email_and_reads_back() {
        let now = Utc::now();
        let comment = Comment {
            id: 3,
            author: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            site: None,
            body: "hi".to_string(),
            created_time: now,
            updated_time: now,
            reviewed: false,
            reviewed_time: None,
            from_admin: false,
            replied_id: None,
            post_id: 1,
        };
        let json = serde_json::to_value(CommentResponse::new(comment)).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["state"], "pending");

        let parsed: CommentResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.state, CommentState::Pending);
        assert_eq!(parsed.author, "Ann");
    }
}
