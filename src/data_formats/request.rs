use serde::{Deserialize, Serialize};

use super::validation::{Rule, Validate, ValidationErrors};
use crate::models::Category;

// ----------------- Auth Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::default()
            .field("username", &self.username, &[Rule::Required, Rule::Length(1, 20)])
            .field("password", &self.password, &[Rule::Required, Rule::Length(1, 120)])
            .into_result()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SettingsRequest {
    pub name: String,
    pub blog_title: String,
    pub blog_sub_title: String,
    pub about: String,
    #[serde(default)]
    pub custom_footer: Option<String>,
    #[serde(default)]
    pub custom_css: Option<String>,
    #[serde(default)]
    pub custom_js: Option<String>,
}

impl Validate for SettingsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::default()
            .field("name", &self.name, &[Rule::Required, Rule::Length(1, 30)])
            .field("blog_title", &self.blog_title, &[Rule::Required, Rule::Length(1, 60)])
            .field(
                "blog_sub_title",
                &self.blog_sub_title,
                &[Rule::Required, Rule::Length(1, 100)],
            )
            .field("about", &self.about, &[Rule::Required])
            .into_result()
    }
}

// ----------------- Post Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PostRequest {
    pub title: String,
    pub body: String,
    #[serde(default = "default_category")]
    pub category: i64,
}

fn default_category() -> i64 {
    Category::DEFAULT_ID
}

impl Validate for PostRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::default()
            .field("title", &self.title, &[Rule::Required, Rule::Length(1, 60)])
            .field("body", &self.body, &[Rule::Required])
            .into_result()
    }
}

// ----------------- Category Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
}

impl Validate for CategoryRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::default()
            .field("name", &self.name, &[Rule::Required, Rule::Length(1, 30)])
            .into_result()
    }
}

// ----------------- Comment Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CommentRequest {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub site: Option<String>,
    pub body: String,
}

impl CommentRequest {
    /// The owner's author fields are replaced on creation, so only the body
    /// is checked for them.
    pub fn validate_for(&self, from_admin: bool) -> Result<(), ValidationErrors> {
        let errors = ValidationErrors::default().field("body", &self.body, &[Rule::Required]);
        if from_admin {
            return errors.into_result();
        }
        errors
            .field("author", &self.author, &[Rule::Required, Rule::Length(1, 30)])
            .field(
                "email",
                &self.email,
                &[Rule::Required, Rule::Email, Rule::Length(1, 254)],
            )
            .field(
                "site",
                self.site.as_deref().unwrap_or_default(),
                &[Rule::Optional, Rule::Url, Rule::Length(0, 255)],
            )
            .into_result()
    }
}

// ----------------- Link Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LinkRequest {
    pub name: String,
    pub url: String,
}

impl Validate for LinkRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        ValidationErrors::default()
            .field("name", &self.name, &[Rule::Required, Rule::Length(1, 30)])
            .field(
                "url",
                &self.url,
                &[Rule::Required, Rule::Url, Rule::Length(1, 255)],
            )
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(author: &str, email: &str, site: Option<&str>) -> CommentRequest {
        CommentRequest {
            author: author.to_string(),
            email: email.to_string(),
            site: site.map(str::to_string),
            body: "hello".to_string(),
        }
    }

    #[test]
    fn public_comment_needs_author_and_email() {
        let errors = comment("", "not-an-email", None).validate_for(false).unwrap_err();
        assert!(errors.fields().contains_key("author"));
        assert!(errors.fields().contains_key("email"));
        assert!(!errors.fields().contains_key("site"));
    }

    #[test]
    fn admin_comment_only_needs_body() {
        assert!(comment("", "", None).validate_for(true).is_ok());
        let mut empty = comment("", "", None);
        empty.body.clear();
        let errors = empty.validate_for(true).unwrap_err();
        assert_eq!(errors.fields().len(), 1);
    }

    #[test]
    fn comment_site_must_be_a_url_when_given() {
        assert!(comment("Ann", "ann@example.com", Some("https://ann.example"))
            .validate_for(false)
            .is_ok());
        let errors = comment("Ann", "ann@example.com", Some("ann"))
            .validate_for(false)
            .unwrap_err();
        assert!(errors.fields().contains_key("site"));
    }

    #[test]
    fn post_title_length_is_bounded() {
        let post = PostRequest {
            title: "t".repeat(61),
            body: "body".to_string(),
            category: 1,
        };
        assert!(post.validate().unwrap_err().fields().contains_key("title"));
    }

    #[test]
    fn post_category_defaults_to_default_category() {
        let post: PostRequest = serde_json::from_str(r#"{"title":"a","body":"b"}"#).unwrap();
        assert_eq!(post.category, Category::DEFAULT_ID);
    }
}
