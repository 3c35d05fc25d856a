use serde::{Deserialize, Serialize};

use crate::models::{Category, Comment, Link, Post};

use super::pagination::Paginated;

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentWrapper<T> {
    pub comment: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostWrapper<T> {
    pub post: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryWrapper<T> {
    pub category: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LinkWrapper<T> {
    pub link: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SettingsWrapper<T> {
    pub settings: T,
}

#[derive(Debug, Serialize)]
pub struct MultiplePostsWrapper {
    pub posts: Paginated<Post>,
}

#[derive(Debug, Serialize)]
pub struct MultipleCommentsWrapper {
    pub filter: &'static str,
    pub comments: Paginated<Comment>,
}

#[derive(Debug, Serialize)]
pub struct MultipleCategoriesWrapper {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct MultipleLinksWrapper {
    pub links: Vec<Link>,
}
