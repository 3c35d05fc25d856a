mod pagination;
mod request;
mod response;
mod validation;
mod wrapper;

pub use pagination::*;
pub use request::*;
pub use response::*;
pub use validation::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct PageQueryParams {
    #[serde(default = "get_default_page")]
    pub page: u32,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PostQueryParams {
    #[serde(default = "get_default_page")]
    pub page: u32,
    #[serde(default)]
    pub reply: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentManageQueryParams {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "get_default_page")]
    pub page: u32,
}

fn get_default_page() -> u32 {
    1
}

/// Which comments the moderation listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    Unread,
    AdminAuthored,
}

impl CommentFilter {
    /// Unknown values fall back to `All`.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("unread") => CommentFilter::Unread,
            Some("admin") => CommentFilter::AdminAuthored,
            _ => CommentFilter::All,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            CommentFilter::All => "all",
            CommentFilter::Unread => "unread",
            CommentFilter::AdminAuthored => "admin",
        }
    }
}
