use std::{net::SocketAddr, path::PathBuf};

use envconfig::Envconfig;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL", default = "sqlite://greybook.db")]
    pub database_url: String,

    #[envconfig(from = "GREYBOOK_BIND", default = "127.0.0.1:3001")]
    pub bind_address: SocketAddr,

    /// External base URL used in links sent by mail.
    #[envconfig(from = "GREYBOOK_SITE_URL", default = "http://127.0.0.1:3001")]
    pub site_url: String,

    #[envconfig(from = "SECRET_KEY", default = "dev key")]
    pub secret_key: String,

    /// Display name stamped on comments written by the owner.
    #[envconfig(from = "GREYBOOK_ADMIN", default = "Admin")]
    pub admin_name: String,

    #[envconfig(from = "GREYBOOK_ADMIN_EMAIL", default = "admin@example.com")]
    pub admin_email: String,

    #[envconfig(from = "GREYBOOK_ADMIN_SITE", default = "/")]
    pub admin_site: String,

    #[envconfig(from = "GREYBOOK_ADMIN_USERNAME", default = "admin")]
    pub admin_username: String,

    /// When set, startup creates the admin account (or resets its credentials).
    #[envconfig(from = "GREYBOOK_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    #[envconfig(from = "GREYBOOK_POST_PER_PAGE", default = "10")]
    pub post_per_page: u32,

    #[envconfig(from = "GREYBOOK_MANAGE_POST_PER_PAGE", default = "15")]
    pub manage_post_per_page: u32,

    #[envconfig(from = "GREYBOOK_COMMENT_PER_PAGE", default = "15")]
    pub comment_per_page: u32,

    #[envconfig(from = "GREYBOOK_UPLOAD_PATH", default = "uploads")]
    pub upload_path: PathBuf,

    #[envconfig(
        from = "GREYBOOK_ALLOWED_IMAGE_EXTENSIONS",
        default = "png,jpg,jpeg,gif,webp"
    )]
    pub allowed_image_extensions: String,

    #[envconfig(from = "GREYBOOK_THEMES", default = "default,dark")]
    pub themes: String,

    #[envconfig(from = "GREYBOOK_SLOW_QUERY_THRESHOLD_MS", default = "1000")]
    pub slow_query_threshold_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Self::init_from_env()
    }

    pub fn owner(&self) -> OwnerIdentity {
        OwnerIdentity {
            name: self.admin_name.clone(),
            email: self.admin_email.clone(),
            site: self.admin_site.clone(),
        }
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        split_list(&self.allowed_image_extensions)
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }

    pub fn has_theme(&self, theme: &str) -> bool {
        split_list(&self.themes).any(|known| known == theme)
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// The fixed identity written onto every owner-authored comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerIdentity {
    pub name: String,
    pub email: String,
    pub site: String,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.admin_name, "Admin");
        assert_eq!(config.comment_per_page, 15);
        assert!(config.admin_password.is_none());
        assert_eq!(config.bind_address.port(), 3001);
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        let mut vars = HashMap::new();
        vars.insert(
            "GREYBOOK_ALLOWED_IMAGE_EXTENSIONS".to_string(),
            "png, jpg".to_string(),
        );
        let config = Config::init_from_hashmap(&vars).unwrap();
        assert!(config.is_allowed_extension("PNG"));
        assert!(config.is_allowed_extension("jpg"));
        assert!(!config.is_allowed_extension("exe"));
        assert!(!config.is_allowed_extension(""));
    }

    #[test]
    fn owner_identity_comes_from_config() {
        let mut vars = HashMap::new();
        vars.insert("GREYBOOK_ADMIN".to_string(), "Grey Li".to_string());
        let config = Config::init_from_hashmap(&vars).unwrap();
        let owner = config.owner();
        assert_eq!(owner.name, "Grey Li");
        assert_eq!(owner.email, "admin@example.com");
        assert_eq!(owner.site, "/");
    }
}
