use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::Context;
use regex::Regex;

use crate::config::Config;

pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

pub fn allowed_file(config: &Config, filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, extension)) => config.is_allowed_extension(extension),
        None => false,
    }
}

/// A fresh name that keeps the original extension and nothing else of the
/// client-supplied name.
pub fn random_filename(old_filename: &str) -> String {
    let extension = Path::new(old_filename)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| format!(".{}", extension))
        .unwrap_or_default();
    format!("{}{}", uuid::Uuid::new_v4().simple(), extension)
}

/// A bare file name with no way to climb out of the upload directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

fn image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<img[^>]*?src="/uploads/([^"]+)""#).expect("image pattern is valid")
    })
}

/// Names of uploaded images referenced from a post body.
pub fn images_in_body(body: &str) -> Vec<String> {
    image_pattern()
        .captures_iter(body)
        .map(|captures| captures[1].to_string())
        .filter(|name| is_safe_filename(name))
        .collect()
}

pub async fn save_upload(
    upload_path: &Path,
    filename: &str,
    data: &[u8],
) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(upload_path)
        .await
        .with_context(|| format!("Failed to create {}", upload_path.display()))?;
    let path = upload_path.join(filename);
    tokio::fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Removes the uploaded images a deleted post pointed at. Missing files are
/// skipped.
pub async fn remove_post_images(upload_path: &Path, body: &str) {
    for image in images_in_body(body) {
        let path = upload_path.join(&image);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "removed post image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not remove post image")
            }
        }
    }
}
