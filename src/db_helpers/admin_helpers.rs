use sqlx::SqlitePool;

use crate::{
    authentication::hash_password_argon2, data_formats::SettingsRequest, errors::RequestError,
    models::Admin,
};

/// The blog has a single owner; this is that row if it exists.
pub async fn get_admin(pool: &SqlitePool) -> Result<Option<Admin>, RequestError> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admin ORDER BY id LIMIT 1")
        .fetch_optional(pool)
        .await?;
    Ok(admin)
}

pub async fn get_admin_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Admin>, RequestError> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admin WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(admin)
}

/// Creates the admin with the stock blog settings, or resets the existing
/// admin's credentials. Only the password hash reaches the database.
pub async fn ensure_admin_in_db(
    pool: &SqlitePool,
    username: &str,
    password: String,
) -> Result<Admin, RequestError> {
    let password_hash = hash_password_argon2(password).await.map_err(|e| {
        tracing::error!(error = %e, "could not hash admin password");
        RequestError::ServerError
    })?;

    let mut tx = pool.begin().await?;
    let existing = sqlx::query_as::<_, Admin>("SELECT * FROM admin ORDER BY id LIMIT 1")
        .fetch_optional(&mut tx)
        .await?;
    let admin = match existing {
        Some(admin) => {
            tracing::info!(username, "updating administrator account");
            sqlx::query_as::<_, Admin>(
                r#"
                UPDATE admin SET username = $1, password_hash = $2 WHERE id = $3
                RETURNING *
                "#,
            )
            .bind(username)
            .bind(&password_hash)
            .bind(admin.id)
            .fetch_one(&mut tx)
            .await?
        }
        None => {
            tracing::info!(username, "creating administrator account");
            sqlx::query_as::<_, Admin>(
                r#"
                INSERT INTO admin (username, password_hash, blog_title, blog_sub_title, name, about)
                VALUES ($1, $2, 'Blog Title', 'Blog Sub Title', 'Admin', 'Anything about you.')
                RETURNING *
                "#,
            )
            .bind(username)
            .bind(&password_hash)
            .fetch_one(&mut tx)
            .await?
        }
    };
    tx.commit().await?;
    Ok(admin)
}

pub async fn update_settings_in_db(
    pool: &SqlitePool,
    id: i64,
    SettingsRequest {
        name,
        blog_title,
        blog_sub_title,
        about,
        custom_footer,
        custom_css,
        custom_js,
    }: SettingsRequest,
) -> Result<Admin, RequestError> {
    let mut tx = pool.begin().await?;
    let admin = sqlx::query_as::<_, Admin>(
        r#"
        UPDATE admin
        SET name = $1, blog_title = $2, blog_sub_title = $3, about = $4,
            custom_footer = $5, custom_css = $6, custom_js = $7
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(blog_title)
    .bind(blog_sub_title)
    .bind(about)
    .bind(custom_footer)
    .bind(custom_css)
    .bind(custom_js)
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    admin.ok_or(RequestError::NotFound("Admin not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{authentication::verify_password_argon2, db_helpers::test_support::test_pool};

    #[tokio::test]
    async fn ensure_admin_creates_then_updates_single_row() {
        let pool = test_pool().await;
        let created = ensure_admin_in_db(&pool, "grey", "first".to_string()).await.unwrap();
        assert_eq!(created.blog_title, "Blog Title");
        assert_ne!(created.password_hash, "first");

        let updated = ensure_admin_in_db(&pool, "li", "second".to_string()).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.username, "li");
        assert!(verify_password_argon2("second".to_string(), &updated.password_hash)
            .await
            .unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn settings_update_persists() {
        let pool = test_pool().await;
        let admin = ensure_admin_in_db(&pool, "grey", "pw".to_string()).await.unwrap();
        let updated = update_settings_in_db(
            &pool,
            admin.id,
            SettingsRequest {
                name: "Grey".to_string(),
                blog_title: "Greybook".to_string(),
                blog_sub_title: "notes".to_string(),
                about: "about me".to_string(),
                custom_footer: None,
                custom_css: Some("body {}".to_string()),
                custom_js: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.blog_title, "Greybook");
        assert_eq!(updated.custom_css.as_deref(), Some("body {}"));
        assert_eq!(
            get_admin(&pool).await.unwrap().unwrap().name,
            "Grey"
        );
    }
}
