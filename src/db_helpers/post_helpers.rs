use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    data_formats::{PageRequest, Paginated, PostRequest, ValidationErrors},
    errors::RequestError,
    models::Post,
};

pub async fn get_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

/// Newest first.
pub async fn list_posts(
    pool: &SqlitePool,
    page: PageRequest,
) -> Result<Paginated<Post>, RequestError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT * FROM posts
        ORDER BY created_time DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(Paginated::new(posts, page, total))
}

pub async fn list_posts_in_category(
    pool: &SqlitePool,
    category_id: i64,
    page: PageRequest,
) -> Result<Paginated<Post>, RequestError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE category_id = $1")
        .bind(category_id)
        .fetch_one(pool)
        .await?;
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT * FROM posts
        WHERE category_id = $1
        ORDER BY created_time DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(category_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(Paginated::new(posts, page, total))
}

async fn ensure_category_exists(
    tx: &mut Transaction<'static, Sqlite>,
    category_id: i64,
) -> Result<(), RequestError> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&mut *tx)
        .await?;
    match exists {
        Some(_) => Ok(()),
        None => Err(ValidationErrors::single("category", "Not a valid choice.").into()),
    }
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    PostRequest {
        title,
        body,
        category,
    }: PostRequest,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_category_exists(&mut tx, category).await?;
    let now = Utc::now();
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (title, body, created_time, updated_time, no_comment, category_id)
        VALUES ($1, $2, $3, $4, 0, $5)
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(body)
    .bind(now)
    .bind(now)
    .bind(category)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(post)
}

pub async fn update_post_in_db(
    pool: &SqlitePool,
    id: i64,
    PostRequest {
        title,
        body,
        category,
    }: PostRequest,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_category_exists(&mut tx, category).await?;
    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts SET title = $1, body = $2, category_id = $3, updated_time = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(body)
    .bind(category)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    post.ok_or(RequestError::NotFound("Post not found"))
}

/// Deletes the post together with every comment and reply under it.
/// Returns the removed post so callers can clean up its uploads.
pub async fn delete_post_in_db(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    let post = match post {
        Some(post) => post,
        None => return Err(RequestError::NotFound("Post not found")),
    };
    let comments = sqlx::query("DELETE FROM comments WHERE post_id = $1")
        .bind(post.id)
        .execute(&mut tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post.id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!(post = post.id, comments, "deleted post");
    Ok(post)
}

pub async fn toggle_no_comment_in_db(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;
    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts SET no_comment = NOT no_comment WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    post.ok_or(RequestError::NotFound("Post not found"))
}
