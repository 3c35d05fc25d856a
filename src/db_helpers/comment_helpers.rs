use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    data_formats::{CommentFilter, PageRequest, Paginated},
    errors::RequestError,
    models::{Comment, NewComment, Post},
};

/// A freshly written comment along with what notifications need to know.
#[derive(Debug)]
pub struct CreatedComment {
    pub comment: Comment,
    pub post: Post,
    pub replied: Option<Comment>,
}

pub async fn get_comment_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Comment>, RequestError> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(comment)
}

/// Writes a new comment. With `replied_id` the comment is threaded under that
/// comment and lands on its post. Fails when the target post is missing or
/// has comments disabled.
pub async fn create_comment_in_db(
    pool: &SqlitePool,
    new: NewComment,
    replied_id: Option<i64>,
) -> Result<CreatedComment, RequestError> {
    let mut tx = pool.begin().await?;

    let (new, replied) = match replied_id {
        Some(replied_id) => {
            let replied = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
                .bind(replied_id)
                .fetch_optional(&mut tx)
                .await?;
            match replied {
                Some(replied) => (new.reply_to(&replied), Some(replied)),
                None => return Err(RequestError::NotFound("Comment not found")),
            }
        }
        None => (new, None),
    };

    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(new.post_id)
        .fetch_optional(&mut tx)
        .await?;
    let post = match post {
        Some(post) => post,
        None => return Err(RequestError::NotFound("Post not found")),
    };
    if post.no_comment {
        return Err(RequestError::Forbidden("Comment is disabled."));
    }

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (author, email, site, body, created_time, updated_time,
                              reviewed, reviewed_time, from_admin, replied_id, post_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(new.author)
    .bind(new.email)
    .bind(new.site)
    .bind(new.body)
    .bind(new.created_time)
    .bind(new.created_time)
    .bind(new.reviewed)
    .bind(new.reviewed_time)
    .bind(new.from_admin)
    .bind(new.replied_id)
    .bind(new.post_id)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    tracing::info!(
        comment = comment.id,
        post = post.id,
        reply_to = ?comment.replied_id,
        from_admin = comment.from_admin,
        "comment created"
    );
    Ok(CreatedComment {
        comment,
        post,
        replied,
    })
}

/// Published comments of a post, oldest first.
pub async fn list_reviewed_comments_for_post(
    pool: &SqlitePool,
    post_id: i64,
    page: PageRequest,
) -> Result<Paginated<Comment>, RequestError> {
    let total = reviewed_count(pool, post_id).await?;
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT * FROM comments
        WHERE post_id = $1 AND reviewed = 1
        ORDER BY created_time ASC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(post_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;
    Ok(Paginated::new(comments, page, total))
}

pub async fn reviewed_count(pool: &SqlitePool, post_id: i64) -> Result<i64, RequestError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1 AND reviewed = 1")
            .bind(post_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn count_unread_comments(pool: &SqlitePool) -> Result<i64, RequestError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE reviewed = 0")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// The moderation listing, newest first.
pub async fn list_comments_for_review(
    pool: &SqlitePool,
    filter: CommentFilter,
    page: PageRequest,
) -> Result<Paginated<Comment>, RequestError> {
    let predicate = match filter {
        CommentFilter::All => "",
        CommentFilter::Unread => "WHERE reviewed = 0",
        CommentFilter::AdminAuthored => "WHERE from_admin = 1",
    };
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM comments {}", predicate))
        .fetch_one(pool)
        .await?;
    let query = format!(
        "SELECT * FROM comments {} ORDER BY created_time DESC, id DESC LIMIT $1 OFFSET $2",
        predicate
    );
    let comments = sqlx::query_as::<_, Comment>(&query)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok(Paginated::new(comments, page, total))
}

pub async fn approve_comment_in_db(pool: &SqlitePool, id: i64) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    let mut comment = match comment {
        Some(comment) => comment,
        None => return Err(RequestError::NotFound("Comment not found")),
    };
    comment.review(Utc::now());
    sqlx::query("UPDATE comments SET reviewed = $1, reviewed_time = $2 WHERE id = $3")
        .bind(comment.reviewed)
        .bind(comment.reviewed_time)
        .bind(comment.id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(comment)
}

/// Publishes every pending comment in one transaction: all of them change or
/// none do. Returns how many were published.
pub async fn approve_all_pending_in_db(pool: &SqlitePool) -> Result<usize, RequestError> {
    let mut tx = pool.begin().await?;
    let pending = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE reviewed = 0")
        .fetch_all(&mut tx)
        .await?;
    let now = Utc::now();
    for mut comment in pending.iter().cloned() {
        comment.review(now);
        sqlx::query("UPDATE comments SET reviewed = $1, reviewed_time = $2 WHERE id = $3")
            .bind(comment.reviewed)
            .bind(comment.reviewed_time)
            .bind(comment.id)
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;
    tracing::info!(count = pending.len(), "approved pending comments");
    Ok(pending.len())
}

/// A comment and every reply below it, as `subtree(id)`.
const THREAD_CTE: &str = r#"
    WITH RECURSIVE subtree(id) AS (
        SELECT id FROM comments WHERE id = $1
        UNION ALL
        SELECT comments.id FROM comments JOIN subtree ON comments.replied_id = subtree.id
    )"#;

/// Deletes the comment and every reply below it. Returns the number of rows
/// removed.
pub async fn delete_comment_in_db(pool: &SqlitePool, id: i64) -> Result<u64, RequestError> {
    let mut tx = pool.begin().await?;
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    if exists.is_none() {
        return Err(RequestError::NotFound("Comment not found"));
    }
    // rows_affected() misses rows removed by ON DELETE CASCADE.
    let deleted: i64 =
        sqlx::query_scalar(&format!("{} SELECT COUNT(*) FROM subtree", THREAD_CTE))
            .bind(id)
            .fetch_one(&mut tx)
            .await?;
    sqlx::query(&format!(
        "{} DELETE FROM comments WHERE id IN (SELECT id FROM subtree)",
        THREAD_CTE
    ))
    .bind(id)
    .execute(&mut tx)
    .await?;
    tx.commit().await?;
    tracing::info!(comment = id, deleted, "deleted comment thread");
    Ok(deleted as u64)
}
