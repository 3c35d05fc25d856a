use sqlx::SqlitePool;

use crate::{
    data_formats::{CategoryRequest, ValidationErrors},
    errors::RequestError,
    models::Category,
};

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

pub async fn get_category_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Category>, RequestError> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

fn name_in_use(error: RequestError) -> RequestError {
    if error.is_unique_violation() {
        return ValidationErrors::single("name", "Name already in use.").into();
    }
    error
}

pub async fn create_category_in_db(
    pool: &SqlitePool,
    CategoryRequest { name }: CategoryRequest,
) -> Result<Category, RequestError> {
    let mut tx = pool.begin().await?;
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name) VALUES ($1)
        RETURNING *
        "#,
    )
    .bind(name)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| name_in_use(e.into()))?;
    tx.commit().await?;
    Ok(category)
}

pub async fn rename_category_in_db(
    pool: &SqlitePool,
    id: i64,
    CategoryRequest { name }: CategoryRequest,
) -> Result<Category, RequestError> {
    if id == Category::DEFAULT_ID {
        return Err(RequestError::Forbidden(
            "You can not edit the default category.",
        ));
    }
    let mut tx = pool.begin().await?;
    let category = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories SET name = $1 WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(id)
    .fetch_optional(&mut tx)
    .await
    .map_err(|e| name_in_use(e.into()))?;
    tx.commit().await?;
    category.ok_or(RequestError::NotFound("Category not found"))
}

/// Moves the category's posts to the default category, then removes it.
/// Returns `false` (and changes nothing) for the default category.
pub async fn delete_category_in_db(pool: &SqlitePool, id: i64) -> Result<bool, RequestError> {
    let mut tx = pool.begin().await?;
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    let category = match category {
        Some(category) => category,
        None => return Err(RequestError::NotFound("Category not found")),
    };
    if category.is_default() {
        return Ok(false);
    }

    let moved = sqlx::query("UPDATE posts SET category_id = $1 WHERE category_id = $2")
        .bind(Category::DEFAULT_ID)
        .bind(category.id)
        .execute(&mut tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category.id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    tracing::info!(category = category.id, moved, "deleted category");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_formats::PostRequest,
        db_helpers::{create_post_in_db, get_post_by_id, test_support::test_pool},
    };

    fn request(name: &str) -> CategoryRequest {
        CategoryRequest {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn default_category_exists_after_migration() {
        let pool = test_pool().await;
        let default = get_category_by_id(&pool, Category::DEFAULT_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.name, "Default");
    }

    #[tokio::test]
    async fn duplicate_name_is_a_field_error() {
        let pool = test_pool().await;
        create_category_in_db(&pool, request("Rust")).await.unwrap();
        match create_category_in_db(&pool, request("Rust")).await {
            Err(RequestError::Validation(errors)) => {
                assert_eq!(errors.fields()["name"], vec!["Name already in use."])
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn deleting_category_moves_posts_to_default() {
        let pool = test_pool().await;
        let rust = create_category_in_db(&pool, request("Rust")).await.unwrap();
        let post = create_post_in_db(
            &pool,
            PostRequest {
                title: "Ownership".to_string(),
                body: "borrowck".to_string(),
                category: rust.id,
            },
        )
        .await
        .unwrap();

        assert!(delete_category_in_db(&pool, rust.id).await.unwrap());
        assert!(get_category_by_id(&pool, rust.id).await.unwrap().is_none());
        let post = get_post_by_id(&pool, post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, Category::DEFAULT_ID);
    }

    #[tokio::test]
    async fn default_category_cannot_be_deleted_or_renamed() {
        let pool = test_pool().await;
        assert!(!delete_category_in_db(&pool, Category::DEFAULT_ID).await.unwrap());
        assert!(get_category_by_id(&pool, Category::DEFAULT_ID)
            .await
            .unwrap()
            .is_some());
        assert!(matches!(
            rename_category_in_db(&pool, Category::DEFAULT_ID, request("Other")).await,
            Err(RequestError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let pool = test_pool().await;
        assert!(matches!(
            delete_category_in_db(&pool, 42).await,
            Err(RequestError::NotFound(_))
        ));
    }
}
