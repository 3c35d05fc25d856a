use sqlx::SqlitePool;

use crate::{data_formats::LinkRequest, errors::RequestError, models::Link};

pub async fn list_links(pool: &SqlitePool) -> Result<Vec<Link>, RequestError> {
    let links = sqlx::query_as::<_, Link>("SELECT * FROM links ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(links)
}

pub async fn create_link_in_db(
    pool: &SqlitePool,
    LinkRequest { name, url }: LinkRequest,
) -> Result<Link, RequestError> {
    let mut tx = pool.begin().await?;
    let link = sqlx::query_as::<_, Link>(
        r#"
        INSERT INTO links (name, url) VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(url)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(link)
}

pub async fn update_link_in_db(
    pool: &SqlitePool,
    id: i64,
    LinkRequest { name, url }: LinkRequest,
) -> Result<Link, RequestError> {
    let mut tx = pool.begin().await?;
    let link = sqlx::query_as::<_, Link>(
        r#"
        UPDATE links SET name = $1, url = $2 WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(url)
    .bind(id)
    .fetch_optional(&mut tx)
    .await?;
    tx.commit().await?;
    link.ok_or(RequestError::NotFound("Link not found"))
}

pub async fn delete_link_in_db(pool: &SqlitePool, id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM links WHERE id = $1")
        .bind(id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("Link not found"));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::test_support::test_pool;

    fn request(name: &str, url: &str) -> LinkRequest {
        LinkRequest {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn links_crud() {
        let pool = test_pool().await;
        let github = create_link_in_db(&pool, request("GitHub", "https://github.com"))
            .await
            .unwrap();
        create_link_in_db(&pool, request("Blog", "https://example.com"))
            .await
            .unwrap();
        let names: Vec<String> = list_links(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|link| link.name)
            .collect();
        assert_eq!(names, vec!["Blog", "GitHub"]);

        let edited = update_link_in_db(&pool, github.id, request("Code", "https://git.example"))
            .await
            .unwrap();
        assert_eq!(edited.url, "https://git.example");

        delete_link_in_db(&pool, github.id).await.unwrap();
        assert!(matches!(
            delete_link_in_db(&pool, github.id).await,
            Err(RequestError::NotFound(_))
        ));
        assert_eq!(list_links(&pool).await.unwrap().len(), 1);
    }
}
