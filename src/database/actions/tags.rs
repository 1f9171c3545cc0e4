use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::ApiResult,
    schema::{Id, NewTag, Tag},
};

use super::MAX_BIND_PARAMETERS;

pub async fn list_tags(pool: &Pool<Postgres>) -> ApiResult<Vec<Tag>> {
    let list: Vec<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<Tag>> {
    let tag: Option<Tag> = sqlx::query_as("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

/// Inserts the tags that do not exist yet and returns how many were new.
pub async fn insert_tags(tags: &[NewTag], pool: &Pool<Postgres>) -> ApiResult<u64> {
    let mut inserted = 0;

    for chunk in tags.chunks(MAX_BIND_PARAMETERS / 3) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO tags (name, color, slug) ");

        query_builder.push_values(chunk, |mut b, tag| {
            b.push_bind(&tag.name)
                .push_bind(&tag.color)
                .push_bind(&tag.slug);
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        inserted += query_builder.build().execute(pool).await?.rows_affected();
    }

    Ok(inserted)
}
