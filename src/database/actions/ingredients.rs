use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::ApiResult,
    schema::{Id, Ingredient, NewIngredient},
};

use super::MAX_BIND_PARAMETERS;

/// Ingredients whose name starts with `prefix` (case-sensitive), or all of them.
pub async fn list_ingredients(
    prefix: Option<&str>,
    pool: &Pool<Postgres>,
) -> ApiResult<Vec<Ingredient>> {
    let list: Vec<Ingredient> = sqlx::query_as(
        "
        SELECT id, name, measurement_unit FROM ingredients
        WHERE $1::text IS NULL OR starts_with(name, $1)
        ORDER BY name, id
    ",
    )
    .bind(prefix)
    .fetch_all(pool)
    .await?;

    Ok(list)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<Ingredient>> {
    let ingredient: Option<Ingredient> =
        sqlx::query_as("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(ingredient)
}

/// Get-or-create over (name, measurement_unit); returns how many rows were new.
pub async fn insert_ingredients(
    ingredients: &[NewIngredient],
    pool: &Pool<Postgres>,
) -> ApiResult<u64> {
    let mut inserted = 0;

    for chunk in ingredients.chunks(MAX_BIND_PARAMETERS / 2) {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

        query_builder.push_values(chunk, |mut b, ingredient| {
            b.push_bind(&ingredient.name)
                .push_bind(&ingredient.measurement_unit);
        });
        query_builder.push(" ON CONFLICT DO NOTHING");

        inserted += query_builder.build().execute(pool).await?.rows_affected();
    }

    Ok(inserted)
}
