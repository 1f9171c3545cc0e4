use sqlx::{Pool, Postgres};

use crate::{
    error::ApiResult,
    schema::{CartIngredientRow, Id},
    shopping_list::{aggregate, render},
};

/// Every ingredient occurrence across the recipes in the user's cart.
pub async fn list_cart_ingredients(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> ApiResult<Vec<CartIngredientRow>> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name, i.measurement_unit, ri.amount
        FROM shopping_carts c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The downloadable shopping list document for `user_id`.
pub async fn shopping_list(user_id: Id, pool: &Pool<Postgres>) -> ApiResult<String> {
    let rows = list_cart_ingredients(user_id, pool).await?;
    let lines = aggregate(rows);
    log::trace!("> Shopping list of user {user_id} has {} lines", lines.len());

    Ok(render(&lines))
}
