use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, ApiResult},
    schema::{Id, RecipeSummary},
};

use super::recipes::get_recipe_summary;

/// The per-user recipe lists that toggle between absent and present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeRelation {
    Favorite,
    ShoppingCart,
}

impl RecipeRelation {
    fn table(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorites",
            RecipeRelation::ShoppingCart => "shopping_carts",
        }
    }

    fn label(self) -> &'static str {
        match self {
            RecipeRelation::Favorite => "favorite",
            RecipeRelation::ShoppingCart => "shopping cart",
        }
    }

    pub fn already_present(self) -> ApiError {
        ApiError::Conflict(format!("Recipe already is in {}", self.label()))
    }

    pub fn not_present(self) -> ApiError {
        ApiError::Conflict(format!("Recipe not found in {}", self.label()))
    }
}

/// Absent to present. Concurrent duplicates race on the unique pair and all
/// but one see zero affected rows.
pub async fn add_recipe_relation(
    relation: RecipeRelation,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> ApiResult<RecipeSummary> {
    let recipe = get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let result = sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(relation.already_present());
    }

    log::info!("User {user_id} added recipe {recipe_id} to {}", relation.label());

    Ok(recipe)
}

/// Present to absent.
pub async fn remove_recipe_relation(
    relation: RecipeRelation,
    user_id: Id,
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> ApiResult<()> {
    get_recipe_summary(recipe_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
        relation.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(relation.not_present());
    }

    log::info!("User {user_id} removed recipe {recipe_id} from {}", relation.label());

    Ok(())
}
