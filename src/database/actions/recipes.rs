use std::{collections::HashSet, path::Path};

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    authentication::{jwt::SessionData, permissions::ActionType},
    error::{is_unique_violation, ApiError, ApiResult, FieldErrors},
    form::QueryParams,
    media::{discard_image, store_image, StoredImage},
    pagination::PageRequest,
    read_model::{compose_recipes, RecipeRead, ViewerRelations},
    schema::{
        Id, Recipe, RecipeIngredientRow, RecipeRow, RecipeRowCounted, RecipeSummary,
        RecipeTagRow,
    },
    write_model::{NewRecipe, RecipeChanges, RecipeIngredientInput, RecipeWrite},
};

const RECIPE_COLUMNS: &str = "
    r.id, r.name, r.image, r.text, r.cooking_time,
    u.id AS author_id, u.email AS author_email, u.username AS author_username,
    u.first_name AS author_first_name, u.last_name AS author_last_name
";

const RECIPE_NAME_CONSTRAINT: &str = "unique_recipe_name";

/// Filters accepted by the recipe list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<Id>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    pub fn from_query(params: &QueryParams) -> ApiResult<Self> {
        Ok(Self {
            author: params.get_number("author")?,
            tags: params.get_all("tags"),
            is_favorited: params.get_flag("is_favorited"),
            is_in_shopping_cart: params.get_flag("is_in_shopping_cart"),
        })
    }

    fn needs_viewer(&self) -> bool {
        self.is_favorited || self.is_in_shopping_cart
    }
}

/// Creating and updating need somewhere to put the images.
#[derive(Debug, Clone, Copy)]
pub struct MediaTarget<'a> {
    pub root: &'a Path,
    pub url: &'a str,
}

// Reading

/// One page of recipe rows plus the total number of matches.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    page: PageRequest,
    pool: &Pool<Postgres>,
) -> ApiResult<(Vec<RecipeRow>, i64)> {
    // Anonymous callers have no favorites or cart to match against.
    if filter.needs_viewer() && viewer.is_none() {
        return Ok((vec![], 0));
    }

    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {RECIPE_COLUMNS}, COUNT(*) OVER() AS count FROM recipes r INNER JOIN users u ON u.id = r.author_id WHERE TRUE"
    ));

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(")
            .push_bind(filter.tags.clone())
            .push("))");
    }

    if let Some(user_id) = viewer {
        if filter.is_favorited {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM shopping_carts c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }

    query_builder
        .push(" ORDER BY r.name, r.id LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows: Vec<RecipeRowCounted> = query_builder.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let rows = rows.into_iter().map(RecipeRow::from).collect();

    Ok((rows, total_count))
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<Recipe>> {
    let recipe: Option<Recipe> = sqlx::query_as(
        "SELECT id, author_id, name, image, text, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(recipe)
}

pub async fn get_recipe_row(id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<RecipeRow>> {
    let row: Option<RecipeRow> = sqlx::query_as(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes r INNER JOIN users u ON u.id = r.author_id WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn get_recipe_summary(id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<RecipeSummary>> {
    let summary: Option<RecipeSummary> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(summary)
}

/// Relations of `viewer` restricted to the given recipes and authors.
pub async fn load_viewer_relations(
    viewer: Option<Id>,
    recipe_ids: &[Id],
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> ApiResult<ViewerRelations> {
    let Some(user_id) = viewer else {
        return Ok(ViewerRelations::anonymous());
    };

    let favorites: Vec<(Id,)> =
        sqlx::query_as("SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = ANY($2)")
            .bind(user_id)
            .bind(recipe_ids)
            .fetch_all(pool)
            .await?;

    let shopping_cart: Vec<(Id,)> = sqlx::query_as(
        "SELECT recipe_id FROM shopping_carts WHERE user_id = $1 AND recipe_id = ANY($2)",
    )
    .bind(user_id)
    .bind(recipe_ids)
    .fetch_all(pool)
    .await?;

    let subscriptions: Vec<(Id,)> = sqlx::query_as(
        "SELECT author_id FROM subscriptions WHERE subscriber_id = $1 AND author_id = ANY($2)",
    )
    .bind(user_id)
    .bind(author_ids)
    .fetch_all(pool)
    .await?;

    Ok(ViewerRelations {
        favorites: favorites.into_iter().map(|row| row.0).collect(),
        shopping_cart: shopping_cart.into_iter().map(|row| row.0).collect(),
        subscriptions: subscriptions.into_iter().map(|row| row.0).collect(),
    })
}

/// Turns recipe rows into read models with a fixed number of queries,
/// however many rows there are.
pub async fn load_recipe_reads(
    rows: Vec<RecipeRow>,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> ApiResult<Vec<RecipeRead>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let recipe_ids: Vec<Id> = rows.iter().map(|row| row.id).collect();
    let author_ids: Vec<Id> = rows
        .iter()
        .map(|row| row.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let tags: Vec<RecipeTagRow> = sqlx::query_as(
        "
        SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY t.name
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let ingredients: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ",
    )
    .bind(&recipe_ids)
    .fetch_all(pool)
    .await?;

    let viewer = load_viewer_relations(viewer, &recipe_ids, &author_ids, pool).await?;

    Ok(compose_recipes(rows, tags, ingredients, &viewer))
}

pub async fn read_recipe(id: Id, viewer: Option<Id>, pool: &Pool<Postgres>) -> ApiResult<RecipeRead> {
    let row = get_recipe_row(id, pool).await?.ok_or(ApiError::NotFound)?;

    load_recipe_reads(vec![row], viewer, pool)
        .await?
        .pop()
        .ok_or(ApiError::NotFound)
}

// Writing

fn name_conflict(e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e, RECIPE_NAME_CONSTRAINT) {
        ApiError::field("name", "recipe with this name already exists.")
    } else {
        ApiError::from(e)
    }
}

/// Ids out of `ids` that have no row in `table`, in first-seen order.
async fn missing_ids(table: &str, ids: &[Id], pool: &Pool<Postgres>) -> ApiResult<Vec<Id>> {
    let found: Vec<(Id,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await?;
    let found: HashSet<Id> = found.into_iter().map(|row| row.0).collect();

    let mut seen = HashSet::new();
    Ok(ids
        .iter()
        .copied()
        .filter(|id| !found.contains(id) && seen.insert(*id))
        .collect())
}

async fn check_references(
    tags: Option<&[Id]>,
    ingredients: Option<&[RecipeIngredientInput]>,
    pool: &Pool<Postgres>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    if let Some(tags) = tags {
        missing_ids("tags", tags, pool)
            .await?
            .into_iter()
            .for_each(|id| errors.add("tags", format!("Invalid pk \"{id}\" - object does not exist.")));
    }

    if let Some(ingredients) = ingredients {
        let ids: Vec<Id> = ingredients.iter().map(|i| i.ingredient_id).collect();
        missing_ids("ingredients", &ids, pool)
            .await?
            .into_iter()
            .for_each(|id| {
                errors.add(
                    "ingredients",
                    format!("Invalid pk \"{id}\" - object does not exist."),
                )
            });
    }

    errors.into_result()
}

async fn insert_recipe_tags(recipe_id: Id, tags: &[Id], conn: &mut PgConnection) -> ApiResult<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query_builder.push_values(tags, |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(*tag_id);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

async fn insert_recipe_ingredients(
    recipe_id: Id,
    ingredients: &[RecipeIngredientInput],
    conn: &mut PgConnection,
) -> ApiResult<()> {
    if ingredients.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(ingredients, |mut b, ingredient| {
        b.push_bind(recipe_id)
            .push_bind(ingredient.ingredient_id)
            .push_bind(ingredient.amount);
    });

    query_builder.build().execute(&mut *conn).await?;

    Ok(())
}

async fn insert_recipe(
    author_id: Id,
    recipe: &NewRecipe,
    image: &str,
    pool: &Pool<Postgres>,
) -> ApiResult<Id> {
    let mut tr = pool.begin().await?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&recipe.name)
    .bind(image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(name_conflict)?;

    insert_recipe_tags(id.0, &recipe.tags, &mut tr).await?;
    insert_recipe_ingredients(id.0, &recipe.ingredients, &mut tr).await?;

    tr.commit().await?;

    Ok(id.0)
}

/// Stores the image, then writes the recipe and its associations in one
/// transaction. The image is removed again if that transaction fails.
pub async fn create_recipe(
    session: &SessionData,
    recipe: NewRecipe,
    media: MediaTarget<'_>,
    pool: &Pool<Postgres>,
) -> ApiResult<Id> {
    check_references(Some(&recipe.tags), Some(&recipe.ingredients), pool).await?;

    let image = store_image(media.root, media.url, &recipe.image).await?;

    match insert_recipe(session.user_id, &recipe, &image.url, pool).await {
        Ok(id) => {
            log::info!("User {} created recipe {id}", session.user_id);
            Ok(id)
        }
        Err(e) => {
            discard_image(&image).await;
            Err(e)
        }
    }
}

async fn apply_changes(
    id: Id,
    changes: &RecipeChanges,
    image: Option<&str>,
    pool: &Pool<Postgres>,
) -> ApiResult<()> {
    let mut tr = pool.begin().await?;

    sqlx::query(
        "
        UPDATE recipes SET
            name = COALESCE($2, name),
            text = COALESCE($3, text),
            cooking_time = COALESCE($4, cooking_time),
            image = COALESCE($5, image)
        WHERE id = $1
    ",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.text)
    .bind(changes.cooking_time)
    .bind(image)
    .execute(&mut *tr)
    .await
    .map_err(name_conflict)?;

    if let Some(tags) = &changes.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1 AND NOT (tag_id = ANY($2))")
            .bind(id)
            .bind(tags)
            .execute(&mut *tr)
            .await?;

        insert_recipe_tags(id, tags, &mut tr).await?;
    }

    if let Some(ingredients) = &changes.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tr)
            .await?;

        insert_recipe_ingredients(id, ingredients, &mut tr).await?;
    }

    tr.commit().await?;

    Ok(())
}

/// Applies the fields present in `write` to a recipe owned by the caller.
pub async fn update_recipe(
    id: Id,
    session: &SessionData,
    write: RecipeWrite,
    media: MediaTarget<'_>,
    pool: &Pool<Postgres>,
) -> ApiResult<()> {
    let recipe = get_recipe(id, pool).await?.ok_or(ApiError::NotFound)?;
    ActionType::ManageOwnRecipes.authenticate(session, recipe.author_id)?;

    let changes = write.validate_update()?;
    check_references(changes.tags.as_deref(), changes.ingredients.as_deref(), pool).await?;

    let image: Option<StoredImage> = match &changes.image {
        Some(image) => Some(store_image(media.root, media.url, image).await?),
        None => None,
    };

    match apply_changes(id, &changes, image.as_ref().map(|i| i.url.as_str()), pool).await {
        Ok(()) => {
            log::info!("User {} updated recipe {id}", session.user_id);
            Ok(())
        }
        Err(e) => {
            if let Some(image) = &image {
                discard_image(image).await;
            }
            Err(e)
        }
    }
}

/// Deletes a recipe owned by the caller together with every row referencing it.
pub async fn delete_recipe(id: Id, session: &SessionData, pool: &Pool<Postgres>) -> ApiResult<()> {
    let recipe = get_recipe(id, pool).await?.ok_or(ApiError::NotFound)?;
    ActionType::ManageOwnRecipes.authenticate(session, recipe.author_id)?;

    let mut tr = pool.begin().await?;
    for table in ["recipe_ingredients", "recipe_tags", "favorites", "shopping_carts"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE recipe_id = $1"))
            .bind(id)
            .execute(&mut *tr)
            .await?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await?;
    tr.commit().await?;

    log::info!("User {} deleted recipe {id}", session.user_id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn filter_from_query() {
        let params = QueryParams::parse("author=3&tags=lunch&tags=dinner&is_favorited=1");
        assert_eq!(
            RecipeFilter::from_query(&params).unwrap(),
            RecipeFilter {
                author: Some(3),
                tags: vec!["lunch".to_owned(), "dinner".to_owned()],
                is_favorited: true,
                is_in_shopping_cart: false,
            }
        );
    }

    #[test]
    fn filter_rejects_bad_author() {
        let params = QueryParams::parse("author=me");
        assert!(matches!(
            RecipeFilter::from_query(&params),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn relation_filters_need_a_viewer() {
        assert!(!RecipeFilter::default().needs_viewer());
        assert!(RecipeFilter {
            is_in_shopping_cart: true,
            ..RecipeFilter::default()
        }
        .needs_viewer());
    }
}
