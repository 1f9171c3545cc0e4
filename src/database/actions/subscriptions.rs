use std::collections::HashMap;

use sqlx::{Pool, Postgres};

use crate::{
    error::{ApiError, ApiResult},
    form::QueryParams,
    pagination::PageRequest,
    read_model::SubscriptionRead,
    schema::{AuthorRecipeSummary, Id, RecipeSummary, User, UserCounted},
};

use super::users::get_user_by_id;

/// Reads `recipes_limit`, which has to be a non-negative integer when given.
pub fn recipes_limit(params: &QueryParams) -> ApiResult<Option<usize>> {
    match params.get_number::<i64>("recipes_limit")? {
        Some(limit) => usize::try_from(limit).map(Some).map_err(|_e| {
            ApiError::field(
                "recipes_limit",
                "Ensure this value is greater than or equal to 0.",
            )
        }),
        None => Ok(None),
    }
}

/// Subscription views for `authors`, keeping their order. Recipes come from one
/// query covering every author.
async fn subscription_reads(
    authors: Vec<User>,
    recipes_limit: Option<usize>,
    pool: &Pool<Postgres>,
) -> ApiResult<Vec<SubscriptionRead>> {
    let author_ids: Vec<Id> = authors.iter().map(|author| author.id).collect();

    let rows: Vec<AuthorRecipeSummary> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time FROM recipes
        WHERE author_id = ANY($1)
        ORDER BY id
    ",
    )
    .bind(&author_ids)
    .fetch_all(pool)
    .await?;

    let mut recipes: HashMap<Id, Vec<RecipeSummary>> = HashMap::new();
    rows.into_iter().for_each(|row| {
        recipes.entry(row.author_id).or_default().push(row.recipe);
    });

    Ok(authors
        .into_iter()
        .map(|author| {
            let list = recipes.remove(&author.id).unwrap_or_default();
            let count = list.len() as i64;
            SubscriptionRead::new(author, list, count, recipes_limit)
        })
        .collect())
}

pub async fn subscribe(
    subscriber_id: Id,
    author_id: Id,
    recipes_limit: Option<usize>,
    pool: &Pool<Postgres>,
) -> ApiResult<SubscriptionRead> {
    let author = get_user_by_id(author_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    if subscriber_id == author_id {
        return Err(ApiError::conflict("You can't subscribe to yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO subscriptions (subscriber_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(subscriber_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("You can't subscribe to the author twice"));
    }

    log::info!("User {subscriber_id} subscribed to {author_id}");

    subscription_reads(vec![author], recipes_limit, pool)
        .await?
        .pop()
        .ok_or(ApiError::NotFound)
}

pub async fn unsubscribe(subscriber_id: Id, author_id: Id, pool: &Pool<Postgres>) -> ApiResult<()> {
    get_user_by_id(author_id, pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND author_id = $2")
        .bind(subscriber_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("You weren't subscribed to this user"));
    }

    log::info!("User {subscriber_id} unsubscribed from {author_id}");

    Ok(())
}

/// One page of the authors `subscriber_id` follows, plus the total.
pub async fn list_subscriptions(
    subscriber_id: Id,
    page: PageRequest,
    recipes_limit: Option<usize>,
    pool: &Pool<Postgres>,
) -> ApiResult<(Vec<SubscriptionRead>, i64)> {
    let rows: Vec<UserCounted> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.subscriber_id = $1
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(subscriber_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let authors = rows.into_iter().map(|row| row.user).collect();

    Ok((subscription_reads(authors, recipes_limit, pool).await?, total_count))
}
