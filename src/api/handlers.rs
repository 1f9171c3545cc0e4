use warp::{http::StatusCode, reply, Rejection, Reply};

use crate::{
    actions::{
        ingredients, recipes,
        recipes::RecipeFilter,
        relations::{add_recipe_relation, remove_recipe_relation, RecipeRelation},
        shopping, subscriptions, tags,
    },
    cache::cache::{cached, CacheKey},
    constants::SHOPPING_LIST_FILENAME,
    error::ApiError,
    form::QueryParams,
    jwt::SessionData,
    pagination::{PageContext, PageRequest},
    schema::Id,
    write_model::RecipeWrite,
};

use super::state::AppState;

fn viewer(session: &Option<SessionData>) -> Option<Id> {
    session.as_ref().map(|session| session.user_id)
}

// Tags

pub async fn list_tags(state: AppState) -> Result<impl Reply, Rejection> {
    let list = cached(state.cache.as_ref(), CacheKey::Tags, || {
        tags::list_tags(&state.pool)
    })
    .await?;

    Ok(reply::json(&list))
}

pub async fn get_tag(id: Id, state: AppState) -> Result<impl Reply, Rejection> {
    let tag = cached(state.cache.as_ref(), CacheKey::Tag(id), || {
        tags::get_tag(id, &state.pool)
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&tag))
}

// Ingredients

pub async fn list_ingredients(query: String, state: AppState) -> Result<impl Reply, Rejection> {
    let params = QueryParams::parse(&query);
    let prefix = params
        .get_str("name")
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    let list = cached(
        state.cache.as_ref(),
        CacheKey::Ingredients(prefix.clone()),
        || ingredients::list_ingredients(prefix.as_deref(), &state.pool),
    )
    .await?;

    Ok(reply::json(&list))
}

pub async fn get_ingredient(id: Id, state: AppState) -> Result<impl Reply, Rejection> {
    let ingredient = cached(state.cache.as_ref(), CacheKey::Ingredient(id), || {
        ingredients::get_ingredient(id, &state.pool)
    })
    .await?
    .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&ingredient))
}

// Recipes

pub async fn list_recipes(
    session: Option<SessionData>,
    query: String,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let params = QueryParams::parse(&query);
    let page = PageRequest::from_query(&params)?;
    let filter = RecipeFilter::from_query(&params)?;

    let (rows, total) = recipes::fetch_recipes(&filter, viewer(&session), page, &state.pool).await?;
    let reads = recipes::load_recipe_reads(rows, viewer(&session), &state.pool).await?;

    let page = PageContext::from_rows(reads, total, page, "/api/recipes/", &params)?;

    Ok(reply::json(&page))
}

pub async fn get_recipe(
    id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let read = recipes::read_recipe(id, viewer(&session), &state.pool).await?;

    Ok(reply::json(&read))
}

pub async fn create_recipe(
    session: SessionData,
    write: RecipeWrite,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let recipe = write.validate_create()?;

    let id = recipes::create_recipe(&session, recipe, state.media(), &state.pool).await?;
    let read = recipes::read_recipe(id, Some(session.user_id), &state.pool).await?;

    Ok(reply::with_status(reply::json(&read), StatusCode::CREATED))
}

pub async fn update_recipe(
    id: Id,
    session: SessionData,
    write: RecipeWrite,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    recipes::update_recipe(id, &session, write, state.media(), &state.pool).await?;
    let read = recipes::read_recipe(id, Some(session.user_id), &state.pool).await?;

    Ok(reply::json(&read))
}

pub async fn delete_recipe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    recipes::delete_recipe(id, &session, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

// Favorites and shopping cart

pub async fn add_relation(
    id: Id,
    relation: RecipeRelation,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let summary = add_recipe_relation(relation, session.user_id, id, &state.pool).await?;

    Ok(reply::with_status(reply::json(&summary), StatusCode::CREATED))
}

pub async fn remove_relation(
    id: Id,
    relation: RecipeRelation,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    remove_recipe_relation(relation, session.user_id, id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let document = shopping::shopping_list(session.user_id, &state.pool).await?;

    Ok(reply::with_header(
        document,
        "content-disposition",
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    ))
}

// Subscriptions

pub async fn list_subscriptions(
    session: SessionData,
    query: String,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let params = QueryParams::parse(&query);
    let page = PageRequest::from_query(&params)?;
    let limit = subscriptions::recipes_limit(&params)?;

    let (reads, total) =
        subscriptions::list_subscriptions(session.user_id, page, limit, &state.pool).await?;
    let page = PageContext::from_rows(reads, total, page, "/api/users/subscriptions/", &params)?;

    Ok(reply::json(&page))
}

pub async fn subscribe(
    id: Id,
    session: SessionData,
    query: String,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let params = QueryParams::parse(&query);
    let limit = subscriptions::recipes_limit(&params)?;

    let read = subscriptions::subscribe(session.user_id, id, limit, &state.pool).await?;

    Ok(reply::with_status(reply::json(&read), StatusCode::CREATED))
}

pub async fn unsubscribe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    subscriptions::unsubscribe(session.user_id, id, &state.pool).await?;

    Ok(reply::with_status(reply(), StatusCode::NO_CONTENT))
}
