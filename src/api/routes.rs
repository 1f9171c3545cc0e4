use std::convert::Infallible;

use warp::{Filter, Rejection, Reply};

use crate::{
    actions::relations::RecipeRelation,
    constants::BODY_SIZE_LIMIT,
    middleware::{with_possible_session, with_session},
    schema::Id,
    write_model::RecipeWrite,
};

use super::{
    handlers,
    rejection::handle_rejection,
    state::{with_state, AppState},
};

/// The raw query string; absent and empty queries both yield `""`.
fn query_string() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

fn json_body() -> impl Filter<Extract = (RecipeWrite,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_SIZE_LIMIT).and(warp::body::json())
}

fn tag_routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_tags);

    let detail = warp::path!("api" / "tags" / Id)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_tag);

    list.or(detail)
}

fn ingredient_routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(query_string())
        .and(with_state(state.clone()))
        .and_then(handlers::list_ingredients);

    let detail = warp::path!("api" / "ingredients" / Id)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::get_ingredient);

    list.or(detail)
}

fn recipe_routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = state.jwt_secret.clone();

    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(query_string())
        .and(with_state(state.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::download_shopping_cart);

    let detail = warp::path!("api" / "recipes" / Id)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("api" / "recipes" / Id)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_state(state.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("api" / "recipes" / Id)
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_state(state.clone()))
        .and_then(handlers::delete_recipe);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
        .or(relation_routes(RecipeRelation::Favorite, "favorite", state.clone()))
        .or(relation_routes(
            RecipeRelation::ShoppingCart,
            "shopping_cart",
            state,
        ))
}

/// `POST` and `DELETE` on `/api/recipes/{id}/<segment>/`.
fn relation_routes(
    relation: RecipeRelation,
    segment: &'static str,
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let path = warp::path("api")
        .and(warp::path("recipes"))
        .and(warp::path::param::<Id>())
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::any().map(move || relation));

    let add = path
        .clone()
        .and(warp::post())
        .and(with_session(state.jwt_secret.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::add_relation);

    let remove = path
        .and(warp::delete())
        .and(with_session(state.jwt_secret.clone()))
        .and(with_state(state))
        .and_then(handlers::remove_relation);

    add.or(remove)
}

fn subscription_routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = state.jwt_secret.clone();

    let list = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(query_string())
        .and(with_state(state.clone()))
        .and_then(handlers::list_subscriptions);

    let subscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(query_string())
        .and(with_state(state.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_state(state))
        .and_then(handlers::unsubscribe);

    list.or(subscribe).or(unsubscribe)
}

/// The whole HTTP surface, with rejections rendered as JSON.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let media = warp::path("media").and(warp::fs::dir(state.config.media_root.clone()));

    tag_routes(state.clone())
        .or(ingredient_routes(state.clone()))
        .or(recipe_routes(state.clone()))
        .or(subscription_routes(state))
        .or(media)
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}
