use std::{convert::Infallible, sync::Arc};

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};
use warp::Filter;

use crate::{actions::recipes::MediaTarget, config::Config};

/// Everything a handler needs, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub cache: Option<MultiplexedConnection>,
    pub config: Arc<Config>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, cache: Option<MultiplexedConnection>, config: Config) -> Self {
        let jwt_secret = Arc::from(config.jwt_secret.as_str());

        Self {
            pool,
            cache,
            config: Arc::new(config),
            jwt_secret,
        }
    }

    pub fn media(&self) -> MediaTarget<'_> {
        MediaTarget {
            root: &self.config.media_root,
            url: &self.config.media_url,
        }
    }
}

pub fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
