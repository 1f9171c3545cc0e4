use anyhow::Context;
use foodgram::{config::Config, routes::routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

async fn connect_cache(url: Option<&str>) -> Option<redis::aio::MultiplexedConnection> {
    let url = url?;

    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Invalid REDIS_URL, caching disabled: {e}");
            return None;
        }
    };

    match client.get_multiplexed_async_connection().await {
        Ok(connection) => {
            log::info!("Connected to cache");
            Some(connection)
        }
        Err(e) => {
            log::warn!("Cache unavailable, caching disabled: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Could not connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Could not apply migrations")?;

    let cache = connect_cache(config.redis_url.as_deref()).await;
    let address = config.bind_address;

    let state = AppState::new(pool, cache, config);

    let (address, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(address, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
        })
        .context("Could not bind the server address")?;

    log::info!("Listening on {address}");
    server.await;

    Ok(())
}
