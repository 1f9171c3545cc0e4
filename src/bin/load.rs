use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use foodgram::{
    actions::{ingredients::insert_ingredients, tags::insert_tags},
    config::Config,
    schema::{NewIngredient, NewTag},
    CacheLifetime,
};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;

/// Loads reference data into the recipe database.
#[derive(Parser, Debug)]
#[command(name = "foodgram-load", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load ingredients from a JSON array of {name, measurement_unit}
    Ingredients { file: PathBuf },
    /// Load tags from a JSON array of {name, color, slug}
    Tags { file: PathBuf },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Could not parse {}", path.display()))
}

async fn rotate(lifetime: CacheLifetime, redis_url: Option<&str>) -> anyhow::Result<()> {
    let Some(url) = redis_url else {
        return Ok(());
    };

    let mut connection = redis::Client::open(url)?
        .get_multiplexed_async_connection()
        .await?;
    lifetime.rotate(&mut connection).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
        .context("Could not connect to the database")?;

    match cli.command {
        Command::Ingredients { file } => {
            let ingredients: Vec<NewIngredient> = read_json(&file)?;
            let inserted = insert_ingredients(&ingredients, &pool).await?;
            log::info!("Loaded {inserted} new ingredients out of {}", ingredients.len());
            rotate(CacheLifetime::BindIngredientCache, config.redis_url.as_deref()).await?;
        }
        Command::Tags { file } => {
            let tags: Vec<NewTag> = read_json(&file)?;
            let inserted = insert_tags(&tags, &pool).await?;
            log::info!("Loaded {inserted} new tags out of {}", tags.len());
            rotate(CacheLifetime::BindTagCache, config.redis_url.as_deref()).await?;
        }
    }

    Ok(())
}
