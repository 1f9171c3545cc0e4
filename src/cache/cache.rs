use std::{
    fmt::{self, Display},
    future::Future,
};

use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    constants::{CACHE_TTL_SECONDS, INGREDIENT_CACHE_BIND_KEY, TAG_CACHE_BIND_KEY},
    error::{ApiError, ApiResult},
    schema::Id,
};

// Caching - keys

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheKey {
    Tags,
    Tag(Id),
    Ingredients(Option<String>),
    Ingredient(Id),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Tags => write!(f, "tags"),
            CacheKey::Tag(id) => write!(f, "tag-{id}"),
            CacheKey::Ingredients(None) => write!(f, "ingredients"),
            CacheKey::Ingredients(Some(prefix)) => write!(f, "ingredients:{prefix}"),
            CacheKey::Ingredient(id) => write!(f, "ingredient-{id}"),
        }
    }
}

impl CacheKey {
    pub fn lifetime(&self) -> CacheLifetime {
        match self {
            CacheKey::Tags | CacheKey::Tag(_) => CacheLifetime::BindTagCache,
            CacheKey::Ingredients(_) | CacheKey::Ingredient(_) => {
                CacheLifetime::BindIngredientCache
            }
        }
    }
}

// Cache - wrappers

/// Every entry is bound to the token stored under its family's bind key.
/// Rotating that token invalidates the whole family at once.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum CacheLifetime {
    BindTagCache,
    BindIngredientCache,
}

impl CacheLifetime {
    fn bind_key(&self) -> &'static str {
        match self {
            CacheLifetime::BindTagCache => TAG_CACHE_BIND_KEY,
            CacheLifetime::BindIngredientCache => INGREDIENT_CACHE_BIND_KEY,
        }
    }

    pub async fn get_cache_bind(
        &self,
        cache: &mut MultiplexedConnection,
    ) -> ApiResult<Option<String>> {
        get_cache_value(self.bind_key(), cache).await
    }

    pub async fn rotate(&self, cache: &mut MultiplexedConnection) -> ApiResult<String> {
        let bind = uuid::Uuid::new_v4().to_string();
        let _: () = cache.set(self.bind_key(), &bind).await?;
        log::info!("Rotated {} to {bind}", self.bind_key());

        Ok(bind)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RedisValue<T> {
    pub value: T,
    _lifetime: CacheLifetime,
    _bind: Option<String>,
}

impl<T> RedisValue<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    async fn new(
        value: T,
        lifetime: CacheLifetime,
        cache: &mut MultiplexedConnection,
    ) -> ApiResult<Self> {
        let bind = lifetime.get_cache_bind(cache).await?;

        Ok(Self {
            value,
            _lifetime: lifetime,
            _bind: bind,
        })
    }

    async fn validate(&self, cache: &mut MultiplexedConnection) -> ApiResult<bool> {
        Ok(self._bind == self._lifetime.get_cache_bind(cache).await?)
    }

    pub async fn get_or<F, Fut>(
        key: &CacheKey,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> ApiResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let read = get_cache_value::<RedisValue<T>>(&key.to_string(), cache).await;

        let value = match CacheRead::from(read) {
            CacheRead::Hit(value) => {
                log::trace!("> Found {key}");
                match value.validate(cache).await {
                    Ok(true) => Some(value),
                    Ok(false) => {
                        log::trace!("> Invalidated {key}");
                        None
                    }
                    Err(e) => {
                        log::error!("> Cache unavailable, serving {key} uncached: {e}");
                        return callback().await;
                    }
                }
            }
            CacheRead::Miss => None,
            CacheRead::Corrupt => {
                let mut c = cache.clone();
                let k = key.to_string();
                tokio::spawn(async move {
                    log::error!("> Failed to deserialize cached value. Deleting {}", &k);
                    if let Err(e) = delete_cache_value(&k, &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            }
            CacheRead::Unavailable(e) => {
                log::error!("> Cache unavailable, serving {key} uncached: {e}");
                return callback().await;
            }
        };

        match value {
            Some(value) => Ok(value.value),
            None => {
                log::trace!("> Fetching {key}");
                let value = callback().await?;

                match RedisValue::new(value.clone(), key.lifetime(), cache).await {
                    Ok(entry) => {
                        if let Err(e) = set_cache_value(&key.to_string(), &entry, cache).await {
                            log::error!("{e:?}");
                        }
                    }
                    Err(e) => log::error!("> Could not read cache bind for {key}: {e}"),
                }

                Ok(value)
            }
        }
    }
}

/// Outcome of reading one cached entry.
#[derive(Debug)]
enum CacheRead<V> {
    Hit(V),
    Miss,
    /// Stored but undecodable; the key should be dropped.
    Corrupt,
    /// Redis itself failed; the entry is left alone.
    Unavailable(ApiError),
}

impl<V> From<ApiResult<Option<V>>> for CacheRead<V> {
    fn from(read: ApiResult<Option<V>>) -> Self {
        match read {
            Ok(Some(value)) => CacheRead::Hit(value),
            Ok(None) => CacheRead::Miss,
            Err(ApiError::Serialization(_)) => CacheRead::Corrupt,
            Err(e) => CacheRead::Unavailable(e),
        }
    }
}

/// Serves `key` from the cache when one is configured, else straight from `callback`.
pub async fn cached<T, F, Fut>(
    cache: Option<&MultiplexedConnection>,
    key: CacheKey,
    callback: F,
) -> ApiResult<T>
where
    T: Serialize + DeserializeOwned + Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    match cache {
        Some(cache) => RedisValue::get_or(&key, &mut cache.clone(), callback).await,
        None => callback().await,
    }
}

// Cache - raw handlers

pub async fn set_cache_value<V: Serialize>(
    key: &str,
    value: &V,
    cache: &mut MultiplexedConnection,
) -> ApiResult<()> {
    let json = serde_json::to_string(value)?;
    let _: () = redis::cmd("SET")
        .arg(key)
        .arg(json)
        .arg("EX")
        .arg(CACHE_TTL_SECONDS)
        .query_async(cache)
        .await?;

    Ok(())
}

pub async fn delete_cache_value(key: &str, cache: &mut MultiplexedConnection) -> ApiResult<()> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<V: DeserializeOwned>(
    key: &str,
    cache: &mut MultiplexedConnection,
) -> ApiResult<Option<V>> {
    let value: Option<String> = cache.get(key).await?;

    match value {
        Some(value) => Ok(Some(serde_json::from_str(&value)?)),
        None => Ok(None),
    }
}
