use std::str::FromStr;

use super::error::{ApiError, ApiResult};

/// Decoded query string. Keeps repeated keys, which the recipe tag filter relies on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    inner: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(raw: &str) -> Self {
        Self {
            inner: url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.inner
            .iter()
            .filter(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.to_owned())
            .collect()
    }

    pub fn get_number<T>(&self, key: &str) -> ApiResult<Option<T>>
    where
        T: FromStr,
    {
        match self.get_str(key) {
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_e| ApiError::field(key, "A valid integer is required.")),
            None => Ok(None),
        }
    }

    /// `1` and `true` switch a filter on; anything else leaves it off.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.get_str(key), Some("1") | Some("true"))
    }

    /// Re-encodes the query with `key` set to `value`, dropping earlier occurrences of `key`.
    pub fn with_value(&self, key: &str, value: &str) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        self.inner
            .iter()
            .filter(|(k, _)| k != key)
            .for_each(|(k, v)| {
                serializer.append_pair(k, v);
            });
        serializer.append_pair(key, value);
        serializer.finish()
    }

    /// Re-encodes the query without `key`.
    pub fn without(&self, key: &str) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        self.inner
            .iter()
            .filter(|(k, _)| k != key)
            .for_each(|(k, v)| {
                serializer.append_pair(k, v);
            });
        serializer.finish()
    }
}
