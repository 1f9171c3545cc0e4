use serde::{Deserialize, Serialize};

use crate::constants::{MAX_COUNT_PER_PAGE, RECIPE_COUNT_PER_PAGE};

use super::{
    error::{ApiError, ApiResult},
    form::QueryParams,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: RECIPE_COUNT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Reads `page` and `limit`. A malformed or non-positive page is an invalid page;
    /// a malformed limit falls back to the default and an oversized one is capped.
    pub fn from_query(params: &QueryParams) -> ApiResult<Self> {
        let page = match params.get_str("page") {
            Some(page) => match page.trim().parse::<i64>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(ApiError::InvalidPage),
            },
            None => 1,
        };

        let limit = params
            .get_str("limit")
            .and_then(|limit| limit.trim().parse::<i64>().ok())
            .filter(|limit| *limit >= 1)
            .map(|limit| limit.min(MAX_COUNT_PER_PAGE))
            .unwrap_or(RECIPE_COUNT_PER_PAGE);

        // Offsets and page links must stay representable.
        page.checked_mul(limit)
            .and_then(|end| end.checked_add(limit))
            .ok_or(ApiError::InvalidPage)?;

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    pub fn from_rows(
        rows: Vec<T>,
        total_rows: i64,
        request: PageRequest,
        path: &str,
        params: &QueryParams,
    ) -> ApiResult<Self> {
        if rows.is_empty() {
            if request.page > 1 {
                return Err(ApiError::InvalidPage);
            }
            return Ok(Self::no_rows());
        }

        let shown = request.offset() + rows.len() as i64;
        let next = (shown < total_rows)
            .then(|| link(path, params.with_value("page", &(request.page + 1).to_string())));

        let previous = match request.page {
            1 => None,
            2 => Some(link(path, params.without("page"))),
            page => Some(link(path, params.with_value("page", &(page - 1).to_string()))),
        };

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }
}

fn link(path: &str, query: String) -> String {
    if query.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{query}")
    }
}
