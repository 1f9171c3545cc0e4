use sqlx::{Pool, Postgres};

use crate::{
    error::ApiResult,
    schema::{Id, User},
};

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Postgres>) -> ApiResult<Option<User>> {
    let row: Option<User> = sqlx::query_as(
        "SELECT id, email, username, first_name, last_name FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
