use crate::{database::error::ApiError, database::schema::Id, jwt::SessionData};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ActionType {
    ManageOwnRecipes,
}

impl ActionType {
    /// Checks `session` against the owner of the object being acted on.
    pub fn authenticate(self, session: &SessionData, owner_id: Id) -> Result<(), ApiError> {
        match self {
            ActionType::ManageOwnRecipes if session.user_id == owner_id => Ok(()),
            ActionType::ManageOwnRecipes => {
                log::info!(
                    "User {} tried to modify a recipe owned by {owner_id}",
                    session.user_id
                );
                Err(ApiError::Forbidden)
            }
        }
    }
}
