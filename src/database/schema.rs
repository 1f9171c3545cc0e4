use serde::{Deserialize, Serialize};

pub type Id = i32;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Id,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: Id,
    pub author_id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// A recipe joined with its author's public fields.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct RecipeRow {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,

    pub author_id: Id,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
}

/// `RecipeRow` with the windowed total used for pagination.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct RecipeRowCounted {
    #[sqlx(flatten)]
    pub recipe: RecipeRow,
    pub count: i64,
}

impl From<RecipeRowCounted> for RecipeRow {
    fn from(value: RecipeRowCounted) -> Self {
        value.recipe
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct RecipeTagRow {
    pub recipe_id: Id,
    #[sqlx(flatten)]
    pub tag: Tag,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientRow {
    pub recipe_id: Id,
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Compact recipe view returned by the favorite/cart toggles and subscription views.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Id,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

/// `RecipeSummary` tagged with its author, for bulk subscription views.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecipeSummary {
    pub author_id: Id,
    #[sqlx(flatten)]
    pub recipe: RecipeSummary,
}

/// One ingredient occurrence pulled from a user's cart.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct UserCounted {
    #[sqlx(flatten)]
    pub user: User,
    pub count: i64,
}

/// Tag as shipped in reference-data files.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Ingredient as shipped in reference-data files.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}
