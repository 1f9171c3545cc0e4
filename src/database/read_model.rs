//! Nested recipe and profile views returned to API callers.
//!
//! Composition is pure: the database layer fetches recipe rows, their tag and
//! ingredient rows and the viewer's relations in bulk, and these functions
//! stitch them together element-wise, so a list and a single recipe go
//! through the same code.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::schema::{
    Id, RecipeIngredientRow, RecipeRow, RecipeSummary, RecipeTagRow, Tag, User,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
    pub id: Id,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl Profile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: Id,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeRead {
    pub id: Id,
    pub tags: Vec<Tag>,
    pub author: Profile,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRead {
    #[serde(flatten)]
    pub author: Profile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}

impl SubscriptionRead {
    /// `recipes` must already be in authoring order; `limit` truncates it but
    /// never affects `recipes_count`.
    pub fn new(
        author: User,
        mut recipes: Vec<RecipeSummary>,
        recipes_count: i64,
        limit: Option<usize>,
    ) -> Self {
        if let Some(limit) = limit {
            recipes.truncate(limit);
        }

        Self {
            author: Profile::from_user(author, true),
            recipes,
            recipes_count,
        }
    }
}

/// What the viewer has favorited, carted and subscribed to, restricted to the
/// recipes and authors being rendered. Anonymous viewers have empty sets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewerRelations {
    pub favorites: HashSet<Id>,
    pub shopping_cart: HashSet<Id>,
    pub subscriptions: HashSet<Id>,
}

impl ViewerRelations {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

pub fn compose_recipes(
    recipes: Vec<RecipeRow>,
    tags: Vec<RecipeTagRow>,
    ingredients: Vec<RecipeIngredientRow>,
    viewer: &ViewerRelations,
) -> Vec<RecipeRead> {
    let mut tags_by_recipe: HashMap<Id, Vec<Tag>> = HashMap::new();
    tags.into_iter().for_each(|row| {
        tags_by_recipe.entry(row.recipe_id).or_default().push(row.tag);
    });

    let mut ingredients_by_recipe: HashMap<Id, Vec<IngredientAmount>> = HashMap::new();
    ingredients.into_iter().for_each(|row| {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(IngredientAmount {
                id: row.id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
    });

    recipes
        .into_iter()
        .map(|recipe| {
            let author = User {
                id: recipe.author_id,
                email: recipe.author_email,
                username: recipe.author_username,
                first_name: recipe.author_first_name,
                last_name: recipe.author_last_name,
            };
            let is_subscribed = viewer.subscriptions.contains(&author.id);

            RecipeRead {
                id: recipe.id,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                author: Profile::from_user(author, is_subscribed),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: viewer.favorites.contains(&recipe.id),
                is_in_shopping_cart: viewer.shopping_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn recipe(id: Id, author_id: Id) -> RecipeRow {
        RecipeRow {
            id,
            name: format!("Recipe {id}"),
            image: format!("/media/recipes/images/{id}.png"),
            text: "Mix and bake.".to_owned(),
            cooking_time: 30,
            author_id,
            author_email: format!("author{author_id}@example.com"),
            author_username: format!("author{author_id}"),
            author_first_name: "Ann".to_owned(),
            author_last_name: "Cook".to_owned(),
        }
    }

    fn tag(recipe_id: Id, id: Id, slug: &str) -> RecipeTagRow {
        RecipeTagRow {
            recipe_id,
            tag: Tag {
                id,
                name: slug.to_uppercase(),
                color: format!("#00000{id}"),
                slug: slug.to_owned(),
            },
        }
    }

    fn part(recipe_id: Id, id: Id, name: &str, amount: i32) -> RecipeIngredientRow {
        RecipeIngredientRow {
            recipe_id,
            id,
            name: name.to_owned(),
            measurement_unit: "g".to_owned(),
            amount,
        }
    }

    #[test]
    fn anonymous_viewer_sees_false_flags() {
        let reads = compose_recipes(
            vec![recipe(1, 10)],
            vec![tag(1, 1, "breakfast")],
            vec![part(1, 5, "Flour", 200)],
            &ViewerRelations::anonymous(),
        );

        assert_eq!(reads.len(), 1);
        let read = &reads[0];
        assert!(!read.is_favorited);
        assert!(!read.is_in_shopping_cart);
        assert!(!read.author.is_subscribed);
        assert_eq!(read.author.username, "author10");
    }

    #[test]
    fn viewer_relations_are_applied_per_recipe() {
        let viewer = ViewerRelations {
            favorites: HashSet::from([1]),
            shopping_cart: HashSet::from([2]),
            subscriptions: HashSet::from([20]),
        };
        let reads = compose_recipes(vec![recipe(1, 10), recipe(2, 20)], vec![], vec![], &viewer);

        assert_eq!(
            reads
                .iter()
                .map(|r| (r.id, r.is_favorited, r.is_in_shopping_cart, r.author.is_subscribed))
                .collect::<Vec<_>>(),
            vec![(1, true, false, false), (2, false, true, true)]
        );
    }

    #[test]
    fn rows_are_grouped_by_recipe_in_order() {
        let reads = compose_recipes(
            vec![recipe(2, 10), recipe(1, 10)],
            vec![tag(1, 1, "breakfast"), tag(2, 2, "lunch"), tag(1, 3, "dinner")],
            vec![
                part(1, 5, "Flour", 200),
                part(2, 6, "Sugar", 50),
                part(1, 7, "Milk", 300),
            ],
            &ViewerRelations::anonymous(),
        );

        assert_eq!(reads[0].id, 2);
        assert_eq!(reads[0].tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(reads[1].tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            reads[1]
                .ingredients
                .iter()
                .map(|i| (i.id, i.amount))
                .collect::<Vec<_>>(),
            vec![(5, 200), (7, 300)]
        );
    }

    #[test]
    fn serialized_read_model_reproduces_pairs() {
        let reads = compose_recipes(
            vec![recipe(1, 10)],
            vec![tag(1, 1, "breakfast"), tag(1, 2, "lunch")],
            vec![part(1, 5, "Flour", 200), part(1, 6, "Sugar", 50)],
            &ViewerRelations::anonymous(),
        );

        let json = serde_json::to_string(&reads[0]).unwrap();
        let parsed: RecipeRead = serde_json::from_str(&json).unwrap();

        let mut pairs: Vec<(Id, i32)> = parsed.ingredients.iter().map(|i| (i.id, i.amount)).collect();
        pairs.sort();
        let mut tags: Vec<Id> = parsed.tags.iter().map(|t| t.id).collect();
        tags.sort();

        assert_eq!(pairs, vec![(5, 200), (6, 50)]);
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn subscription_view_truncates_but_counts_all() {
        let author = User {
            id: 3,
            email: "a@example.com".to_owned(),
            username: "a".to_owned(),
            first_name: "A".to_owned(),
            last_name: "B".to_owned(),
        };
        let recipes = (1..=4)
            .map(|id| RecipeSummary {
                id,
                name: format!("R{id}"),
                image: String::new(),
                cooking_time: 10,
            })
            .collect();

        let view = SubscriptionRead::new(author, recipes, 4, Some(2));

        assert!(view.author.is_subscribed);
        assert_eq!(view.recipes.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(view.recipes_count, 4);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["username"], "a");
        assert_eq!(json["is_subscribed"], true);
        assert_eq!(json["recipes_count"], 4);
    }
}
