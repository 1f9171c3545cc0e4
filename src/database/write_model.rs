use serde::Deserialize;

use crate::{
    constants::{
        AMOUNT_MAX, AMOUNT_MIN, COOKING_TIME_MAX, COOKING_TIME_MIN, RECIPE_NAME_MAX_LENGTH,
    },
    media::DecodedImage,
};

use super::{
    error::{ApiError, ApiResult, FieldErrors},
    schema::Id,
};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const EMPTY_LIST: &str = "This list may not be empty.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientInput {
    pub id: Id,
    pub amount: i64,
}

/// Recipe payload as sent by clients, before validation.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeWrite {
    pub ingredients: Option<Vec<IngredientInput>>,
    pub tags: Option<Vec<Id>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientInput {
    pub ingredient_id: Id,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: DecodedImage,
    pub ingredients: Vec<RecipeIngredientInput>,
    pub tags: Vec<Id>,
}

/// Validated partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
    pub tags: Option<Vec<Id>>,
}

impl RecipeWrite {
    pub fn validate_create(self) -> ApiResult<NewRecipe> {
        let mut errors = FieldErrors::new();
        for (field, missing) in [
            ("ingredients", self.ingredients.is_none()),
            ("tags", self.tags.is_none()),
            ("image", self.image.is_none()),
            ("name", self.name.is_none()),
            ("text", self.text.is_none()),
            ("cooking_time", self.cooking_time.is_none()),
        ] {
            if missing {
                errors.add(field, REQUIRED);
            }
        }

        let required = errors.clone();
        let changes = self.validate_fields(errors)?;

        let RecipeChanges {
            name: Some(name),
            text: Some(text),
            cooking_time: Some(cooking_time),
            image: Some(image),
            ingredients: Some(ingredients),
            tags: Some(tags),
        } = changes
        else {
            return Err(ApiError::Validation(required));
        };

        Ok(NewRecipe {
            name,
            text,
            cooking_time,
            image,
            ingredients,
            tags,
        })
    }

    pub fn validate_update(self) -> ApiResult<RecipeChanges> {
        self.validate_fields(FieldErrors::new())
    }

    fn validate_fields(self, mut errors: FieldErrors) -> ApiResult<RecipeChanges> {
        let name = self.name.and_then(|name| {
            let name = name.trim().to_owned();
            if name.is_empty() {
                errors.add("name", BLANK);
                None
            } else if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
                errors.add(
                    "name",
                    format!("Ensure this field has no more than {RECIPE_NAME_MAX_LENGTH} characters."),
                );
                None
            } else {
                Some(name)
            }
        });

        let text = self.text.and_then(|text| {
            if text.trim().is_empty() {
                errors.add("text", BLANK);
                None
            } else {
                Some(text)
            }
        });

        let cooking_time = self.cooking_time.and_then(|value| {
            check_range(&mut errors, "cooking_time", value, COOKING_TIME_MIN, COOKING_TIME_MAX)
        });

        let image = self.image.and_then(|image| {
            let decoded = DecodedImage::from_data_uri(&image);
            if decoded.is_none() {
                errors.add("image", INVALID_IMAGE);
            }
            decoded
        });

        let ingredients = self.ingredients.and_then(|ingredients| {
            if ingredients.is_empty() {
                errors.add("ingredients", EMPTY_LIST);
                return None;
            }

            let before = errors.clone();
            let parsed: Vec<RecipeIngredientInput> = ingredients
                .into_iter()
                .filter_map(|input| {
                    check_range(&mut errors, "ingredients", input.amount, AMOUNT_MIN, AMOUNT_MAX)
                        .map(|amount| RecipeIngredientInput {
                            ingredient_id: input.id,
                            amount,
                        })
                })
                .collect();

            (errors == before).then_some(parsed)
        });

        let tags = self.tags.and_then(|tags| {
            if tags.is_empty() {
                errors.add("tags", EMPTY_LIST);
                return None;
            }

            let mut unique = Vec::with_capacity(tags.len());
            tags.into_iter().for_each(|tag| {
                if !unique.contains(&tag) {
                    unique.push(tag);
                }
            });
            Some(unique)
        });

        errors.into_result()?;

        Ok(RecipeChanges {
            name,
            text,
            cooking_time,
            image,
            ingredients,
            tags,
        })
    }
}

fn check_range(errors: &mut FieldErrors, field: &str, value: i64, min: i32, max: i32) -> Option<i32> {
    if value < i64::from(min) {
        errors.add(field, format!("Ensure this value is greater than or equal to {min}."));
        None
    } else if value > i64::from(max) {
        errors.add(field, format!("Ensure this value is less than or equal to {max}."));
        None
    } else {
        i32::try_from(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ApiError;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn payload() -> RecipeWrite {
        RecipeWrite {
            ingredients: Some(vec![
                IngredientInput { id: 1, amount: 200 },
                IngredientInput { id: 2, amount: 50 },
            ]),
            tags: Some(vec![1, 2]),
            image: Some(PNG.to_owned()),
            name: Some("  Pancakes ".to_owned()),
            text: Some("Whisk and fry.".to_owned()),
            cooking_time: Some(20),
        }
    }

    fn field_errors(result: ApiResult<impl std::fmt::Debug>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_create() {
        let recipe = payload().validate_create().unwrap();
        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.cooking_time, 20);
        assert_eq!(recipe.tags, vec![1, 2]);
        assert_eq!(
            recipe.ingredients,
            vec![
                RecipeIngredientInput { ingredient_id: 1, amount: 200 },
                RecipeIngredientInput { ingredient_id: 2, amount: 50 },
            ]
        );
        assert_eq!(recipe.image.extension, "png");
    }

    #[test]
    fn create_requires_every_field() {
        let errors = field_errors(RecipeWrite::default().validate_create());
        for field in ["ingredients", "tags", "image", "name", "text", "cooking_time"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED.to_owned()][..]), "{field}");
        }
    }

    #[test]
    fn one_missing_field_is_the_only_error() {
        let write = RecipeWrite {
            tags: None,
            ..payload()
        };
        let errors = field_errors(write.validate_create());
        assert_eq!(errors.get("tags"), Some(&[REQUIRED.to_owned()][..]));
        assert_eq!(errors.get("name"), None);
        assert_eq!(errors.get("image"), None);
    }

    #[test]
    fn cooking_time_bounds() {
        let mut write = payload();
        write.cooking_time = Some(0);
        let errors = field_errors(write.validate_create());
        assert_eq!(
            errors.get("cooking_time"),
            Some(&["Ensure this value is greater than or equal to 1.".to_owned()][..])
        );

        let mut write = payload();
        write.cooking_time = Some(1441);
        let errors = field_errors(write.validate_create());
        assert_eq!(
            errors.get("cooking_time"),
            Some(&["Ensure this value is less than or equal to 1440.".to_owned()][..])
        );
    }

    #[test]
    fn amount_bounds() {
        let mut write = payload();
        write.ingredients = Some(vec![
            IngredientInput { id: 1, amount: 0 },
            IngredientInput { id: 2, amount: 10001 },
            IngredientInput { id: 3, amount: 10 },
        ]);
        let errors = field_errors(write.validate_create());
        assert_eq!(
            errors.get("ingredients"),
            Some(
                &[
                    "Ensure this value is greater than or equal to 1.".to_owned(),
                    "Ensure this value is less than or equal to 10000.".to_owned(),
                ][..]
            )
        );
    }

    #[test]
    fn blank_and_empty_values() {
        let write = RecipeWrite {
            ingredients: Some(vec![]),
            tags: Some(vec![]),
            name: Some("   ".to_owned()),
            text: Some("".to_owned()),
            ..payload()
        };
        let errors = field_errors(write.validate_create());
        assert_eq!(errors.get("ingredients"), Some(&[EMPTY_LIST.to_owned()][..]));
        assert_eq!(errors.get("tags"), Some(&[EMPTY_LIST.to_owned()][..]));
        assert_eq!(errors.get("name"), Some(&[BLANK.to_owned()][..]));
        assert_eq!(errors.get("text"), Some(&[BLANK.to_owned()][..]));
    }

    #[test]
    fn long_name() {
        let write = RecipeWrite {
            name: Some("x".repeat(RECIPE_NAME_MAX_LENGTH + 1)),
            ..payload()
        };
        let errors = field_errors(write.validate_create());
        assert_eq!(
            errors.get("name"),
            Some(&["Ensure this field has no more than 200 characters.".to_owned()][..])
        );
    }

    #[test]
    fn invalid_image() {
        let write = RecipeWrite {
            image: Some("not an image".to_owned()),
            ..payload()
        };
        let errors = field_errors(write.validate_create());
        assert_eq!(errors.get("image"), Some(&[INVALID_IMAGE.to_owned()][..]));
    }

    #[test]
    fn duplicate_tags_collapse_but_ingredients_do_not() {
        let write = RecipeWrite {
            tags: Some(vec![2, 1, 2]),
            ingredients: Some(vec![
                IngredientInput { id: 1, amount: 2 },
                IngredientInput { id: 1, amount: 3 },
            ]),
            ..payload()
        };
        let recipe = write.validate_create().unwrap();
        assert_eq!(recipe.tags, vec![2, 1]);
        assert_eq!(recipe.ingredients.len(), 2);
    }

    #[test]
    fn update_accepts_partial_payloads() {
        let write = RecipeWrite {
            cooking_time: Some(45),
            ..RecipeWrite::default()
        };
        assert_eq!(
            write.validate_update().unwrap(),
            RecipeChanges {
                cooking_time: Some(45),
                ..RecipeChanges::default()
            }
        );
    }

    #[test]
    fn update_still_validates_present_fields() {
        let write = RecipeWrite {
            tags: Some(vec![]),
            ..RecipeWrite::default()
        };
        let errors = field_errors(write.validate_update());
        assert_eq!(errors.get("tags"), Some(&[EMPTY_LIST.to_owned()][..]));
    }

    #[test]
    fn payload_deserializes_from_client_json() {
        let write: RecipeWrite = serde_json::from_str(
            r#"{"ingredients":[{"id":1,"amount":10}],"tags":[1],"image":"x","name":"n","text":"t","cooking_time":5}"#,
        )
        .unwrap();
        assert_eq!(write.ingredients, Some(vec![IngredientInput { id: 1, amount: 10 }]));
        assert_eq!(write.cooking_time, Some(5));
    }
}
