pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const MAX_COUNT_PER_PAGE: i64 = 100;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 1440;

pub const AMOUNT_MIN: i32 = 1;
pub const AMOUNT_MAX: i32 = 10000;

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;

pub const BODY_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

pub const CACHE_TTL_SECONDS: u64 = 60 * 60;

pub const IMAGE_DIRECTORY: &str = "recipes/images";
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

pub const TAG_CACHE_BIND_KEY: &str = "tag-cache-key";
pub const INGREDIENT_CACHE_BIND_KEY: &str = "ingredient-cache-key";
