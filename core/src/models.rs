use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Prefix carried by every locally generated recipe id. Catalog ids are numeric,
/// so the two namespaces can never collide.
pub const USER_ID_PREFIX: &str = "user-";

pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://via.placeholder.com/400x300/4CAF50/FFFFFF?text=Recipe";

pub const DEFAULT_USER_CATEGORY: &str = "User Recipe";
pub const DEFAULT_USER_AREA: &str = "Custom";

/// Public page for a catalog recipe, followed by its id.
pub const CATALOG_PAGE_URL: &str = "https://www.themealdb.com/meal/";

/// A recipe as presented to consumers.
///
/// `is_favorite` is derived from the favorite-id set at read time and is never part of
/// the persisted record (see [`RecipeRecord`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: String,
    pub area: String,
    pub thumbnail: String,
    pub instructions: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Recipe {
    #[must_use]
    pub fn is_user_recipe(&self) -> bool {
        self.id.starts_with(USER_ID_PREFIX)
    }
}

/// Persisted form of a user recipe. Unknown fields (such as a stale favorite flag
/// written by an older client) are ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub area: String,
    pub thumbnail: String,
    pub instructions: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl From<RecipeRecord> for Recipe {
    fn from(r: RecipeRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            area: r.area,
            thumbnail: r.thumbnail,
            instructions: r.instructions,
            ingredients: r.ingredients,
            is_favorite: false,
        }
    }
}

impl From<&Recipe> for RecipeRecord {
    fn from(r: &Recipe) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            category: r.category.clone(),
            area: r.area.clone(),
            thumbnail: r.thumbnail.clone(),
            instructions: r.instructions.clone(),
            ingredients: r.ingredients.clone(),
        }
    }
}

/// A user recipe before it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub category: String,
    pub area: String,
    pub thumbnail: String,
    pub instructions: String,
    pub ingredients: Vec<String>,
}

impl NewRecipe {
    #[must_use]
    pub fn into_recipe(self, id: String) -> Recipe {
        Recipe {
            id,
            name: self.name,
            category: self.category,
            area: self.area,
            thumbnail: self.thumbnail,
            instructions: self.instructions,
            ingredients: self.ingredients,
            is_favorite: false,
        }
    }
}

/// Raw authoring input, one field per form control. Ingredients arrive as free text,
/// one ingredient per line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeForm {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub thumbnail: String,
    pub ingredients_text: String,
    pub instructions: String,
}

impl RecipeForm {
    pub fn into_new_recipe(self) -> Result<NewRecipe> {
        if self.name.trim().is_empty() {
            bail!("Recipe name must not be empty");
        }
        if self.ingredients_text.trim().is_empty() {
            bail!("Recipe needs at least one ingredient");
        }
        if self.instructions.trim().is_empty() {
            bail!("Recipe instructions must not be empty");
        }

        Ok(NewRecipe {
            name: self.name.trim().to_string(),
            category: non_blank_or(&self.category, DEFAULT_USER_CATEGORY),
            area: non_blank_or(&self.area, DEFAULT_USER_AREA),
            thumbnail: non_blank_or(&self.thumbnail, PLACEHOLDER_THUMBNAIL),
            instructions: self.instructions.trim().to_string(),
            ingredients: parse_ingredient_lines(&self.ingredients_text),
        })
    }
}

fn non_blank_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split free-text ingredients on newlines, trimming each line and dropping blank ones.
#[must_use]
pub fn parse_ingredient_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Pick an id for a new user recipe from the current time in milliseconds, bumping it
/// until it is unused within `existing`.
#[must_use]
pub fn generate_user_id(existing: &[Recipe], now_millis: i64) -> String {
    let taken: HashSet<&str> = existing.iter().map(|r| r.id.as_str()).collect();
    let mut millis = now_millis;
    loop {
        let candidate = format!("{USER_ID_PREFIX}{millis}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        millis += 1;
    }
}

/// Set `is_favorite` on each recipe by membership in `favorite_ids`.
pub fn stamp_favorites(recipes: &mut [Recipe], favorite_ids: &[String]) {
    let favorites: HashSet<&str> = favorite_ids.iter().map(String::as_str).collect();
    for recipe in recipes {
        recipe.is_favorite = favorites.contains(recipe.id.as_str());
    }
}

/// Case-insensitive match of `query` against name, category, or area.
#[must_use]
pub fn filter_recipes(recipes: Vec<Recipe>, query: &str) -> Vec<Recipe> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return recipes;
    }
    recipes
        .into_iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&query)
                || r.category.to_lowercase().contains(&query)
                || r.area.to_lowercase().contains(&query)
        })
        .collect()
}

/// Message for sharing a recipe. Catalog recipes link to their public page; user recipes
/// only exist on this device.
#[must_use]
pub fn share_text(recipe: &Recipe) -> String {
    let name = &recipe.name;
    if recipe.is_user_recipe() {
        format!("Check out this recipe: {name}")
    } else {
        format!(
            "Check out this recipe: {name}\n{CATALOG_PAGE_URL}{}",
            recipe.id
        )
    }
}

/// Break instructions into one paragraph per sentence for display.
#[must_use]
pub fn format_instructions(instructions: &str) -> String {
    let normalized = instructions.replace("\r\n", "\n");
    let mut out = String::with_capacity(normalized.len());
    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '.' && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            out.push_str("\n\n");
        }
    }
    out.trim().to_string()
}
