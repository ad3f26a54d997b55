use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::models::{PLACEHOLDER_THUMBNAIL, Recipe};

/// Number of positional ingredient/measure slots in a catalog record.
pub const INGREDIENT_SLOTS: usize = 20;

pub const DEFAULT_CATEGORY: &str = "Uncategorized";
pub const DEFAULT_AREA: &str = "Unknown";

/// Top-level catalog response. `meals` is `null` when a search finds nothing.
///
/// Records are kept as raw JSON so one malformed record cannot fail the whole batch.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub meals: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct MealData {
    #[serde(rename = "idMeal")]
    pub id: Option<String>,
    #[serde(rename = "strMeal")]
    pub name: Option<String>,
    /// Optional display fields are kept raw so a value of the wrong type falls back to
    /// its default instead of failing the record.
    #[serde(rename = "strCategory")]
    pub category: Option<serde_json::Value>,
    #[serde(rename = "strArea")]
    pub area: Option<serde_json::Value>,
    #[serde(rename = "strMealThumb")]
    pub thumbnail: Option<serde_json::Value>,
    #[serde(rename = "strInstructions")]
    pub instructions: Option<String>,
    /// Positional `strIngredientN` / `strMeasureN` slots and any other catalog fields.
    #[serde(flatten)]
    pub slots: HashMap<String, serde_json::Value>,
}

impl MealData {
    fn slot(&self, key: &str) -> Option<&str> {
        self.slots.get(key).and_then(serde_json::Value::as_str)
    }

    /// Ingredient lines in ascending slot order, each combined with its measure.
    #[must_use]
    pub fn ingredient_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for i in 1..=INGREDIENT_SLOTS {
            let Some(ingredient) = self.slot(&format!("strIngredient{i}")) else {
                continue;
            };
            if ingredient.trim().is_empty() {
                continue;
            }
            let measure = self.slot(&format!("strMeasure{i}")).unwrap_or("");
            lines.push(format!("{measure} {ingredient}").trim().to_string());
        }
        lines
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_blank_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => non_blank(Some(s)),
        _ => None,
    }
}

/// Map one catalog record to a [`Recipe`]. Records without an id, name, or instructions
/// are unusable and yield `None`.
#[must_use]
pub fn meal_to_recipe(meal: MealData) -> Option<Recipe> {
    let ingredients = meal.ingredient_lines();
    let id = non_blank(meal.id)?;
    let name = non_blank(meal.name)?;
    let instructions = non_blank(meal.instructions)?;

    Some(Recipe {
        id,
        name,
        category: non_blank_text(meal.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        area: non_blank_text(meal.area).unwrap_or_else(|| DEFAULT_AREA.to_string()),
        thumbnail: non_blank_text(meal.thumbnail)
            .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string()),
        instructions,
        ingredients,
        is_favorite: false,
    })
}

/// Decode and normalize one raw record, dropping it if it cannot be read or is unusable.
#[must_use]
pub fn value_to_recipe(value: serde_json::Value) -> Option<Recipe> {
    match serde_json::from_value::<MealData>(value) {
        Ok(meal) => {
            let recipe = meal_to_recipe(meal);
            if recipe.is_none() {
                debug!("skipping catalog record without id, name, or instructions");
            }
            recipe
        }
        Err(e) => {
            debug!(error = %e, "skipping unreadable catalog record");
            None
        }
    }
}

/// Normalize at most `limit` records from the front of `records`.
#[must_use]
pub fn normalize_meals(records: Vec<serde_json::Value>, limit: usize) -> Vec<Recipe> {
    records
        .into_iter()
        .take(limit)
        .filter_map(value_to_recipe)
        .collect()
}
