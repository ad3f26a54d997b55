use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use pantry_core::models::{Recipe, format_instructions, share_text};

pub(crate) fn print_recipe_table(recipes: &[Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Area")]
        area: String,
        #[tabled(rename = "Source")]
        source: &'static str,
        #[tabled(rename = "Fav")]
        favorite: &'static str,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: i + 1,
            id: r.id.clone(),
            name: truncate(&r.name, 35),
            category: truncate(&r.category, 18),
            area: truncate(&r.area, 14),
            source: source_label(r),
            favorite: if r.is_favorite { "*" } else { "" },
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

pub(crate) fn print_recipe_detail(recipe: &Recipe) {
    let name = &recipe.name;
    let marker = if recipe.is_favorite { " *" } else { "" };
    println!("{name}{marker}");
    println!(
        "{} / {}  (id: {}, {})",
        recipe.category,
        recipe.area,
        recipe.id,
        source_label(recipe)
    );
    println!("Image: {}", recipe.thumbnail);

    if !recipe.ingredients.is_empty() {
        println!("\nIngredients:");
        for line in &recipe.ingredients {
            println!("  - {line}");
        }
    }

    println!("\nInstructions:\n{}", format_instructions(&recipe.instructions));
    println!("\nShare:\n{}", share_text(recipe));
}

fn source_label(recipe: &Recipe) -> &'static str {
    if recipe.is_user_recipe() {
        "mine"
    } else {
        "catalog"
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Beef", 10), "Beef");
        assert_eq!(truncate("Spicy Arrabiata Penne", 10), "Spicy A...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème brûlée tart", 10), "Crème b...");
        assert_eq!(truncate("Tteokbokki", 10), "Tteokbokki");
        assert_eq!(truncate("親子丼と味噌汁の定食", 8), "親子丼と味...");
    }

    #[test]
    fn test_source_label() {
        let mut recipe = Recipe {
            id: "52772".into(),
            name: "Teriyaki Chicken Casserole".into(),
            category: "Chicken".into(),
            area: "Japanese".into(),
            thumbnail: String::new(),
            instructions: "Bake.".into(),
            ingredients: vec![],
            is_favorite: false,
        };
        assert_eq!(source_label(&recipe), "catalog");
        recipe.id = "user-1700000000000".into();
        assert_eq!(source_label(&recipe), "mine");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("Recipe not found"), r#"{"error":"Recipe not found"}"#);
        assert_eq!(json_error("say \"hi\""), r#"{"error":"say \"hi\""}"#);
    }
}
