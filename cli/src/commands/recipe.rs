use anyhow::Result;
use std::process;

use pantry_core::models::RecipeForm;
use pantry_core::service::RecipeService;

use super::helpers::{json_error, print_recipe_detail, print_recipe_table};
use super::{stamped_recipe, stamped_recipes, stamped_user_recipes};

pub(crate) async fn cmd_list(svc: &RecipeService, search: Option<&str>, json: bool) -> Result<()> {
    let recipes = stamped_recipes(svc, search).await?;

    if recipes.is_empty() {
        if json {
            println!("[]");
        } else if let Some(q) = search {
            eprintln!("No recipes found for '{q}'");
        } else {
            eprintln!("No recipes found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else {
        print_recipe_table(&recipes);
    }

    Ok(())
}

pub(crate) async fn cmd_show(svc: &RecipeService, id: &str, json: bool) -> Result<()> {
    let Some(recipe) = stamped_recipe(svc, id).await? else {
        if json {
            println!("{}", json_error(&format!("Recipe '{id}' not found")));
        } else {
            eprintln!("Recipe '{id}' not found");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        print_recipe_detail(&recipe);
    }

    Ok(())
}

pub(crate) async fn cmd_mine(svc: &RecipeService, json: bool) -> Result<()> {
    let recipes = stamped_user_recipes(svc).await?;

    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No recipes of your own yet. Add one with: pantry add <name> --instructions ...");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
    } else {
        print_recipe_table(&recipes);
    }

    Ok(())
}

pub(crate) async fn cmd_add(svc: &RecipeService, form: RecipeForm, json: bool) -> Result<()> {
    let created = svc.add_recipe(form.into_new_recipe()?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
    } else {
        let name = &created.name;
        let id = &created.id;
        let count = created.ingredients.len();
        println!("Added recipe: {name} (id: {id}, {count} ingredients)");
    }

    Ok(())
}

/// Assemble a [`RecipeForm`] from command-line arguments. Block text from `--ingredients`
/// comes first, followed by each `-i` line.
pub(crate) fn recipe_form(
    name: String,
    instructions: String,
    ingredients: Option<String>,
    ingredient_lines: Vec<String>,
    category: Option<String>,
    area: Option<String>,
    thumbnail: Option<String>,
) -> RecipeForm {
    let mut lines: Vec<String> = ingredients.into_iter().collect();
    lines.extend(ingredient_lines);

    RecipeForm {
        name,
        category: category.unwrap_or_default(),
        area: area.unwrap_or_default(),
        thumbnail: thumbnail.unwrap_or_default(),
        ingredients_text: lines.join("\n"),
        instructions,
    }
}
