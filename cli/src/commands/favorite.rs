use anyhow::Result;
use std::process;

use pantry_core::service::RecipeService;

use super::helpers::print_recipe_table;

pub(crate) async fn cmd_favorites(svc: &RecipeService, json: bool) -> Result<()> {
    let favorites = svc.get_favorites().await?;

    if favorites.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No favorites yet. Mark one with: pantry favorite <id>");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&favorites)?);
    } else {
        print_recipe_table(&favorites);
    }

    Ok(())
}

/// Toggling works on any id; membership is not checked against the catalog.
pub(crate) async fn cmd_favorite_toggle(svc: &RecipeService, id: &str, json: bool) -> Result<()> {
    let favorite = svc.toggle_favorite(id).await?;

    if json {
        println!("{}", serde_json::json!({ "id": id, "favorite": favorite }));
    } else if favorite {
        println!("Added {id} to favorites");
    } else {
        println!("Removed {id} from favorites");
    }

    Ok(())
}
