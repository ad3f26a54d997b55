mod favorite;
mod helpers;
mod recipe;
mod theme;

use anyhow::Result;

use pantry_core::models::{Recipe, filter_recipes, stamp_favorites};
use pantry_core::service::RecipeService;

pub(crate) use favorite::{cmd_favorite_toggle, cmd_favorites};
pub(crate) use recipe::{cmd_add, cmd_list, cmd_mine, cmd_show, recipe_form};
pub(crate) use theme::cmd_theme;

/// All recipes, optionally filtered, with `is_favorite` stamped from the stored favorites.
pub(crate) async fn stamped_recipes(svc: &RecipeService, query: Option<&str>) -> Result<Vec<Recipe>> {
    let (all, ids) = tokio::join!(svc.get_all_recipes(), svc.get_favorite_ids());
    let mut recipes = match query {
        Some(q) => filter_recipes(all?, q),
        None => all?,
    };
    stamp_favorites(&mut recipes, &ids?);
    Ok(recipes)
}

pub(crate) async fn stamped_user_recipes(svc: &RecipeService) -> Result<Vec<Recipe>> {
    let (mine, ids) = tokio::join!(svc.get_user_recipes(), svc.get_favorite_ids());
    let mut recipes = mine?;
    stamp_favorites(&mut recipes, &ids?);
    Ok(recipes)
}

pub(crate) async fn stamped_recipe(svc: &RecipeService, id: &str) -> Result<Option<Recipe>> {
    let (found, ids) = tokio::join!(svc.get_recipe_by_id(id), svc.get_favorite_ids());
    let ids = ids?;
    Ok(found?.map(|mut recipe| {
        stamp_favorites(std::slice::from_mut(&mut recipe), &ids);
        recipe
    }))
}
