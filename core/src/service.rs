use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::mealdb::{SearchResponse, normalize_meals};
use crate::models::{NewRecipe, Recipe, RecipeRecord, generate_user_id};
use crate::storage::{KeyValueStore, Storage};

pub const FAVORITES_KEY: &str = "favorites";
pub const USER_RECIPES_KEY: &str = "userRecipes";

/// Only this many records from the front of a catalog response are surfaced.
pub const REMOTE_RECIPE_LIMIT: usize = 20;

/// Remote recipe catalog.
///
/// The CLI implements this with reqwest against TheMealDB. Timeouts are the
/// implementor's concern; the service treats any error as "no remote recipes".
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch(&self) -> Result<SearchResponse>;
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Merges user-authored recipes with the remote catalog and owns the favorite-id set.
///
/// Recipes returned from [`get_all_recipes`](Self::get_all_recipes) and
/// [`get_recipe_by_id`](Self::get_recipe_by_id) are not favorite-stamped; callers fetch
/// [`get_favorite_ids`](Self::get_favorite_ids) and apply
/// [`stamp_favorites`](crate::models::stamp_favorites) themselves.
pub struct RecipeService {
    storage: Arc<Storage>,
    catalog: Arc<dyn CatalogProvider>,
    clock: fn() -> i64,
    // Held across each read-modify-write of the matching key.
    favorites_lock: Mutex<()>,
    user_recipes_lock: Mutex<()>,
}

impl RecipeService {
    pub fn new(storage: Arc<Storage>, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            storage,
            catalog,
            clock: now_millis,
            favorites_lock: Mutex::new(()),
            user_recipes_lock: Mutex::new(()),
        }
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, catalog: Arc<dyn CatalogProvider>) -> Self {
        Self::new(Arc::new(Storage::new(store)), catalog)
    }

    /// Replace the millisecond clock used for new user recipe ids.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    // --- Remote catalog ---

    /// Fetch and normalize the first [`REMOTE_RECIPE_LIMIT`] catalog records. Never fails:
    /// a transport error or a response without results yields an empty list.
    pub async fn fetch_remote_recipes(&self) -> Vec<Recipe> {
        match self.catalog.fetch().await {
            Ok(SearchResponse {
                meals: Some(records),
            }) => normalize_meals(records, REMOTE_RECIPE_LIMIT),
            Ok(SearchResponse { meals: None }) => Vec::new(),
            Err(e) => {
                warn!("catalog fetch failed, continuing without remote recipes: {e:#}");
                Vec::new()
            }
        }
    }

    // --- User recipes ---

    pub async fn get_user_recipes(&self) -> Result<Vec<Recipe>> {
        let records: Option<Vec<RecipeRecord>> = self.storage.get(USER_RECIPES_KEY).await?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(Recipe::from)
            .collect())
    }

    /// Prepend a new user recipe under a freshly generated id and persist the collection.
    pub async fn add_recipe(&self, recipe: NewRecipe) -> Result<Recipe> {
        let _guard = self.user_recipes_lock.lock().await;

        let mut user_recipes = self.get_user_recipes().await?;
        let id = generate_user_id(&user_recipes, (self.clock)());
        let created = recipe.into_recipe(id);
        user_recipes.insert(0, created.clone());

        let records: Vec<RecipeRecord> = user_recipes.iter().map(RecipeRecord::from).collect();
        self.storage.set(USER_RECIPES_KEY, &records).await?;
        Ok(created)
    }

    // --- Aggregated views ---

    /// User recipes first, then remote recipes, each in source order.
    pub async fn get_all_recipes(&self) -> Result<Vec<Recipe>> {
        let (user, remote) = tokio::join!(self.get_user_recipes(), self.fetch_remote_recipes());
        match user {
            Ok(mut all) => {
                all.extend(remote);
                Ok(all)
            }
            Err(e) => {
                warn!("aggregating recipes failed, retrying local recipes alone: {e:#}");
                self.get_user_recipes().await
            }
        }
    }

    pub async fn get_recipe_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        let all = self.get_all_recipes().await?;
        Ok(all.into_iter().find(|r| r.id == id))
    }

    // --- Favorites ---

    pub async fn get_favorite_ids(&self) -> Result<Vec<String>> {
        let ids: Option<Vec<String>> = self.storage.get(FAVORITES_KEY).await?;
        Ok(ids.unwrap_or_default())
    }

    /// Remove `recipe_id` from the favorites if present, otherwise append it.
    /// Returns whether the recipe is a favorite afterwards.
    pub async fn toggle_favorite(&self, recipe_id: &str) -> Result<bool> {
        let _guard = self.favorites_lock.lock().await;

        let mut favorites = self.get_favorite_ids().await?;
        let now_favorite = if let Some(index) = favorites.iter().position(|id| id == recipe_id) {
            favorites.remove(index);
            false
        } else {
            favorites.push(recipe_id.to_string());
            true
        };

        self.storage.set(FAVORITES_KEY, &favorites).await?;
        Ok(now_favorite)
    }

    /// Aggregated recipes whose id is in the favorite set, in aggregated order.
    pub async fn get_favorites(&self) -> Result<Vec<Recipe>> {
        let (all, ids) = tokio::join!(self.get_all_recipes(), self.get_favorite_ids());
        let (all, ids) = (all?, ids?);

        let favorites: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(all
            .into_iter()
            .filter(|r| favorites.contains(r.id.as_str()))
            .map(|mut r| {
                r.is_favorite = true;
                r
            })
            .collect())
    }
}
