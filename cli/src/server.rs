use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use crate::commands::{stamped_recipe, stamped_recipes, stamped_user_recipes};
use pantry_core::models::{Recipe, RecipeForm};
use pantry_core::service::RecipeService;
use pantry_core::theme::{Palette, Theme, ThemeService};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    recipes: Arc<RecipeService>,
    theme: Arc<Mutex<ThemeService>>,
    api_key: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct RecipeQuery {
    q: Option<String>,
}

#[derive(Serialize)]
struct FavoriteToggled {
    id: String,
    favorite: bool,
}

#[derive(Serialize)]
struct ThemeResponse {
    theme: Theme,
    palette: Palette,
}

impl From<Theme> for ThemeResponse {
    fn from(theme: Theme) -> Self {
        Self {
            theme,
            palette: theme.palette(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Vec<Recipe>>, ApiError> {
    let recipes = stamped_recipes(&state.recipes, query.q.as_deref()).await?;
    Ok(Json(recipes))
}

async fn create_recipe(
    State(state): State<AppState>,
    Json(form): Json<RecipeForm>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let new_recipe = form
        .into_new_recipe()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let created = state.recipes.add_recipe(new_recipe).await?;
    info!(id = %created.id, "created user recipe");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_user_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(stamped_user_recipes(&state.recipes).await?))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    stamped_recipe(&state.recipes, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe '{id}' not found")))
}

async fn list_favorites(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>, ApiError> {
    Ok(Json(state.recipes.get_favorites().await?))
}

async fn list_favorite_ids(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.recipes.get_favorite_ids().await?))
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteToggled>, ApiError> {
    let favorite = state.recipes.toggle_favorite(&id).await?;
    Ok(Json(FavoriteToggled { id, favorite }))
}

async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let theme = state.theme.lock().await.theme();
    Json(theme.into())
}

async fn toggle_theme(State(state): State<AppState>) -> Result<Json<ThemeResponse>, ApiError> {
    let theme = state.theme.lock().await.toggle().await?;
    Ok(Json(theme.into()))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route("/api/recipes/mine", get(list_user_recipes))
        .route("/api/recipes/{id}", get(get_recipe))
        .route("/api/favorites", get(list_favorites))
        .route("/api/favorites/ids", get(list_favorite_ids))
        .route("/api/favorites/{id}/toggle", post(toggle_favorite))
        .route("/api/theme", get(get_theme))
        .route("/api/theme/toggle", post(toggle_theme))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    recipes: RecipeService,
    theme: ThemeService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        recipes: Arc::new(recipes),
        theme: Arc::new(Mutex::new(theme)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        let head = key.get(..4).unwrap_or_default();
        let tail = key.get(key.len().saturating_sub(4)..).unwrap_or_default();
        eprintln!("API key: {head}...{tail} (see api_key file in data directory)");
    } else {
        warn!("authentication disabled (--no-auth), the API is open to anyone");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        warn!(
            "listening on {bind} with no authentication; any device on your network can access this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use pantry_core::mealdb::SearchResponse;
    use pantry_core::service::CatalogProvider;
    use pantry_core::storage::{MemoryStore, Storage};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FixedCatalog(Vec<Value>);

    #[async_trait]
    impl CatalogProvider for FixedCatalog {
        async fn fetch(&self) -> anyhow::Result<SearchResponse> {
            Ok(SearchResponse {
                meals: Some(self.0.clone()),
            })
        }
    }

    fn meal(id: &str, name: &str, category: &str) -> Value {
        json!({
            "idMeal": id,
            "strMeal": name,
            "strCategory": category,
            "strArea": "British",
            "strMealThumb": format!("https://img.example/{id}.jpg"),
            "strInstructions": "Cook it. Serve it.",
            "strIngredient1": "Beef",
            "strMeasure1": "500g",
        })
    }

    async fn test_state(api_key: Option<String>) -> AppState {
        let storage = Arc::new(Storage::new(Arc::new(MemoryStore::new())));
        let catalog = FixedCatalog(vec![
            meal("52874", "Beef and Mustard Pie", "Beef"),
            meal("52878", "Beef and Oyster pie", "Beef"),
            meal("52959", "Baked salmon with fennel", "Seafood"),
        ]);
        let recipes = RecipeService::new(Arc::clone(&storage), Arc::new(catalog));
        let theme = ThemeService::load(storage).await.unwrap();
        AppState {
            recipes: Arc::new(recipes),
            theme: Arc::new(Mutex::new(theme)),
            api_key,
        }
    }

    async fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key).await)
    }

    async fn send(app: &Router, request: axum::http::Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::post(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &Value) -> axum::http::Request<Body> {
        axum::http::Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string())).await;

        let (status, json) = send(&app, get_req("/api/recipes")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("correct-key".to_string())).await;

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .header("authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("my-secret-key".to_string())).await;

        let response = app
            .oneshot(
                axum::http::Request::get("/api/favorites/ids")
                    .header("authorization", "Bearer my-secret-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None).await;

        let response = app.oneshot(get_req("/api/theme")).await.unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string())).await;

        let response = app.oneshot(get_req("/api/theme")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None).await;

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/recipes")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret database path /home/user/.pantry"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn list_recipes_returns_catalog() {
        let app = test_app(None).await;

        let (status, json) = send(&app, get_req("/api/recipes")).await;

        assert_eq!(status, StatusCode::OK);
        let recipes = json.as_array().unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0]["id"], "52874");
        assert_eq!(recipes[0]["ingredients"], json!(["500g Beef"]));
        assert_eq!(recipes[0]["is_favorite"], false);
    }

    #[tokio::test]
    async fn list_recipes_filters_by_query() {
        let app = test_app(None).await;

        let (status, json) = send(&app, get_req("/api/recipes?q=seafood")).await;

        assert_eq!(status, StatusCode::OK);
        let recipes = json.as_array().unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0]["name"], "Baked salmon with fennel");
    }

    #[tokio::test]
    async fn create_recipe_returns_201_and_lists_first() {
        let app = test_app(None).await;

        let form = json!({
            "name": "Weeknight Dal",
            "ingredients_text": "1 cup red lentils\n\n1 onion\n",
            "instructions": "Simmer everything.",
        });
        let (status, created) = send(&app, post_json("/api/recipes", &form)).await;

        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(id.starts_with("user-"));
        assert_eq!(created["category"], "User Recipe");
        assert_eq!(created["area"], "Custom");
        assert_eq!(created["ingredients"], json!(["1 cup red lentils", "1 onion"]));

        let (_, all) = send(&app, get_req("/api/recipes")).await;
        assert_eq!(all[0]["id"], id.as_str());
        assert_eq!(all.as_array().unwrap().len(), 4);

        let (_, mine) = send(&app, get_req("/api/recipes/mine")).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_recipe_blank_name_returns_400() {
        let app = test_app(None).await;

        let form = json!({
            "name": "   ",
            "ingredients_text": "salt",
            "instructions": "Season.",
        });
        let (status, json) = send(&app, post_json("/api/recipes", &form)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("name"));

        let (_, mine) = send(&app, get_req("/api/recipes/mine")).await;
        assert!(mine.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_recipe_by_id() {
        let app = test_app(None).await;

        let (status, json) = send(&app, get_req("/api/recipes/52878")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "Beef and Oyster pie");

        let (status, json) = send(&app, get_req("/api/recipes/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Recipe 'nope' not found");
    }

    #[tokio::test]
    async fn toggle_favorite_round_trip() {
        let app = test_app(None).await;

        let (status, json) = send(&app, post_req("/api/favorites/52959/toggle")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "id": "52959", "favorite": true }));

        let (_, ids) = send(&app, get_req("/api/favorites/ids")).await;
        assert_eq!(ids, json!(["52959"]));

        let (_, favorites) = send(&app, get_req("/api/favorites")).await;
        let favorites = favorites.as_array().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0]["is_favorite"], true);

        let (_, detail) = send(&app, get_req("/api/recipes/52959")).await;
        assert_eq!(detail["is_favorite"], true);

        let (_, json) = send(&app, post_req("/api/favorites/52959/toggle")).await;
        assert_eq!(json["favorite"], false);
        let (_, ids) = send(&app, get_req("/api/favorites/ids")).await;
        assert_eq!(ids, json!([]));
    }

    #[tokio::test]
    async fn theme_toggle_flips_palette() {
        let app = test_app(None).await;

        let (status, json) = send(&app, get_req("/api/theme")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["theme"], "light");
        assert_eq!(json["palette"]["toolbar_background"], "#3880ff");

        let (status, json) = send(&app, post_req("/api/theme/toggle")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["palette"]["background"], "#000000");

        let (_, json) = send(&app, get_req("/api/theme")).await;
        assert_eq!(json["theme"], "dark");
    }
}
