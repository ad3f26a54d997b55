use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use pantry_core::mealdb::SearchResponse;
use pantry_core::service::CatalogProvider;

pub const DEFAULT_CATALOG_URL: &str = "https://www.themealdb.com/api/json/v1/1/search.php";

pub struct MealDbClient {
    client: reqwest::Client,
    url: String,
}

impl MealDbClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "pantry/{} (recipe box)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn search_async(&self, query: &str) -> Result<SearchResponse> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("s", query)])
            .send()
            .await
            .context("Failed to reach TheMealDB API")?
            .error_for_status()
            .context("TheMealDB API returned an error status")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse TheMealDB search response")?;

        Ok(data)
    }
}

#[async_trait]
impl CatalogProvider for MealDbClient {
    /// An empty search term lists the catalog's default result set.
    async fn fetch(&self) -> Result<SearchResponse> {
        self.search_async("").await
    }
}
