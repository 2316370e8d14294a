//! Sanity HTTP query API client.
//!
//! Runs GROQ queries against `https://<project>.api.sanity.io/v<version>/data/query/<dataset>`
//! (or the `apicdn` host when no token is configured). Query parameters are
//! passed as `$name=<json value>`. Results are cached with `moka` for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use leureluxe_core::{Category, Product, ProductId};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::{ContentError, ContentSource};
use crate::config::SanityConfig;

const PRODUCT_PROJECTION: &str =
    r#"{_id, name, "slug": slug.current, description, price, images, stock}"#;

const ALL_PRODUCTS: &str = r#"*[_type == "product"] | order(name asc)"#;
const PRODUCT_BY_ID: &str = r#"*[_type == "product" && _id == $id][0]"#;
const PRODUCT_BY_SLUG: &str = r#"*[_type == "product" && slug.current == $slug][0]"#;
const PRODUCTS_IN_CATEGORY: &str = r#"*[_type == "product" && references(*[_type == "category" && slug.current == $slug]._id)] | order(name asc)"#;
const ALL_CATEGORIES: &str = r#"*[_type == "category"] | order(title asc){_id, title, "slug": slug.current, description, "productCount": count(*[_type == "product" && references(^._id)])}"#;

/// Client for the Sanity content API.
#[derive(Clone)]
pub struct SanityClient {
    inner: Arc<SanityClientInner>,
}

struct SanityClientInner {
    client: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct QueryErrorBody {
    #[serde(default)]
    error: Option<QueryErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct QueryErrorDetail {
    #[serde(default)]
    description: Option<String>,
}

impl SanityClient {
    /// Create a new content client.
    #[must_use]
    pub fn new(config: &SanityConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        // Authenticated reads bypass the CDN so drafts and private datasets work
        let host = if config.api_token.is_some() {
            "api.sanity.io"
        } else {
            "apicdn.sanity.io"
        };
        let endpoint = format!(
            "https://{}.{host}/v{}/data/query/{}",
            config.project_id, config.api_version, config.dataset
        );

        Self {
            inner: Arc::new(SanityClientInner {
                client: reqwest::Client::new(),
                endpoint,
                token: config.api_token.clone(),
                cache,
            }),
        }
    }

    /// Build the query URL with GROQ text and JSON-encoded parameters.
    fn query_url(&self, query: &str, params: &[(&str, &str)]) -> Result<Url, ContentError> {
        let mut url = Url::parse(&self.inner.endpoint)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", query);
            for (name, value) in params {
                pairs.append_pair(&format!("${name}"), &serde_json::to_string(value)?);
            }
        }
        Ok(url)
    }

    /// Execute a GROQ query.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ContentError> {
        let url = self.query_url(query, params)?;

        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<QueryErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.description)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(
                status = %status,
                message = %message,
                "Sanity API returned non-success status"
            );
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: QueryResponse<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Sanity query response"
            );
            ContentError::Parse(e)
        })?;

        Ok(response.result)
    }

    async fn cached_products(
        &self,
        key: CacheKey,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<Product>, ContentError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products.as_ref().clone());
        }

        let products: Vec<Product> = self
            .execute(&format!("{query}{PRODUCT_PROJECTION}"), params)
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;

        Ok(products)
    }

    async fn cached_product(
        &self,
        key: CacheKey,
        query: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Product>, ContentError> {
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product: Option<Product> = self
            .execute(&format!("{query}{PRODUCT_PROJECTION}"), params)
            .await?;

        // Misses are not cached so newly published products show up immediately
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }

        Ok(product)
    }
}

#[async_trait]
impl ContentSource for SanityClient {
    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ContentError> {
        self.cached_products(CacheKey::Products, ALL_PRODUCTS, &[])
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product_by_id(&self, id: &ProductId) -> Result<Option<Product>, ContentError> {
        self.cached_product(
            CacheKey::ProductById(id.to_string()),
            PRODUCT_BY_ID,
            &[("id", id.as_str())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError> {
        self.cached_product(
            CacheKey::ProductBySlug(slug.to_string()),
            PRODUCT_BY_SLUG,
            &[("slug", slug)],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, ContentError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories.as_ref().clone());
        }

        let categories: Vec<Category> = self.execute(ALL_CATEGORIES, &[]).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::new(categories.clone())),
            )
            .await;

        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn products_in_category(&self, slug: &str) -> Result<Vec<Product>, ContentError> {
        self.cached_products(
            CacheKey::CategoryProducts(slug.to_string()),
            PRODUCTS_IN_CATEGORY,
            &[("slug", slug)],
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> SanityConfig {
        SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            api_token: token.map(|t| SecretString::from(t.to_string())),
        }
    }

    #[test]
    fn test_endpoint_uses_cdn_without_token() {
        let client = SanityClient::new(&config(None));
        assert_eq!(
            client.inner.endpoint,
            "https://abc123.apicdn.sanity.io/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn test_endpoint_uses_api_host_with_token() {
        let client = SanityClient::new(&config(Some("skToken")));
        assert!(client.inner.endpoint.starts_with("https://abc123.api.sanity.io/"));
    }

    #[test]
    fn test_query_url_json_encodes_params() {
        let client = SanityClient::new(&config(None));
        let url = client
            .query_url(PRODUCT_BY_SLUG, &[("slug", "silk-scarf")])
            .unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("query".to_string(), PRODUCT_BY_SLUG.to_string()));
        assert_eq!(
            pairs[1],
            ("$slug".to_string(), "\"silk-scarf\"".to_string())
        );
    }

    #[test]
    fn test_query_response_with_null_result() {
        let response: QueryResponse<Option<Product>> =
            serde_json::from_str(r#"{"ms": 3, "query": "*", "result": null}"#).unwrap();
        assert_eq!(response.result, None);
    }
}
