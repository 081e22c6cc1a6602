//! REST resource server client.
//!
//! Talks to `/products` and `/categories` collections with plain JSON bodies,
//! which both `json-server` and the Spring backend expose.

use std::sync::Arc;

use bazaar_core::{Category, NewCategory, NewProduct, Product, ProductId};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogSource, SourceError};
use crate::config::ApiConfig;

/// Response bodies are truncated to this many characters in errors and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// Client for the catalog REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct RestSource {
    inner: Arc<RestSourceInner>,
}

struct RestSourceInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl RestSource {
    /// Create a new REST client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestSourceInner {
                client,
                base_url: config.base_url.clone(),
                token: config.token.clone(),
            }),
        })
    }

    /// Base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build `base/segment/segment...`.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.inner.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and return the body of a successful response.
    async fn send_raw(&self, request: RequestBuilder, resource: &str) -> Result<String, SourceError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SourceError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(resource.to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = preview(&body);
            tracing::error!(
                status = %status,
                resource,
                body = %message,
                "Catalog API returned non-success status"
            );
            return Err(SourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, SourceError> {
        let body = self.send_raw(request, resource).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                resource,
                body = %preview(&body),
                "Failed to parse catalog API response"
            );
            SourceError::Parse(e)
        })
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

impl CatalogSource for RestSource {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, SourceError> {
        let request = self.inner.client.get(self.endpoint(&["products"]));
        let products: Vec<Product> = self.send_json(request, "products").await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, SourceError> {
        let request = self.inner.client.get(self.endpoint(&["categories"]));
        let categories: Vec<Category> = self.send_json(request, "categories").await?;
        debug!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, SourceError> {
        let id_segment = id.to_string();
        let request = self
            .inner
            .client
            .get(self.endpoint(&["products", &id_segment]));
        self.send_json(request, &format!("product {id}")).await
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: &NewProduct) -> Result<Product, SourceError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["products"]))
            .json(product);
        self.send_json(request, "products").await
    }

    #[instrument(skip(self, product), fields(product_id = %id))]
    async fn update_product(&self, id: ProductId, product: &Product) -> Result<Product, SourceError> {
        let id_segment = id.to_string();
        let request = self
            .inner
            .client
            .put(self.endpoint(&["products", &id_segment]))
            .json(product);
        self.send_json(request, &format!("product {id}")).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), SourceError> {
        let id_segment = id.to_string();
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["products", &id_segment]));
        self.send_raw(request, &format!("product {id}")).await?;
        Ok(())
    }

    #[instrument(skip(self, category), fields(name = %category.name))]
    async fn create_category(&self, category: &NewCategory) -> Result<Category, SourceError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["categories"]))
            .json(category);
        self.send_json(request, "categories").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn source(base: &str) -> RestSource {
        RestSource::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            token: None,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let rest = source("http://localhost:3000");
        assert_eq!(
            rest.endpoint(&["products", "7"]).as_str(),
            "http://localhost:3000/products/7"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let rest = source("https://api.example.com/v1/");
        assert_eq!(
            rest.endpoint(&["categories"]).as_str(),
            "https://api.example.com/v1/categories"
        );
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(BODY_PREVIEW_CHARS * 2);
        assert_eq!(preview(&long).len(), BODY_PREVIEW_CHARS);
    }
}
