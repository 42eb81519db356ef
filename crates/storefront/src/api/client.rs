//! `reqwest` implementation of the backend client.

use std::sync::Arc;
use std::time::Duration;

use freshcatch_core::{
    ApiBaseUrl, Cart, CartItem, CartItemId, Order, OrderId, OrderSubmission, Product, ProductId,
    Quantity, UserId, UserProfile,
};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::types::{AddItemRequest, CartBody, ErrorBody, ProfileUpdate, UpdateItemRequest};
use super::{ApiError, CartApi, OrderApi};
use crate::config::BackendConfig;

const API_KEY_HEADER: &str = "x-api-key";
const USER_ID_HEADER: &str = "x-user-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the FreshCatch REST backend.
///
/// Cheap to clone. Products are cached for 5 minutes.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base_url: ApiBaseUrl,
    api_key: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl RestClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn item_path(prefix: &str, id: &str) -> String {
        format!("{prefix}/{}", urlencoding::encode(id))
    }

    /// Send a request and return the raw body of a successful response.
    async fn dispatch(&self, request: RequestBuilder, what: &str) -> Result<String, ApiError> {
        let response = request
            .header(API_KEY_HEADER, self.inner.api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::warn!(
                status = %status,
                what,
                message = %message,
                "Backend returned non-success status"
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Send a request and parse the JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let body = self.dispatch(request, what).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                what,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalogue Methods
    // =========================================================================

    /// List products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Arc<Vec<Product>>, ApiError> {
        let cache_key = CacheKey::Products {
            category: category.map(str::to_string),
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.url("products")?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }

        let products: Arc<Vec<Product>> =
            Arc::new(self.send(self.inner.client.get(url), "products").await?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(product_id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.url(&Self::item_path("products", product_id.as_str()))?;
        let product: Product = self
            .send(self.inner.client.get(url), &format!("product {product_id}"))
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Profile Methods
    // =========================================================================

    /// Get the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %owner))]
    pub async fn get_profile(&self, owner: &UserId) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("profile")?)
            .header(USER_ID_HEADER, owner.as_str());
        self.send(request, "profile").await
    }

    /// Replace the caller's editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update), fields(user_id = %owner))]
    pub async fn update_profile(
        &self,
        owner: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let request = self
            .inner
            .client
            .put(self.url("profile")?)
            .header(USER_ID_HEADER, owner.as_str())
            .json(update);
        self.send(request, "profile").await
    }
}

impl CartApi for RestClient {
    #[instrument(skip(self), fields(user_id = %owner))]
    async fn fetch_cart(&self, owner: &UserId) -> Result<Cart, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("cart")?)
            .header(USER_ID_HEADER, owner.as_str());
        let body: CartBody = self.send(request, "cart").await?;
        Ok(Cart {
            owner: owner.clone(),
            items: body.items,
        })
    }

    #[instrument(skip(self), fields(user_id = %owner, product_id = %product_id))]
    async fn add_item(
        &self,
        owner: &UserId,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, ApiError> {
        let body = AddItemRequest {
            product_id: product_id.clone(),
            quantity,
        };
        let request = self
            .inner
            .client
            .post(self.url("cart/items")?)
            .header(USER_ID_HEADER, owner.as_str())
            .json(&body);
        self.send(request, &format!("product {product_id}")).await
    }

    #[instrument(skip(self), fields(user_id = %owner, item_id = %item_id))]
    async fn update_item(
        &self,
        owner: &UserId,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, ApiError> {
        let request = self
            .inner
            .client
            .patch(self.url(&Self::item_path("cart/items", item_id.as_str()))?)
            .header(USER_ID_HEADER, owner.as_str())
            .json(&UpdateItemRequest { quantity });
        self.send(request, &format!("cart item {item_id}")).await
    }

    #[instrument(skip(self), fields(user_id = %owner, item_id = %item_id))]
    async fn remove_item(&self, owner: &UserId, item_id: &CartItemId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.url(&Self::item_path("cart/items", item_id.as_str()))?)
            .header(USER_ID_HEADER, owner.as_str());
        self.dispatch(request, &format!("cart item {item_id}"))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn clear_cart(&self, owner: &UserId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.url("cart")?)
            .header(USER_ID_HEADER, owner.as_str());
        self.dispatch(request, "cart").await.map(drop)
    }
}

impl OrderApi for RestClient {
    #[instrument(skip(self, submission), fields(user_id = %owner, lines = submission.items().len()))]
    async fn create_order(
        &self,
        owner: &UserId,
        submission: &OrderSubmission,
    ) -> Result<Order, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url("orders")?)
            .header(USER_ID_HEADER, owner.as_str())
            .json(submission);
        self.send(request, "orders").await
    }

    #[instrument(skip(self), fields(user_id = %owner))]
    async fn list_orders(&self, owner: &UserId) -> Result<Vec<Order>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("orders")?)
            .header(USER_ID_HEADER, owner.as_str());
        self.send(request, "orders").await
    }

    #[instrument(skip(self), fields(user_id = %owner, order_id = %order_id))]
    async fn get_order(&self, owner: &UserId, order_id: &OrderId) -> Result<Order, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url(&Self::item_path("orders", order_id.as_str()))?)
            .header(USER_ID_HEADER, owner.as_str());
        self.send(request, &format!("order {order_id}")).await
    }
}
