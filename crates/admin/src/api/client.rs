//! `reqwest` implementation of the back-office client.

use std::sync::Arc;
use std::time::Duration;

use freshcatch_core::{
    ApiBaseUrl, Order, OrderId, OrderStatus, Product, ProductDraft, ProductId, UserId,
    UserProfile,
};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::AdminApiError;
use super::types::{DashboardStats, ErrorBody, StatusUpdate, UserUpdate};
use crate::config::BackendConfig;

const API_KEY_HEADER: &str = "x-api-key";
const ADMIN_ID_HEADER: &str = "x-admin-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the backend's admin endpoints. Cheap to clone.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: ApiBaseUrl,
    api_key: SecretString,
}

/// A non-success response, before it is classified.
struct Failure {
    status: StatusCode,
    message: String,
}

impl AdminClient {
    /// Create a new back-office client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, AdminApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, AdminApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn item_path(prefix: &str, id: &str) -> String {
        format!("{prefix}/{}", urlencoding::encode(id))
    }

    /// Send a request as `admin`. A non-success status other than 404 or
    /// 429 is handed back as a [`Failure`] for the caller to classify.
    async fn exchange(
        &self,
        request: RequestBuilder,
        admin: &UserId,
        what: &str,
    ) -> Result<Result<String, Failure>, AdminApiError> {
        let response = request
            .header(API_KEY_HEADER, self.inner.api_key.expose_secret())
            .header(ADMIN_ID_HEADER, admin.as_str())
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
            return Err(AdminApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(AdminApiError::NotFound(what.to_string()));
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
            return Ok(Err(Failure { status, message }));
        }

        Ok(Ok(body))
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
        admin: &UserId,
        what: &str,
    ) -> Result<String, AdminApiError> {
        self.exchange(request, admin, what)
            .await?
            .map_err(|failure| AdminApiError::Rejected {
                status: failure.status.as_u16(),
                message: failure.message,
            })
    }

    fn parse<T: DeserializeOwned>(body: &str, what: &str) -> Result<T, AdminApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                what,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            AdminApiError::Parse(e)
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        admin: &UserId,
        what: &str,
    ) -> Result<T, AdminApiError> {
        let body = self.dispatch(request, admin, what).await?;
        Self::parse(&body, what)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Store-wide counters for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(admin_id = %admin))]
    pub async fn dashboard_stats(&self, admin: &UserId) -> Result<DashboardStats, AdminApiError> {
        let request = self.inner.client.get(self.url("admin/stats")?);
        self.send(request, admin, "stats").await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(admin_id = %admin))]
    pub async fn list_users(&self, admin: &UserId) -> Result<Vec<UserProfile>, AdminApiError> {
        let request = self.inner.client.get(self.url("admin/users")?);
        self.send(request, admin, "users").await
    }

    /// Change a user's role or verification flag.
    ///
    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the user does not exist.
    #[instrument(skip(self, update), fields(admin_id = %admin, user_id = %user_id))]
    pub async fn update_user(
        &self,
        admin: &UserId,
        user_id: &UserId,
        update: &UserUpdate,
    ) -> Result<UserProfile, AdminApiError> {
        let request = self
            .inner
            .client
            .patch(self.url(&Self::item_path("admin/users", user_id.as_str()))?)
            .json(update);
        self.send(request, admin, &format!("user {user_id}")).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, including those out of stock.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(admin_id = %admin))]
    pub async fn list_products(&self, admin: &UserId) -> Result<Vec<Product>, AdminApiError> {
        let request = self.inner.client.get(self.url("admin/products")?);
        self.send(request, admin, "products").await
    }

    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(admin_id = %admin, product_id = %product_id))]
    pub async fn get_product(
        &self,
        admin: &UserId,
        product_id: &ProductId,
    ) -> Result<Product, AdminApiError> {
        let request = self
            .inner
            .client
            .get(self.url(&Self::item_path("admin/products", product_id.as_str()))?);
        self.send(request, admin, &format!("product {product_id}")).await
    }

    /// Create a product from an already validated draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, draft), fields(admin_id = %admin, name = %draft.name))]
    pub async fn create_product(
        &self,
        admin: &UserId,
        draft: &ProductDraft,
    ) -> Result<Product, AdminApiError> {
        let request = self
            .inner
            .client
            .post(self.url("admin/products")?)
            .json(draft);
        self.send(request, admin, "products").await
    }

    /// Replace a product with an already validated draft.
    ///
    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the product does not exist.
    #[instrument(skip(self, draft), fields(admin_id = %admin, product_id = %product_id))]
    pub async fn update_product(
        &self,
        admin: &UserId,
        product_id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, AdminApiError> {
        let request = self
            .inner
            .client
            .put(self.url(&Self::item_path("admin/products", product_id.as_str()))?)
            .json(draft);
        self.send(request, admin, &format!("product {product_id}")).await
    }

    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(admin_id = %admin, product_id = %product_id))]
    pub async fn delete_product(
        &self,
        admin: &UserId,
        product_id: &ProductId,
    ) -> Result<(), AdminApiError> {
        let request = self
            .inner
            .client
            .delete(self.url(&Self::item_path("admin/products", product_id.as_str()))?);
        self.dispatch(request, admin, &format!("product {product_id}"))
            .await
            .map(drop)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// All orders, newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(admin_id = %admin))]
    pub async fn list_orders(
        &self,
        admin: &UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, AdminApiError> {
        let mut url = self.url("admin/orders")?;
        if let Some(status) = status {
            url.query_pairs_mut().append_pair("status", status.as_str());
        }
        self.send(self.inner.client.get(url), admin, "orders").await
    }

    /// # Errors
    ///
    /// Returns `AdminApiError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(admin_id = %admin, order_id = %order_id))]
    pub async fn get_order(&self, admin: &UserId, order_id: &OrderId) -> Result<Order, AdminApiError> {
        let request = self
            .inner
            .client
            .get(self.url(&Self::item_path("admin/orders", order_id.as_str()))?);
        self.send(request, admin, &format!("order {order_id}")).await
    }

    /// Move an order to `status`.
    ///
    /// Any status may be requested; the backend decides whether the move is
    /// legal.
    ///
    /// # Errors
    ///
    /// Returns `AdminApiError::TransitionRejected` if the backend answers 409
    /// or 422.
    #[instrument(skip(self, status), fields(admin_id = %admin, order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        admin: &UserId,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, AdminApiError> {
        let path = format!("{}/status", Self::item_path("admin/orders", order_id.as_str()));
        let request = self
            .inner
            .client
            .put(self.url(&path)?)
            .json(&StatusUpdate { status });
        let what = format!("order {order_id}");

        match self.exchange(request, admin, &what).await? {
            Ok(body) => Self::parse(&body, &what),
            Err(failure) => Err(classify_status_failure(status, failure)),
        }
    }
}

fn classify_status_failure(requested: OrderStatus, failure: Failure) -> AdminApiError {
    match failure.status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            AdminApiError::TransitionRejected {
                requested,
                message: failure.message,
            }
        }
        status => AdminApiError::Rejected {
            status: status.as_u16(),
            message: failure.message,
        },
    }
}
