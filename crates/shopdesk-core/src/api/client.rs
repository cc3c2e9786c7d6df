//! API gateway for the store backend.
//!
//! This module provides the `ApiGateway` struct, which every screen goes
//! through to reach the backend, plus the typed product/order/auth calls
//! built on top of [`ApiGateway::dispatch`].

use std::sync::Arc;

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{SessionManager, PROFILE_PATH};
use crate::dashboard::DashboardSummary;
use crate::models::{
    Identity, ImageUpload, Order, OrderStatus, OrderStatusUpdate, Product, ProductInput,
    RegisterRequest,
};

use super::{ApiError, ApiRequest, ApiResponse, RequestBody, Transport};

// ============================================================================
// Constants
// ============================================================================

const REGISTER_PATH: &str = "/api/auth/register";
const PRODUCTS_PATH: &str = "/api/products/";
const ORDERS_PATH: &str = "/api/orders/";

/// Host-side hook for sending the user back to the login screen.
///
/// The gateway calls this after any 401, once the session has already been
/// cleared. Closures implement it, so tests can count calls.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

/// The single request-dispatch boundary.
/// Clone is cheap - everything inside is shared.
#[derive(Clone)]
pub struct ApiGateway {
    session: SessionManager,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    /// Build a gateway that sends through the session manager's transport
    pub fn new(session: SessionManager, navigator: Arc<dyn Navigator>) -> Self {
        let transport = session.transport();
        Self {
            session,
            transport,
            navigator,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send one request with the current bearer token and classify the reply.
    ///
    /// A 401 from any endpoint logs the session out, removes the persisted
    /// token and redirects to login before returning `Unauthorized`. Every
    /// other failure is returned untouched. Nothing is retried.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let request = ApiRequest::new(method, path)
            .bearer(self.session.token())
            .body(body);

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(path, error = %e, "Request failed");
            e
        })?;

        if response.is_success() {
            return Ok(response);
        }

        let err = ApiError::from_status(response.status, &response.body);
        if err.is_unauthorized() {
            warn!(path, "Unauthorized response, ending session");
            self.session.logout();
            self.navigator.redirect_to_login();
        } else {
            debug!(path, status = response.status, error = %err, "Request rejected");
        }
        Err(err)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.dispatch(Method::GET, path, RequestBody::Empty)
            .await?
            .json()
    }

    async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.dispatch(method, path, RequestBody::Json(value))
            .await?
            .json()
    }

    // ===== Account =====

    pub async fn register(&self, request: &RegisterRequest) -> Result<Identity, ApiError> {
        self.send_json(Method::POST, REGISTER_PATH, request).await
    }

    /// Fetch the signed-in user's profile
    pub async fn fetch_profile(&self) -> Result<Identity, ApiError> {
        self.get(PROFILE_PATH).await
    }

    // ===== Products =====

    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get(PRODUCTS_PATH).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.get(&product_path(id)).await
    }

    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, ApiError> {
        self.send_json(Method::POST, PRODUCTS_PATH, input).await
    }

    pub async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, ApiError> {
        self.send_json(Method::PUT, &product_path(id), input).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<(), ApiError> {
        self.dispatch(Method::DELETE, &product_path(id), RequestBody::Empty)
            .await?;
        Ok(())
    }

    /// Attach an image to a product. The backend answers with either the
    /// updated product or a bare acknowledgement; the latter maps to `None`.
    pub async fn upload_product_image(
        &self,
        id: i64,
        image: &ImageUpload,
    ) -> Result<Option<Product>, ApiError> {
        let path = format!("/api/products/{}/upload-image", id);
        let body = RequestBody::File {
            file_name: image.file_name.clone(),
            content_type: image.content_type.clone(),
            bytes: image.bytes.clone(),
        };
        let response = self.dispatch(Method::POST, &path, body).await?;
        let value: Value = match response.json() {
            Ok(value) => value,
            Err(_) => return Ok(None),
        };
        Ok(serde_json::from_value(value).ok())
    }

    // ===== Orders =====

    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get(ORDERS_PATH).await
    }

    pub async fn get_order(&self, id: i64) -> Result<Order, ApiError> {
        self.get(&order_path(id)).await
    }

    pub async fn update_order_status(
        &self,
        id: i64,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.send_json(Method::PUT, &order_path(id), &OrderStatusUpdate { status })
            .await
    }

    // ===== Dashboard =====

    /// Fetch products and orders together and summarize them
    pub async fn fetch_dashboard(&self) -> Result<DashboardSummary, ApiError> {
        let (products, orders) =
            futures::try_join!(self.list_products(), self.list_orders())?;
        Ok(DashboardSummary::from_data(&products, &orders))
    }
}

fn product_path(id: i64) -> String {
    format!("{}{}/", PRODUCTS_PATH, id)
}

fn order_path(id: i64) -> String {
    format!("{}{}/", ORDERS_PATH, id)
}
