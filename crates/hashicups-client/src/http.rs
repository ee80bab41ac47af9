//! HTTP backend for the HashiCups REST API.
//!
//! Orders require a token obtained from `POST /signin`; the backend signs
//! in lazily on the first order call and reuses the token afterwards. The
//! coffee menu is public.
//!
//! Idempotent calls are retried on transient failures. Creating an order is
//! not: a create whose response was lost must be recovered by reading the
//! order back, never by posting it again.

use crate::api::CoffeeApi;
use crate::error::{Error, Result};
use crate::retry::{LogCallback, with_retry};
use crate::types::{AuthResponse, Coffee, Credentials, Order, OrderItem, RetryConfig};
use std::sync::{Mutex, PoisonError};

/// Default API address of a local HashiCups deployment.
pub const DEFAULT_HOST: &str = "http://localhost:19090";

/// Blocking HashiCups API client.
pub struct HttpBackend {
    agent: ureq::Agent,
    host: String,
    credentials: Option<Credentials>,
    retry: RetryConfig,
    token: Mutex<Option<String>>,
}

impl HttpBackend {
    /// Create a backend for `host`; credentials are only needed for orders.
    pub fn new(host: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            host: host.into().trim_end_matches('/').to_string(),
            credentials,
            retry: RetryConfig::default(),
            token: Mutex::new(None),
        }
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the API host.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    fn order_url(&self, id: &str) -> String {
        self.url(&format!("/orders/{id}"))
    }

    fn send<T>(&self, operation: impl FnMut() -> Result<T>) -> Result<T> {
        with_retry(&self.retry, Some(&LogCallback), operation)
    }

    /// Send a non-idempotent request exactly once.
    fn send_once<T>(&self, operation: impl FnMut() -> Result<T>) -> Result<T> {
        with_retry(&RetryConfig::no_retry(), None, operation)
    }

    /// Token for authenticated calls, signing in if needed.
    fn token(&self) -> Result<String> {
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }

        let credentials = self.credentials.as_ref().ok_or_else(|| Error::Unauthorized {
            message: "username and password are required for order operations".to_string(),
        })?;
        let auth = self.sign_in(credentials)?;
        log::debug!("signed in as {} (user {})", auth.username, auth.user_id);

        *token = Some(auth.token.clone());
        Ok(auth.token)
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let url = self.url("/signin");
        log::debug!("POST {url}");
        self.send(|| Ok(self.agent.post(&url).send_json(credentials)?.body_mut().read_json()?))
    }
}

/// Map a 404 on an order URL to a not-found error.
fn order_not_found(id: &str) -> impl Fn(Error) -> Error + '_ {
    move |err| match err {
        Error::Http { status: 404, .. } => Error::NotFound {
            entity: "order",
            id: id.to_string(),
        },
        other => other,
    }
}

impl CoffeeApi for HttpBackend {
    fn list_coffees(&self) -> Result<Vec<Coffee>> {
        let url = self.url("/coffees");
        log::debug!("GET {url}");
        self.send(|| Ok(self.agent.get(&url).call()?.body_mut().read_json()?))
    }

    fn create_order(&self, items: &[OrderItem]) -> Result<Order> {
        let token = self.token()?;
        let url = self.url("/orders");
        log::debug!("POST {url} ({} item(s))", items.len());
        self.send_once(|| {
            Ok(self
                .agent
                .post(&url)
                .header("Authorization", token.as_str())
                .send_json(items)?
                .body_mut()
                .read_json()?)
        })
    }

    fn get_order(&self, id: &str) -> Result<Order> {
        let token = self.token()?;
        let url = self.order_url(id);
        log::debug!("GET {url}");
        self.send(|| {
            Ok(self
                .agent
                .get(&url)
                .header("Authorization", token.as_str())
                .call()?
                .body_mut()
                .read_json()?)
        })
        .map_err(order_not_found(id))
    }

    fn update_order(&self, id: &str, items: &[OrderItem]) -> Result<Order> {
        let token = self.token()?;
        let url = self.order_url(id);
        log::debug!("PUT {url} ({} item(s))", items.len());
        self.send(|| {
            Ok(self
                .agent
                .put(&url)
                .header("Authorization", token.as_str())
                .send_json(items)?
                .body_mut()
                .read_json()?)
        })
        .map_err(order_not_found(id))
    }

    fn delete_order(&self, id: &str) -> Result<()> {
        let token = self.token()?;
        let url = self.order_url(id);
        log::debug!("DELETE {url}");
        self.send(|| {
            self.agent
                .delete(&url)
                .header("Authorization", token.as_str())
                .call()?;
            Ok(())
        })
        .map_err(order_not_found(id))
    }
}
