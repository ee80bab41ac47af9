//! HashiCups API entities and client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A coffee on the HashiCups menu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coffee {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub teaser: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Coffee {
    /// A coffee reference carrying only its id, as sent in order requests
    pub fn reference(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Ingredient reference of a coffee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "ingredient_id")]
    pub id: i64,
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub coffee: Coffee,
    pub quantity: i64,
}

impl OrderItem {
    pub fn new(coffee_id: i64, quantity: i64) -> Self {
        Self {
            coffee: Coffee::reference(coffee_id),
            quantity,
        }
    }
}

/// An order; `id` is assigned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Sign-in credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /signin`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AuthResponse {
    #[serde(rename = "UserID", default)]
    pub user_id: i64,
    #[serde(rename = "Username", default)]
    pub username: String,
    pub token: String,
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    ///
    /// Always within `0..=max_delay`, whatever the backoff factor.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        if delay.is_nan() {
            return self.max_delay;
        }
        let capped = delay.clamp(0.0, self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}
