//! # HashiCups client
//!
//! Blocking client for the HashiCups coffee ordering API.
//!
//! - [`CoffeeApi`]: the operations a provider needs (menu, order CRUD)
//! - [`HttpBackend`]: talks to a HashiCups deployment over HTTP
//! - [`MemoryBackend`]: in-process implementation for tests and offline runs
//!
//! Transient failures (network errors, 5xx responses) are retried with
//! exponential backoff; see [`RetryConfig`].
//!
//! ```no_run
//! use hashicups_client::{CoffeeApi, Credentials, HttpBackend, OrderItem};
//!
//! let api = HttpBackend::new(
//!     "http://localhost:19090",
//!     Some(Credentials {
//!         username: "education".into(),
//!         password: "test123".into(),
//!     }),
//! );
//! let order = api.create_order(&[OrderItem::new(3, 2)]).unwrap();
//! println!("created order {}", order.id);
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;
pub mod types;

pub use api::CoffeeApi;
pub use error::{Error, ErrorCategory, Result};
pub use http::{DEFAULT_HOST, HttpBackend};
pub use memory::{MemoryBackend, stock_menu};
pub use retry::{LogCallback, NoCallback, RetryCallback, with_retry};
pub use types::{Coffee, Credentials, Ingredient, Order, OrderItem, RetryConfig};
