//! The HashiCups API surface the provider depends on.

use crate::error::Result;
use crate::types::{Coffee, Order, OrderItem};

/// Remote HashiCups API.
///
/// This abstraction allows swapping the HTTP backend for the in-memory one
/// in tests and offline runs.
pub trait CoffeeApi: Send + Sync {
    /// List every coffee on the menu.
    fn list_coffees(&self) -> Result<Vec<Coffee>>;

    /// Create an order; the response carries the new id and full coffee details.
    fn create_order(&self, items: &[OrderItem]) -> Result<Order>;

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// Returns an error whose [`is_not_found`](crate::Error::is_not_found)
    /// is `true` if the order does not exist.
    fn get_order(&self, id: &str) -> Result<Order>;

    /// Replace the items of an order.
    fn update_order(&self, id: &str, items: &[OrderItem]) -> Result<Order>;

    /// Delete an order.
    fn delete_order(&self, id: &str) -> Result<()>;
}
