//! In-process HashiCups backend.
//!
//! Serves the stock HashiCups menu and keeps orders in memory. Failures can
//! be injected to exercise error paths without a network.

use crate::api::CoffeeApi;
use crate::error::{Error, Result};
use crate::types::{Coffee, Ingredient, Order, OrderItem};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Inner {
    coffees: Vec<Coffee>,
    orders: BTreeMap<i64, Order>,
    next_id: i64,
    failures: VecDeque<Error>,
    calls: usize,
}

/// In-memory implementation of [`CoffeeApi`].
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Backend serving the stock HashiCups menu.
    pub fn new() -> Self {
        Self::with_coffees(stock_menu())
    }

    /// Backend serving a custom menu.
    pub fn with_coffees(coffees: Vec<Coffee>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                coffees,
                next_id: 1,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next API call fail with `error`.
    pub fn inject_failure(&self, error: Error) {
        self.lock().failures.push_back(error);
    }

    /// Snapshot of stored orders.
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.values().cloned().collect()
    }

    /// Store an order as-is, bypassing validation (simulates out-of-band edits).
    pub fn put_order(&self, order: Order) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(order.id + 1);
        inner.orders.insert(order.id, order);
    }

    /// Drop an order without going through the API (simulates out-of-band deletes).
    pub fn forget_order(&self, id: i64) -> Option<Order> {
        self.lock().orders.remove(&id)
    }

    /// Number of API calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }
}

impl Inner {
    fn begin(&mut self) -> Result<()> {
        self.calls += 1;
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Expand coffee references to full menu entries.
    fn expand(&self, items: &[OrderItem]) -> Result<Vec<OrderItem>> {
        items
            .iter()
            .map(|item| {
                let coffee = self
                    .coffees
                    .iter()
                    .find(|c| c.id == item.coffee.id)
                    .ok_or_else(|| Error::Http {
                        status: 422,
                        message: format!("coffee {} is not on the menu", item.coffee.id),
                    })?;
                if item.quantity < 1 {
                    return Err(Error::Http {
                        status: 422,
                        message: format!("quantity must be positive, got {}", item.quantity),
                    });
                }
                Ok(OrderItem {
                    coffee: coffee.clone(),
                    quantity: item.quantity,
                })
            })
            .collect()
    }

    fn order_mut(&mut self, id: &str) -> Result<&mut Order> {
        let not_found = || Error::NotFound {
            entity: "order",
            id: id.to_string(),
        };
        let key: i64 = id.parse().map_err(|_| not_found())?;
        self.orders.get_mut(&key).ok_or_else(not_found)
    }
}

impl CoffeeApi for MemoryBackend {
    fn list_coffees(&self) -> Result<Vec<Coffee>> {
        let mut inner = self.lock();
        inner.begin()?;
        Ok(inner.coffees.clone())
    }

    fn create_order(&self, items: &[OrderItem]) -> Result<Order> {
        let mut inner = self.lock();
        inner.begin()?;
        let items = inner.expand(items)?;
        let id = inner.next_id;
        inner.next_id += 1;

        let order = Order { id, items };
        inner.orders.insert(id, order.clone());
        log::debug!("memory backend: created order {id}");
        Ok(order)
    }

    fn get_order(&self, id: &str) -> Result<Order> {
        let mut inner = self.lock();
        inner.begin()?;
        inner.order_mut(id).map(|order| order.clone())
    }

    fn update_order(&self, id: &str, items: &[OrderItem]) -> Result<Order> {
        let mut inner = self.lock();
        inner.begin()?;
        let items = inner.expand(items)?;
        let order = inner.order_mut(id)?;
        order.items = items;
        Ok(order.clone())
    }

    fn delete_order(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.begin()?;
        let key = inner.order_mut(id)?.id;
        inner.orders.remove(&key);
        log::debug!("memory backend: deleted order {id}");
        Ok(())
    }
}

fn coffee(id: i64, name: &str, teaser: &str, price: f64, image: &str, ingredients: &[i64]) -> Coffee {
    Coffee {
        id,
        name: name.to_string(),
        teaser: teaser.to_string(),
        collection: "Origins".to_string(),
        origin: "Summer 2013".to_string(),
        color: "#1FA7EE".to_string(),
        description: String::new(),
        price,
        image: image.to_string(),
        ingredients: ingredients.iter().map(|&id| Ingredient { id }).collect(),
    }
}

/// The menu a fresh HashiCups deployment serves.
pub fn stock_menu() -> Vec<Coffee> {
    vec![
        coffee(
            1,
            "Packer Spiced Latte",
            "Packed with goodness to spice up your images",
            350.0,
            "/packer.png",
            &[1, 2, 4],
        ),
        coffee(
            2,
            "Vaulatte",
            "Nothing gives you a safe and secure feeling like a Vaulatte",
            200.0,
            "/vault.png",
            &[1, 2],
        ),
        coffee(
            3,
            "Nomadicano",
            "Drink one today and you will want to schedule another",
            150.0,
            "/nomad.png",
            &[1, 3],
        ),
        coffee(
            4,
            "Terraspresso",
            "Nothing kickstarts your day like a provision of Terraspresso",
            150.0,
            "/terraform.png",
            &[1],
        ),
        coffee(
            5,
            "Vagrante espresso",
            "Stdin is not a tty",
            200.0,
            "/vagrant.png",
            &[1],
        ),
        coffee(
            6,
            "Connectaccino",
            "Discover the wonders of our meshy service",
            250.0,
            "/consul.png",
            &[1, 5],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_crud() {
        let api = MemoryBackend::new();

        let order = api.create_order(&[OrderItem::new(3, 2)]).unwrap();
        assert_eq!(order.id, 1);
        assert_eq!(order.items[0].coffee.name, "Nomadicano");
        assert_eq!(order.items[0].quantity, 2);

        let order = api
            .update_order("1", &[OrderItem::new(3, 2), OrderItem::new(1, 1)])
            .unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(api.get_order("1").unwrap(), order);

        api.delete_order("1").unwrap();
        assert!(api.get_order("1").unwrap_err().is_not_found());
        assert!(api.orders().is_empty());
    }

    #[test]
    fn test_unknown_coffee_rejected() {
        let api = MemoryBackend::new();
        let err = api.create_order(&[OrderItem::new(99, 1)]).unwrap_err();
        assert!(matches!(err, Error::Http { status: 422, .. }));
        assert!(api.orders().is_empty());
    }

    #[test]
    fn test_injected_failure_is_consumed_once() {
        let api = MemoryBackend::new();
        api.inject_failure(Error::Network {
            message: "connection reset".into(),
        });

        assert!(api.list_coffees().unwrap_err().is_retryable());
        assert_eq!(api.list_coffees().unwrap().len(), 6);
        assert_eq!(api.calls(), 2);
    }

    #[test]
    fn test_out_of_band_changes() {
        let api = MemoryBackend::new();
        let order = api.create_order(&[OrderItem::new(2, 1)]).unwrap();

        assert!(api.forget_order(order.id).is_some());
        assert!(api.get_order(&order.id.to_string()).unwrap_err().is_not_found());

        api.put_order(Order {
            id: 10,
            items: vec![OrderItem::new(4, 3)],
        });
        assert_eq!(api.create_order(&[OrderItem::new(1, 1)]).unwrap().id, 11);
    }

    #[test]
    fn test_non_numeric_id_is_not_found() {
        let api = MemoryBackend::new();
        assert!(api.get_order("abc").unwrap_err().is_not_found());
    }
}
