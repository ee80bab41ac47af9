//! `hashicups_order` resource
//!
//! An order is a list of items, each referencing a coffee by id with a
//! quantity. Coffee details are computed from the menu by the API.

use anyhow::{Context, Result};
use chrono::Utc;
use declarative::{Attribute, AttributeType, ChangeSet, Document, ResourceController, Schema, Value};
use hashicups_client::{CoffeeApi, Coffee, Order, OrderItem};
use std::sync::Arc;

pub fn schema() -> Schema {
    Schema::new()
        .with_description("Manages an order.")
        .with_attribute(
            "id",
            Attribute::computed(AttributeType::string())
                .immutable()
                .with_description("Numeric identifier of the order."),
        )
        .with_attribute(
            "last_updated",
            Attribute::computed(AttributeType::string())
                .with_description("Timestamp of the last remote change to the order."),
        )
        .with_attribute(
            "items",
            Attribute::required(AttributeType::list(AttributeType::object(item_schema())))
                .with_description("List of items in the order."),
        )
}

fn item_schema() -> Schema {
    Schema::new()
        .with_attribute(
            "quantity",
            Attribute::required(AttributeType::int64())
                .with_description("Count of this item in the order."),
        )
        .with_attribute(
            "coffee",
            Attribute::required(AttributeType::object(coffee_schema())),
        )
}

fn coffee_schema() -> Schema {
    Schema::new()
        .with_attribute(
            "id",
            Attribute::required(AttributeType::int64())
                .with_description("Numeric identifier of the coffee."),
        )
        .with_attribute("name", Attribute::computed(AttributeType::string()))
        .with_attribute("teaser", Attribute::computed(AttributeType::string()))
        .with_attribute("description", Attribute::computed(AttributeType::string()))
        .with_attribute("price", Attribute::computed(AttributeType::float64()))
        .with_attribute("image", Attribute::computed(AttributeType::string()))
}

/// Remote CRUD for orders
pub struct OrderController {
    api: Arc<dyn CoffeeApi>,
}

impl OrderController {
    pub fn new(api: Arc<dyn CoffeeApi>) -> Self {
        Self { api }
    }
}

impl ResourceController for OrderController {
    fn create(&self, planned: &Document) -> Result<Document> {
        let items = order_items(planned)?;
        let order = self.api.create_order(&items)?;
        log::info!("Created order {}", order.id);
        Ok(order_document(&order).with("last_updated", timestamp()))
    }

    fn read(&self, id: &str, _current: &Document) -> Result<Option<Document>> {
        match self.api.get_order(id) {
            Ok(order) => Ok(Some(order_document(&order))),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Unable to read order {id}")),
        }
    }

    fn update(&self, id: &str, planned: &Document, _changes: &ChangeSet) -> Result<Document> {
        let items = order_items(planned)?;
        let order = self.api.update_order(id, &items)?;
        log::info!("Updated order {id}");
        Ok(order_document(&order).with("last_updated", timestamp()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        match self.api.delete_order(id) {
            Err(err) if err.is_not_found() => {
                log::warn!("Order {id} was already deleted");
                Ok(())
            }
            other => Ok(other?),
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Items to send to the API; only coffee ids and quantities are meaningful
fn order_items(planned: &Document) -> Result<Vec<OrderItem>> {
    planned
        .value_or_null("items")
        .as_list()?
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let item = item.as_object()?;
            let coffee = item.value_or_null("coffee");
            let coffee_id = coffee
                .as_object()?
                .value_or_null("id")
                .as_i64()
                .with_context(|| format!("items[{index}].coffee.id"))?;
            let quantity = item
                .value_or_null("quantity")
                .as_i64()
                .with_context(|| format!("items[{index}].quantity"))?;
            Ok(OrderItem::new(coffee_id, quantity))
        })
        .collect()
}

/// State document for an API order, without `last_updated`
fn order_document(order: &Order) -> Document {
    let items = order.items.iter().map(|item| {
        Value::object(
            Document::new()
                .with("quantity", item.quantity)
                .with("coffee", coffee_document(&item.coffee)),
        )
    });

    Document::new()
        .with("id", order.id.to_string())
        .with("items", Value::list(items))
}

fn coffee_document(coffee: &Coffee) -> Document {
    Document::new()
        .with("id", coffee.id)
        .with("name", coffee.name.as_str())
        .with("teaser", coffee.teaser.as_str())
        .with("description", coffee.description.as_str())
        .with("price", coffee.price)
        .with("image", coffee.image.as_str())
}
