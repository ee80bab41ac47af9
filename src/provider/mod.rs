//! HashiCups resource and data source types

pub mod coffees;
pub mod order;

use declarative::{Registry, RegistryBuilder};
use hashicups_client::CoffeeApi;
use std::sync::Arc;

pub const ORDER: &str = "hashicups_order";
pub const COFFEES: &str = "hashicups_coffees";

/// Register every HashiCups type against `api`
pub fn registry(api: Arc<dyn CoffeeApi>) -> declarative::Result<Registry> {
    let mut builder = RegistryBuilder::new();
    builder.register_resource_type(ORDER, order::schema(), order::OrderController::new(api.clone()))?;
    builder.register_data_source_type(
        COFFEES,
        coffees::schema(),
        coffees::CoffeesDataSource::new(api),
    )?;
    Ok(builder.finalize())
}
