//! `hashicups_coffees` data source: the coffee menu

use anyhow::Result;
use declarative::{Attribute, AttributeType, DataSourceController, Document, Schema, Value};
use hashicups_client::{Coffee, CoffeeApi};
use std::sync::Arc;

pub fn schema() -> Schema {
    Schema::new()
        .with_description("Fetches the list of coffees.")
        .with_attribute(
            "coffees",
            Attribute::computed(AttributeType::list(AttributeType::object(coffee_schema()))),
        )
}

fn coffee_schema() -> Schema {
    Schema::new()
        .with_attribute("id", Attribute::computed(AttributeType::int64()))
        .with_attribute("name", Attribute::computed(AttributeType::string()))
        .with_attribute("teaser", Attribute::computed(AttributeType::string()))
        .with_attribute("description", Attribute::computed(AttributeType::string()))
        .with_attribute("price", Attribute::computed(AttributeType::float64()))
        .with_attribute("image", Attribute::computed(AttributeType::string()))
        .with_attribute(
            "ingredients",
            Attribute::computed(AttributeType::list(AttributeType::object(
                Schema::new().with_attribute("id", Attribute::computed(AttributeType::int64())),
            ))),
        )
}

pub struct CoffeesDataSource {
    api: Arc<dyn CoffeeApi>,
}

impl CoffeesDataSource {
    pub fn new(api: Arc<dyn CoffeeApi>) -> Self {
        Self { api }
    }
}

impl DataSourceController for CoffeesDataSource {
    fn read(&self, _config: &Document) -> Result<Document> {
        let coffees = self.api.list_coffees()?;
        log::debug!("Read {} coffees", coffees.len());
        Ok(Document::new().with(
            "coffees",
            Value::list(coffees.iter().map(|c| Value::object(coffee_document(c)))),
        ))
    }
}

fn coffee_document(coffee: &Coffee) -> Document {
    let ingredients = coffee
        .ingredients
        .iter()
        .map(|i| Value::object(Document::new().with("id", i.id)));

    Document::new()
        .with("id", coffee.id)
        .with("name", coffee.name.as_str())
        .with("teaser", coffee.teaser.as_str())
        .with("description", coffee.description.as_str())
        .with("price", coffee.price)
        .with("image", coffee.image.as_str())
        .with("ingredients", Value::list(ingredients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{RegistryBuilder, UNKNOWN_SENTINEL, codec};
    use hashicups_client::{Error as ApiError, MemoryBackend};

    fn registry(api: Arc<MemoryBackend>) -> declarative::Registry {
        let mut builder = RegistryBuilder::new();
        builder
            .register_data_source_type("hashicups_coffees", schema(), CoffeesDataSource::new(api))
            .unwrap();
        builder.finalize()
    }

    #[test]
    fn test_read_menu() {
        let registry = registry(Arc::new(MemoryBackend::new()));
        let doc = registry
            .read_data_source("hashicups_coffees", &Document::new())
            .unwrap();

        let coffees = doc.value_or_null("coffees");
        let coffees = coffees.as_list().unwrap();
        assert_eq!(coffees.len(), 6);

        let packer = coffees[0].as_object().unwrap();
        assert_eq!(packer.value_or_null("name"), Value::string("Packer Spiced Latte"));
        assert_eq!(
            packer.value_or_null("ingredients").as_list().unwrap().len(),
            3
        );

        let json = codec::encode(&doc, &schema()).unwrap();
        assert!(!json.to_string().contains(UNKNOWN_SENTINEL));
    }

    #[test]
    fn test_config_cannot_set_computed() {
        let registry = registry(Arc::new(MemoryBackend::new()));
        let config = Document::new().with("coffees", Value::list([]));
        assert!(registry.read_data_source("hashicups_coffees", &config).is_err());
    }

    #[test]
    fn test_api_error_is_reported() {
        let api = Arc::new(MemoryBackend::new());
        api.inject_failure(ApiError::Http {
            status: 500,
            message: "boom".into(),
        });
        let registry = registry(api);
        let err = registry
            .read_data_source("hashicups_coffees", &Document::new())
            .unwrap_err();
        assert!(matches!(err, declarative::Error::RemoteOperation { .. }));
    }
}
