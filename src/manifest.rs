//! Desired-state manifest (`hashicups.toml`)
//!
//! ```toml
//! [[resource]]
//! type = "hashicups_order"
//! name = "edu"
//!
//! [[resource.attributes.items]]
//! quantity = 2
//! coffee = { id = 3 }
//!
//! [[data]]
//! type = "hashicups_coffees"
//! name = "menu"
//! ```

use anyhow::{Context, Result, bail};
use declarative::{Address, Document, Registry, Schema, codec};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default manifest file name, resolved against the working directory
pub const DEFAULT_MANIFEST: &str = "hashicups.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "resource")]
    pub resources: Vec<Block>,
    #[serde(default, rename = "data")]
    pub data: Vec<Block>,
}

/// One `[[resource]]` or `[[data]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub attributes: toml::Table,
}

impl Block {
    pub fn address(&self) -> Result<Address> {
        Address::parse(&format!("{}.{}", self.type_name, self.name)).with_context(|| {
            format!(
                "Invalid name '{}' for {}: names must be non-empty and contain no '.'",
                self.name, self.type_name
            )
        })
    }

    /// Attributes as a document shaped by `schema`
    pub fn document(&self, schema: &Schema) -> Result<Document> {
        let json = serde_json::to_value(&self.attributes)
            .context("Failed to convert manifest attributes")?;
        Ok(codec::decode(&json, schema)?)
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;
        log::debug!(
            "Loaded manifest {} ({} resources, {} data sources)",
            path.display(),
            manifest.resources.len(),
            manifest.data.len()
        );
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Desired documents for every `[[resource]]`, in manifest order
    pub fn desired(&self, registry: &Registry) -> Result<Vec<(Address, Document)>> {
        collect(&self.resources, "resource", move |type_name| {
            registry.resource_schema(type_name)
        })
    }

    /// Configuration documents for every `[[data]]`, in manifest order
    pub fn data_sources(&self, registry: &Registry) -> Result<Vec<(Address, Document)>> {
        collect(&self.data, "data", move |type_name| {
            registry.data_source_schema(type_name)
        })
    }
}

fn collect<'r, F>(blocks: &[Block], kind: &str, schema_of: F) -> Result<Vec<(Address, Document)>>
where
    F: Fn(&str) -> declarative::Result<&'r Schema>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(blocks.len());

    for block in blocks {
        let address = block.address()?;
        if !seen.insert(address.clone()) {
            bail!("Duplicate {kind} block {address}");
        }
        let schema = schema_of(&block.type_name)
            .with_context(|| format!("Unsupported {kind} type in {address}"))?;
        let document = block
            .document(schema)
            .with_context(|| format!("Invalid attributes in {address}"))?;
        out.push((address, document));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider;
    use declarative::{AttributePath, Validation, Value};
    use hashicups_client::MemoryBackend;
    use std::sync::Arc;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
[[resource]]
type = "hashicups_order"
name = "edu"

[[resource.attributes.items]]
quantity = 2
coffee = { id = 3 }

[[resource.attributes.items]]
quantity = 1
coffee = { id = 1 }

[[data]]
type = "hashicups_coffees"
name = "menu"
"#;

    fn registry() -> Registry {
        provider::registry(Arc::new(MemoryBackend::new())).unwrap()
    }

    #[test]
    fn test_parse_and_convert() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let registry = registry();

        let desired = manifest.desired(&registry).unwrap();
        assert_eq!(desired.len(), 1);
        let (address, document) = &desired[0];
        assert_eq!(address.to_string(), "hashicups_order.edu");

        let schema = registry.resource_schema(provider::ORDER).unwrap();
        document.validate(schema, Validation::Desired).unwrap();
        let items = document.value_or_null("items");
        let items = items.as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_object().unwrap().value_or_null("quantity"),
            Value::int64(1)
        );
        assert!(!document.contains("id"));

        let data = manifest.data_sources(&registry).unwrap();
        assert_eq!(data[0].0.to_string(), "hashicups_coffees.menu");
        assert!(data[0].1.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_MANIFEST);
        fs::write(&path, MANIFEST).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.resources.len(), 1);

        assert!(Manifest::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let manifest = Manifest::parse(
            r#"
[[resource]]
type = "hashicups_latte"
name = "x"
"#,
        )
        .unwrap();
        let err = manifest.desired(&registry()).unwrap_err();
        assert!(format!("{err:#}").contains("hashicups_latte"));
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let manifest = Manifest::parse(
            r#"
[[resource]]
type = "hashicups_order"
name = "edu"

[[resource]]
type = "hashicups_order"
name = "edu"
"#,
        )
        .unwrap();
        let err = manifest.desired(&registry()).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_type_mismatch_reports_path() {
        let manifest = Manifest::parse(
            r#"
[[resource]]
type = "hashicups_order"
name = "edu"

[[resource.attributes.items]]
quantity = "two"
coffee = { id = 3 }
"#,
        )
        .unwrap();
        let err = manifest.desired(&registry()).unwrap_err();
        let root = err.root_cause().to_string();
        let path = AttributePath::attribute("items").index(0).child("quantity");
        assert!(root.contains(&path.to_string()), "{root}");
    }

    #[test]
    fn test_unknown_block_field_rejected() {
        assert!(Manifest::parse("[[resource]]\ntype = \"a\"\nname = \"b\"\ncount = 2\n").is_err());
    }
}
