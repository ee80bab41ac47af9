//! `hashicups coffees` - list the coffee menu

use anyhow::{Context as _, Result};
use colored::Colorize;
use declarative::{Document, Registry, Value};

use super::Session;
use crate::Context;
use crate::provider::COFFEES;
use crate::ui;

/// One line of the menu
#[derive(Debug, PartialEq)]
pub struct MenuRow {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub teaser: String,
}

pub fn run(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx, false)?;
    let rows = menu(&session.registry)?;

    if !ctx.quiet {
        ui::header("HashiCups Menu");
    }
    if rows.is_empty() {
        ui::info("The menu is empty");
        return Ok(());
    }

    let width = rows.iter().map(|r| r.name.chars().count()).max().unwrap_or(0);
    for row in &rows {
        println!(
            "  {:>3}  {:<width$}  {:>7}  {}",
            row.id.to_string().dimmed(),
            row.name.bold(),
            format!("{:.2}", row.price).green(),
            row.teaser.dimmed(),
        );
    }
    Ok(())
}

/// Read the coffees data source into menu rows
pub fn menu(registry: &Registry) -> Result<Vec<MenuRow>> {
    let document = registry
        .read_data_source(COFFEES, &Document::new())
        .context("Failed to read the coffee menu")?;

    let coffees = document.value_or_null("coffees");
    if coffees.is_null() {
        return Ok(Vec::new());
    }
    coffees.as_list()?.iter().map(row).collect()
}

fn row(value: &Value) -> Result<MenuRow> {
    let coffee = value.as_object()?;
    let text = |name: &str| -> Result<String> {
        let value = coffee.value_or_null(name);
        Ok(if value.is_null() {
            String::new()
        } else {
            value.as_str()?.to_string()
        })
    };

    Ok(MenuRow {
        id: coffee.value_or_null("id").as_i64()?,
        name: text("name")?,
        price: coffee.value_or_null("price").as_f64()?,
        teaser: text("teaser")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider;
    use hashicups_client::{Error as ApiError, MemoryBackend};
    use std::sync::Arc;

    #[test]
    fn test_menu_rows() {
        let registry = provider::registry(Arc::new(MemoryBackend::new())).unwrap();
        let rows = menu(&registry).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[2].id, 3);
        assert_eq!(rows[2].name, "Nomadicano");
        assert!((rows[2].price - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_menu_error() {
        let api = Arc::new(MemoryBackend::new());
        api.inject_failure(ApiError::Unauthorized {
            message: "no token".into(),
        });
        let registry = provider::registry(api).unwrap();
        assert!(menu(&registry).is_err());
    }
}
