//! Category and location listings.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use lanboard_core::{Category, Dashboard, EntityId, Location};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct LookupRow {
    #[tabled(rename = "ID")]
    id: EntityId,
    #[tabled(rename = "Name")]
    name: String,
}

trait Lookup: Serialize {
    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
}

impl Lookup for Category {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Lookup for Location {
    fn id(&self) -> EntityId {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

fn render<T: Lookup>(items: &[Arc<T>], global: &GlobalOpts) -> Result<(), CliError> {
    let mut items = items.to_vec();
    items.sort_by(|a, b| a.name().cmp(b.name()));

    let out = output::render_list(
        &global.output,
        &items,
        |item| LookupRow {
            id: item.id(),
            name: item.name().to_owned(),
        },
        |item| item.id().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn categories(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    render(&dashboard.categories_snapshot(), global)
}

pub fn locations(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    render(&dashboard.locations_snapshot(), global)
}
