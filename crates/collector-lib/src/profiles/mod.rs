//! Profile pipeline
//!
//! Walks the inventory, reuses one client per (kind, subscription) and writes
//! each resource's flattened configuration as TSV as soon as it is fetched.

mod cache;
mod flatten;
mod kind;


pub use cache::{ClientCache, ClientFactory};
pub use flatten::flatten;
pub use kind::{ProfileKind, ServerFlavor};

use std::io::Write;
use tracing::debug;

use crate::error::Result;
use crate::inventory::Inventory;
use crate::models::PROFILE_HEADER;
use crate::observability::RunSummary;
use crate::output::{Delimiter, DelimitedWriter};

/// Write profiles for every resource in the inventory
///
/// Every provider is checked before the first remote call, so an unsupported
/// provider fails the run without touching the remote service.
pub async fn write_profiles<W: Write>(
    inventory: &Inventory,
    clients: &mut ClientCache<'_>,
    out: W,
) -> Result<RunSummary> {
    for provider in inventory.providers() {
        ProfileKind::from_provider(provider)?;
    }

    let mut writer = DelimitedWriter::new(out, Delimiter::Tab, &PROFILE_HEADER)?;
    let mut summary = RunSummary::default();

    for target in inventory.walk() {
        let kind = ProfileKind::from_provider(target.provider)?;
        let client = clients.get_or_create(kind, target.subscription)?;

        let rows = kind.extract(client.as_ref(), &target).await?;
        for row in &rows {
            writer.write_row(&row.fields())?;
        }
        debug!(
            resource_id = %target.resource_id(),
            rows = rows.len(),
            "Wrote profile"
        );
        summary.resources += 1;
    }
    writer.flush()?;

    summary.clients = clients.len();
    summary.rows = writer.rows_written();
    summary.log("profiles");
    Ok(summary)
}
