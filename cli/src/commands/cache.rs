use anyhow::{Context, Result};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use crate::cache::{CURRENT_CACHES, CacheController, Fetcher};

use super::helpers::format_size;

/// Install + activate: precache the core assets (all-or-nothing) and purge
/// caches left over from previous versions.
pub(crate) async fn cmd_sync<F: Fetcher>(controller: &CacheController<F>) -> Result<()> {
    let count = controller
        .install()
        .await
        .context("Precache failed; the previously cached version stays active")?;
    println!("Precached {count} core assets from {}", controller.origin());

    let purged = controller.activate()?;
    for name in &purged {
        println!("Purged stale cache {name}");
    }
    if purged.is_empty() {
        println!("No stale caches to purge");
    }
    Ok(())
}

pub(crate) fn cmd_cache_status<F: Fetcher>(
    controller: &CacheController<F>,
    json: bool,
) -> Result<()> {
    let on_disk = controller.storage().cache_names()?;

    #[derive(Tabled, serde::Serialize)]
    struct CacheRow {
        #[tabled(rename = "Cache")]
        name: String,
        #[tabled(rename = "Entries")]
        entries: usize,
        #[tabled(rename = "Size")]
        size: String,
        #[tabled(rename = "State")]
        state: String,
    }

    let mut rows = Vec::new();
    for name in CURRENT_CACHES {
        let (entries, bytes) = controller.storage().stats(name)?;
        rows.push(CacheRow {
            name: name.to_string(),
            entries,
            size: format_size(bytes),
            state: "current".to_string(),
        });
    }
    for name in on_disk {
        if !CURRENT_CACHES.contains(&name.as_str()) {
            let (entries, bytes) = controller.storage().stats(&name)?;
            rows.push(CacheRow {
                name,
                entries,
                size: format_size(bytes),
                state: "stale".to_string(),
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_cache_clear<F: Fetcher>(controller: &CacheController<F>) -> Result<()> {
    let names = controller.storage().cache_names()?;
    if names.is_empty() {
        println!("No caches on disk");
        return Ok(());
    }
    for name in names {
        controller.storage().delete_cache(&name)?;
        println!("Deleted cache {name}");
    }
    Ok(())
}
