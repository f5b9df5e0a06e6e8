// assetsync/src/sync/mod.rs
mod logic;

pub use logic::{files_to_delete, files_to_sync};

use anyhow::Result;

use crate::config::AppConfig;
use crate::storage::CdnDisk;

/// Public entry point for the sync process: three-way diff against the CDN
/// disk, upload changed/new assets, delete orphaned remote files.
pub async fn run_sync_flow(
    app_config: &AppConfig,
    disk: &dyn CdnDisk,
    version: Option<&str>,
) -> Result<()> {
    logic::perform_sync(app_config, disk, version).await
}

/// Public entry point for the push process: uploads every collected local
/// asset unconditionally, without diffing or deleting.
pub async fn run_push_flow(
    app_config: &AppConfig,
    disk: &dyn CdnDisk,
    version: Option<&str>,
) -> Result<()> {
    logic::perform_push(app_config, disk, version).await
}

/// Public entry point for the empty process: deletes every file on the
/// CDN disk.
pub async fn run_empty_flow(disk: &dyn CdnDisk) -> Result<()> {
    logic::perform_empty(disk).await
}
