// assetsync/src/storage/mod.rs
pub(crate) mod s3;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// File operations exposed by a CDN disk.
///
/// Mirrors the uniform file-operations interface of the storage backend:
/// listing, size/content lookup for comparison, uploads and batch deletes.
#[async_trait]
pub trait CdnDisk: Send + Sync {
    /// Lists every file on the disk under `prefix` (empty prefix lists the
    /// whole disk). Returned paths are full object paths.
    async fn list_all_files(&self, prefix: &str) -> Result<Vec<String>>;

    /// Size in bytes of the remote file at `path`.
    async fn size(&self, path: &str) -> Result<u64>;

    /// Full contents of the remote file at `path`.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Uploads the local file at `local_file` as `name` under the remote
    /// directory `dir`, applying the configured upload options verbatim.
    async fn put_file_as(
        &self,
        dir: &str,
        local_file: &Path,
        name: &str,
        options: &HashMap<String, String>,
    ) -> Result<()>;

    /// Deletes all `paths` in a single batch call.
    async fn delete(&self, paths: &[String]) -> Result<()>;
}
