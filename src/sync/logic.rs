// assetsync/src/sync/logic.rs
use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::collections::HashMap;

use crate::config::AppConfig;
use crate::finder::{self, LocalAsset, versioned_path};
use crate::storage::CdnDisk;

/// Orchestrates the synchronization flow.
///
/// 1. Lists all files on the CDN disk (under the version path, if any).
/// 2. Collects the local assets selected by the configured rules.
/// 3. Uploads every asset that is new or changed, one at a time.
/// 4. Batch-deletes every remote file with no local counterpart.
pub(crate) async fn perform_sync(
    app_config: &AppConfig,
    disk: &dyn CdnDisk,
    version: Option<&str>,
) -> Result<()> {
    let files_on_cdn = disk
        .list_all_files(version.unwrap_or(""))
        .await
        .context("Failed to list files on the CDN disk")?;
    let local_files =
        finder::collect_assets(&app_config.finder).context("Failed to collect local assets")?;
    println!(
        "Found {} files on the CDN disk and {} local assets.",
        files_on_cdn.len(),
        local_files.len()
    );

    let to_delete = files_to_delete(&files_on_cdn, &local_files, version);
    let to_sync = files_to_sync(disk, &files_on_cdn, &local_files, version)
        .await
        .context("Failed to compare local assets against the CDN disk")?;

    let uploaded = upload_assets(disk, &to_sync, version, &app_config.upload_options).await;
    let deleted = delete_remote_files(disk, &to_delete).await;

    println!(
        "✅ Synchronization finished: {} of {} files uploaded, {} of {} deleted.",
        uploaded,
        to_sync.len(),
        deleted,
        to_delete.len()
    );
    Ok(())
}

/// Orchestrates the push flow: every collected local asset is uploaded,
/// whether or not it already exists on the CDN disk. Nothing is deleted.
pub(crate) async fn perform_push(
    app_config: &AppConfig,
    disk: &dyn CdnDisk,
    version: Option<&str>,
) -> Result<()> {
    let local_files =
        finder::collect_assets(&app_config.finder).context("Failed to collect local assets")?;
    println!("Pushing {} local assets to the CDN disk.", local_files.len());

    let uploaded = upload_assets(disk, &local_files, version, &app_config.upload_options).await;

    println!(
        "✅ Push finished: {} of {} files uploaded.",
        uploaded,
        local_files.len()
    );
    Ok(())
}

/// Orchestrates the empty flow: deletes every file on the CDN disk.
pub(crate) async fn perform_empty(disk: &dyn CdnDisk) -> Result<()> {
    let files_on_cdn = disk
        .list_all_files("")
        .await
        .context("Failed to list files on the CDN disk")?;
    if files_on_cdn.is_empty() {
        println!("CDN disk is already empty.");
        return Ok(());
    }

    println!("Deleting {} files from the CDN disk.", files_on_cdn.len());
    let deleted = delete_remote_files(disk, &files_on_cdn).await;

    println!(
        "✅ Empty finished: {} of {} files deleted.",
        deleted,
        files_on_cdn.len()
    );
    Ok(())
}

/// Decides which local assets must be uploaded.
///
/// A local asset is scheduled when its (optionally version-prefixed)
/// relative path is absent from the CDN listing, when the remote size
/// differs from the local size, or when the remote MD5 differs from the
/// local MD5. The checksum comparison only runs when the sizes already
/// match; a size mismatch schedules the file without reading any contents.
pub async fn files_to_sync(
    disk: &dyn CdnDisk,
    files_on_cdn: &[String],
    local_files: &[LocalAsset],
    version: Option<&str>,
) -> Result<Vec<LocalAsset>> {
    let mut scheduled = Vec::new();

    for local_file in local_files {
        let remote_path = prefixed_path(local_file, version);

        if !files_on_cdn.contains(&remote_path) {
            scheduled.push(local_file.clone());
            continue;
        }

        let size_on_cdn = disk.size(&remote_path).await?;
        if size_on_cdn != local_file.size {
            scheduled.push(local_file.clone());
            continue;
        }

        let contents_on_cdn = disk.get(&remote_path).await?;
        let md5_on_cdn = hex::encode(Md5::digest(&contents_on_cdn));
        if md5_on_cdn != local_file.md5()? {
            scheduled.push(local_file.clone());
        }
    }

    Ok(scheduled)
}

/// Decides which remote files must be deleted: every CDN listing entry that
/// matches no (optionally version-prefixed) local relative path.
pub fn files_to_delete(
    files_on_cdn: &[String],
    local_files: &[LocalAsset],
    version: Option<&str>,
) -> Vec<String> {
    let local_paths: Vec<String> = local_files
        .iter()
        .map(|local_file| prefixed_path(local_file, version))
        .collect();

    files_on_cdn
        .iter()
        .filter(|file_on_cdn| !local_paths.contains(file_on_cdn))
        .cloned()
        .collect()
}

fn prefixed_path(local_file: &LocalAsset, version: Option<&str>) -> String {
    match version {
        Some(v) => versioned_path(&local_file.relative_path, v),
        None => local_file.relative_path.clone(),
    }
}

/// Uploads the scheduled assets sequentially, logging each outcome. A failed
/// upload is reported and the run continues with the next file.
async fn upload_assets(
    disk: &dyn CdnDisk,
    files: &[LocalAsset],
    version: Option<&str>,
    upload_options: &HashMap<String, String>,
) -> usize {
    let mut uploaded = 0;

    for file in files {
        let remote_path = prefixed_path(file, version);
        let (dir, name) = match remote_path.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", remote_path.as_str()),
        };

        match disk
            .put_file_as(dir, &file.absolute_path, name, upload_options)
            .await
        {
            Ok(()) => {
                println!("✓ Successfully uploaded: {}", remote_path);
                uploaded += 1;
            }
            Err(e) => eprintln!("❌ Problem uploading {}: {:?}", remote_path, e),
        }
    }

    uploaded
}

/// Issues one batch delete for the scheduled paths. On success each deleted
/// path is logged; a failed batch is reported as an error but does not fail
/// the run, consistent with per-file upload failures.
async fn delete_remote_files(disk: &dyn CdnDisk, paths: &[String]) -> usize {
    if paths.is_empty() {
        return 0;
    }

    match disk.delete(paths).await {
        Ok(()) => {
            for path in paths {
                println!("✓ Successfully deleted: {}", path);
            }
            paths.len()
        }
        Err(e) => {
            eprintln!(
                "❌ Problem deleting {} files from the CDN disk: {:?}",
                paths.len(),
                e
            );
            0
        }
    }
}
