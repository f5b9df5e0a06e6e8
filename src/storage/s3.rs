// assetsync/src/storage/s3.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::primitives::ByteStream;
use s3::types::{Delete, ObjectIdentifier};
use std::collections::HashMap;
use std::path::Path;

use crate::config::DiskConfig;
use crate::storage::CdnDisk;

/// CDN disk backed by an S3-compatible object storage service
/// (AWS S3, DigitalOcean Spaces, MinIO, ...).
pub struct S3Disk {
    client: s3::Client,
    bucket: String,
}

impl S3Disk {
    /// Builds the S3 client once from the disk configuration.
    pub async fn connect(disk_config: &DiskConfig) -> Result<Self> {
        let sdk_config = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .endpoint_url(&disk_config.endpoint_url)
            .region(Region::new(disk_config.region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &disk_config.access_key_id,
                &disk_config.secret_access_key,
                None,     // session_token
                None,     // expiry
                "Static", // provider_name
            ))
            .load()
            .await;

        Ok(S3Disk {
            client: s3::Client::new(&sdk_config),
            bucket: disk_config.bucket_name.clone(),
        })
    }
}

/// Joins a remote directory and file name into an object key.
pub(crate) fn join_key(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[async_trait]
impl CdnDisk for S3Disk {
    async fn list_all_files(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if !prefix.is_empty() {
                request = request.prefix(format!("{}/", prefix.trim_matches('/')));
            }
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request.send().await.with_context(|| {
                format!(
                    "Failed to list objects in bucket {} with prefix '{}'",
                    self.bucket, prefix
                )
            })?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn size(&self, path: &str) -> Result<u64> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .with_context(|| {
                format!("Failed to get size of s3://{}/{}", self.bucket, path)
            })?;

        let content_length = response.content_length().with_context(|| {
            format!(
                "HeadObject for s3://{}/{} returned no content length",
                self.bucket, path
            )
        })?;
        u64::try_from(content_length).with_context(|| {
            format!(
                "HeadObject for s3://{}/{} returned a negative content length",
                self.bucket, path
            )
        })
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .with_context(|| format!("Failed to get object s3://{}/{}", self.bucket, path))?;

        let bytes = response.body.collect().await.with_context(|| {
            format!(
                "Failed to read body of object s3://{}/{}",
                self.bucket, path
            )
        })?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn put_file_as(
        &self,
        dir: &str,
        local_file: &Path,
        name: &str,
        options: &HashMap<String, String>,
    ) -> Result<()> {
        let key = join_key(dir, name);

        let body = ByteStream::from_path(local_file).await.with_context(|| {
            format!(
                "Failed to create ByteStream from file: {}",
                local_file.display()
            )
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body);

        // Known S3 parameters map to typed builder calls, anything else is
        // passed through as user-defined object metadata.
        for (option, value) in options {
            request = match option.as_str() {
                "acl" => request.acl(s3::types::ObjectCannedAcl::from(value.as_str())),
                "cache_control" => request.cache_control(value),
                "content_type" => request.content_type(value),
                "content_disposition" => request.content_disposition(value),
                "content_encoding" => request.content_encoding(value),
                _ => request.metadata(option, value),
            };
        }

        request.send().await.with_context(|| {
            format!(
                "Failed to upload file {} to s3://{}/{}",
                local_file.display(),
                self.bucket,
                key
            )
        })?;
        Ok(())
    }

    async fn delete(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut delete = Delete::builder().quiet(false);
        for path in paths {
            let object = ObjectIdentifier::builder()
                .key(path)
                .build()
                .with_context(|| format!("Invalid object key for deletion: {}", path))?;
            delete = delete.objects(object);
        }
        let delete = delete
            .build()
            .context("Failed to build batch delete request")?;

        let response = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to batch-delete {} objects from bucket {}",
                    paths.len(),
                    self.bucket
                )
            })?;

        // The batch call succeeds as a whole even when individual keys fail;
        // surface those instead of dropping them.
        let errors = response.errors();
        if !errors.is_empty() {
            let details: Vec<String> = errors
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.key().unwrap_or("<unknown key>"),
                        e.message().unwrap_or("<no message>")
                    )
                })
                .collect();
            return Err(anyhow::anyhow!(
                "Batch delete reported {} failed objects: {}",
                errors.len(),
                details.join("; ")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("js", "app.js"), "js/app.js");
        assert_eq!(join_key("", "app.js"), "app.js");
        assert_eq!(join_key("/v1/js/", "app.js"), "v1/js/app.js");
    }
}
