// assetsync/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
pub struct JsonDiskConfig {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonFileRules {
    pub paths: Vec<String>,
    pub files: Vec<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonFilesConfig {
    pub include: JsonFileRules,
    pub exclude: JsonFileRules,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub asset_root: Option<PathBuf>,
    pub disk: Option<JsonDiskConfig>,
    pub upload_options: Option<HashMap<String, String>>,
    pub files: Option<JsonFilesConfig>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct DiskConfig {
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
}

/// One set of file selection rules (include or exclude side).
///
/// `paths` match whole directory subtrees, `files` match exact relative
/// pathnames, `extensions` match by file extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRules {
    pub paths: Vec<String>,
    pub files: Vec<String>,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub asset_root: PathBuf,
    pub include: FileRules,
    pub exclude: FileRules,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub disk: DiskConfig,
    pub finder: FinderConfig,
    pub upload_options: HashMap<String, String>,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw_json_config: RawJsonConfig = serde_json::from_str(&config_content)
            .with_context(|| {
                format!(
                    "Failed to parse JSON from config file at {}",
                    config_path.display()
                )
            })?;

        Self::from_raw(raw_json_config)
    }

    /// Validates the raw JSON config into the internal configuration.
    ///
    /// Unlike an optional storage backend, the CDN disk is the whole point of
    /// this tool, so missing or empty disk fields are a hard error.
    pub fn from_raw(raw_config: RawJsonConfig) -> Result<Self> {
        let disk_raw = raw_config
            .disk
            .context("'disk' section must be set in config.json")?;

        let disk = DiskConfig {
            bucket_name: require_disk_field(disk_raw.bucket_name, "bucket_name")?,
            region: require_disk_field(disk_raw.region, "region")?,
            access_key_id: require_disk_field(disk_raw.access_key_id, "access_key_id")?,
            secret_access_key: require_disk_field(disk_raw.secret_access_key, "secret_access_key")?,
            endpoint_url: require_disk_field(disk_raw.endpoint_url, "endpoint_url")?,
        };

        let asset_root = raw_config
            .asset_root
            .context("'asset_root' must be set in config.json")?;
        if asset_root.to_string_lossy().is_empty() {
            return Err(anyhow::anyhow!("'asset_root' cannot be empty in config.json."));
        }

        let files = raw_config.files.unwrap_or_default();

        Ok(AppConfig {
            disk,
            finder: FinderConfig {
                asset_root,
                include: normalize_rules(files.include),
                exclude: normalize_rules(files.exclude),
            },
            upload_options: raw_config.upload_options.unwrap_or_default(),
        })
    }
}

fn require_disk_field(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|s| !s.is_empty())
        .with_context(|| format!("'disk.{}' must be set and non-empty in config.json", field))
}

/// Normalizes rule entries so matching never has to care about stray
/// slashes or whether an extension was written with a leading dot.
fn normalize_rules(raw: JsonFileRules) -> FileRules {
    FileRules {
        paths: raw
            .paths
            .into_iter()
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        files: raw
            .files
            .into_iter()
            .map(|f| f.trim_matches('/').to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        extensions: raw
            .extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    }
}
