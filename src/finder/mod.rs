// assetsync/src/finder/mod.rs
use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{FileRules, FinderConfig};

/// A local file selected for synchronization.
#[derive(Debug, Clone)]
pub struct LocalAsset {
    /// Path relative to the asset root, forward-slash separated.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size: u64,
}

impl LocalAsset {
    /// Computes the MD5 checksum of the file contents, reading the file at
    /// call time. Read errors propagate as fatal.
    pub fn md5(&self) -> Result<String> {
        let contents = fs::read(&self.absolute_path).with_context(|| {
            format!(
                "Failed to read local asset for checksum: {}",
                self.absolute_path.display()
            )
        })?;
        Ok(hex::encode(Md5::digest(&contents)))
    }
}

/// Prepends a version path to a relative asset path, e.g.
/// `versioned_path("js/app.js", "v1")` -> `"v1/js/app.js"`.
pub fn versioned_path(relative_path: &str, version: &str) -> String {
    format!("{}/{}", version.trim_matches('/'), relative_path)
}

/// Walks the configured asset root and collects all files selected by the
/// include/exclude rules, sorted by relative path.
pub fn collect_assets(config: &FinderConfig) -> Result<Vec<LocalAsset>> {
    if !config.asset_root.is_dir() {
        return Err(anyhow::anyhow!(
            "Asset root is not a directory: {}",
            config.asset_root.display()
        ));
    }

    let mut assets = Vec::new();
    for entry in WalkDir::new(&config.asset_root) {
        let entry = entry.with_context(|| {
            format!(
                "Failed to walk asset root: {}",
                config.asset_root.display()
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&config.asset_root).with_context(|| {
            format!(
                "Failed to strip asset root {} from {}",
                config.asset_root.display(),
                path.display()
            )
        })?;
        let relative_path = relative.to_string_lossy().replace('\\', "/");

        if !is_selected(&relative_path, &config.include, &config.exclude) {
            continue;
        }

        let metadata = entry.metadata().with_context(|| {
            format!("Failed to read metadata for local asset: {}", path.display())
        })?;

        assets.push(LocalAsset {
            relative_path,
            absolute_path: path.to_path_buf(),
            size: metadata.len(),
        });
    }

    assets.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(assets)
}

/// A file is selected when it matches the include rules (an entirely empty
/// include set selects everything) and matches no exclude rule.
fn is_selected(relative_path: &str, include: &FileRules, exclude: &FileRules) -> bool {
    let include_all =
        include.paths.is_empty() && include.files.is_empty() && include.extensions.is_empty();

    if !include_all && !matches_rules(relative_path, include) {
        return false;
    }
    !matches_rules(relative_path, exclude)
}

fn matches_rules(relative_path: &str, rules: &FileRules) -> bool {
    if rules
        .paths
        .iter()
        .any(|p| path_rule_matches(relative_path, p))
    {
        return true;
    }
    if rules.files.iter().any(|f| relative_path == f) {
        return true;
    }
    rules.extensions.iter().any(|e| {
        Path::new(relative_path)
            .extension()
            .is_some_and(|ext| ext.to_str() == Some(e.as_str()))
    })
}

/// A path rule matches when it appears as a directory-segment sequence
/// anywhere in the file's relative directory, so the rule `js` selects
/// `js/app.js` as well as `vendor/horizon/js/app.js`, but never
/// `jsx/other.js`.
fn path_rule_matches(relative_path: &str, rule: &str) -> bool {
    let dir = relative_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    format!("/{}/", dir).contains(&format!("/{}/", rule))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Lays out a small asset tree:
    /// js/app.js, js/vendor/lib.js, css/site.css, favicon.ico, notes.txt
    fn fixture_tree() -> TempDir {
        let dir = TempDir::new().expect("failed to create temp dir");
        for (path, contents) in [
            ("js/app.js", "console.log('app');"),
            ("js/vendor/lib.js", "console.log('lib');"),
            ("css/site.css", "body {}"),
            ("favicon.ico", "icon-bytes"),
            ("notes.txt", "do not ship"),
        ] {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            let mut file = File::create(full).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
        }
        dir
    }

    fn config(root: &TempDir, include: FileRules, exclude: FileRules) -> FinderConfig {
        FinderConfig {
            asset_root: root.path().to_path_buf(),
            include,
            exclude,
        }
    }

    fn relative_paths(assets: &[LocalAsset]) -> Vec<&str> {
        assets.iter().map(|a| a.relative_path.as_str()).collect()
    }

    #[test]
    fn test_empty_include_selects_everything() -> anyhow::Result<()> {
        let root = fixture_tree();
        let assets = collect_assets(&config(&root, FileRules::default(), FileRules::default()))?;

        assert_eq!(
            relative_paths(&assets),
            vec![
                "css/site.css",
                "favicon.ico",
                "js/app.js",
                "js/vendor/lib.js",
                "notes.txt"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_include_path_selects_subtree() -> anyhow::Result<()> {
        let root = fixture_tree();
        let include = FileRules {
            paths: vec!["js".to_string()],
            ..FileRules::default()
        };
        let assets = collect_assets(&config(&root, include, FileRules::default()))?;

        assert_eq!(relative_paths(&assets), vec!["js/app.js", "js/vendor/lib.js"]);
        Ok(())
    }

    #[test]
    fn test_include_file_and_extension() -> anyhow::Result<()> {
        let root = fixture_tree();
        let include = FileRules {
            files: vec!["favicon.ico".to_string()],
            extensions: vec!["css".to_string()],
            ..FileRules::default()
        };
        let assets = collect_assets(&config(&root, include, FileRules::default()))?;

        assert_eq!(relative_paths(&assets), vec!["css/site.css", "favicon.ico"]);
        Ok(())
    }

    #[test]
    fn test_exclude_removes_included_files() -> anyhow::Result<()> {
        let root = fixture_tree();
        let exclude = FileRules {
            paths: vec!["js/vendor".to_string()],
            extensions: vec!["txt".to_string()],
            ..FileRules::default()
        };
        let assets = collect_assets(&config(&root, FileRules::default(), exclude))?;

        assert_eq!(
            relative_paths(&assets),
            vec!["css/site.css", "favicon.ico", "js/app.js"]
        );
        Ok(())
    }

    #[test]
    fn test_include_path_selects_nested_directories_of_that_name() -> anyhow::Result<()> {
        let root = TempDir::new().expect("failed to create temp dir");
        for path in [
            "js/back.app.js",
            "js/front.app.js",
            "vendor/horizon/js/app.js",
            "vendor/horizon/js/app.js.map",
            "css/front.css",
        ] {
            let full = root.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, "asset").unwrap();
        }
        let include = FileRules {
            paths: vec!["js".to_string()],
            ..FileRules::default()
        };
        let assets = collect_assets(&config(&root, include, FileRules::default()))?;

        // A "js" path rule also selects js directories nested under vendor
        // trees, not just the top-level one.
        assert_eq!(
            relative_paths(&assets),
            vec![
                "js/back.app.js",
                "js/front.app.js",
                "vendor/horizon/js/app.js",
                "vendor/horizon/js/app.js.map"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_path_rule_matches_whole_segments_only() {
        // "js" must not match "jsx/other.js", and must only ever match
        // directory segments, never the file name.
        let rules = FileRules {
            paths: vec!["js".to_string()],
            ..FileRules::default()
        };
        assert!(matches_rules("js/app.js", &rules));
        assert!(matches_rules("vendor/horizon/js/app.js", &rules));
        assert!(!matches_rules("jsx/other.js", &rules));
        assert!(!matches_rules("vendor/jsx/other.js", &rules));
        assert!(!matches_rules("vendor/js", &rules));
    }

    #[test]
    fn test_extension_rule_only_consults_the_file_name() {
        let rules = FileRules {
            extensions: vec!["js".to_string()],
            ..FileRules::default()
        };
        assert!(matches_rules("js/app.js", &rules));
        assert!(!matches_rules("v1.2/readme", &rules));
        // A dotted directory name is not an extension for the file below it.
        assert!(!matches_rules("app.js/readme", &rules));
    }

    #[test]
    fn test_md5_of_known_contents() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let path = root.path().join("hello.txt");
        fs::write(&path, "hello")?;

        let asset = LocalAsset {
            relative_path: "hello.txt".to_string(),
            absolute_path: path,
            size: 5,
        };
        assert_eq!(asset.md5()?, "5d41402abc4b2a76b9719d911017c592");
        Ok(())
    }

    #[test]
    fn test_versioned_path_trims_slashes() {
        assert_eq!(versioned_path("js/app.js", "v1"), "v1/js/app.js");
        assert_eq!(versioned_path("js/app.js", "/v1/"), "v1/js/app.js");
    }

    #[test]
    fn test_missing_asset_root_is_error() {
        let config = FinderConfig {
            asset_root: PathBuf::from("/nonexistent/asset/root"),
            include: FileRules::default(),
            exclude: FileRules::default(),
        };
        assert!(collect_assets(&config).is_err());
    }
}
