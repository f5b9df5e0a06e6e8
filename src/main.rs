//! CDN Asset Sync Tool
//!
//! Provides CLI interface for synchronizing local assets to a CDN disk

// assetsync/src/main.rs
mod config;
mod finder;
mod storage;
mod sync;

use anyhow::{Context, Result};
use config::AppConfig;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use storage::s3::S3Disk;

/// Main entry point for the asset sync tool
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    // Expects config.json in the same directory as the executable
    // or the project root if running with `cargo run`.
    let config_path = PathBuf::from("config.json");
    let app_config = AppConfig::load_from_json(&config_path).context(format!(
        "Failed to load application configuration from {}",
        config_path.display()
    ))?;

    let args: Vec<String> = env::args().collect();
    let (choice, version_path) = parse_args(&args[1..]);
    let choice = match choice {
        Some(choice) => choice,
        None => prompt_choice()?,
    };
    let version = version_path.as_deref();

    let disk = S3Disk::connect(&app_config.disk)
        .await
        .context("Failed to connect to the CDN disk")?;

    match choice.as_str() {
        "1" | "sync" => {
            println!("⚙️ Starting Sync Process...");
            sync::run_sync_flow(&app_config, &disk, version)
                .await
                .context("Sync process failed")?;
        }
        "2" | "push" => {
            println!("🚀 Starting Push Process...");
            sync::run_push_flow(&app_config, &disk, version)
                .await
                .context("Push process failed")?;
        }
        "3" | "empty" => {
            println!("🗑️ Starting Empty Process...");
            sync::run_empty_flow(&disk)
                .await
                .context("Empty process failed")?;
        }
        _ => {
            println!("❌ Invalid choice. Please enter '1' (sync), '2' (push), or '3' (empty).");
            anyhow::bail!("Invalid operation choice");
        }
    }
    Ok(())
}

/// Splits argv into the operation choice and the optional version path.
///
/// The version path is passed as `--version-path=<path>`; surrounding
/// slashes are trimmed and an empty value counts as no version.
fn parse_args(args: &[String]) -> (Option<String>, Option<String>) {
    let mut choice = None;
    let mut version_path = None;

    for arg in args {
        if let Some(value) = arg.strip_prefix("--version-path=") {
            let value = value.trim_matches('/');
            if !value.is_empty() {
                version_path = Some(value.to_string());
            }
        } else if choice.is_none() {
            choice = Some(arg.trim().to_string());
        }
    }

    (choice, version_path)
}

/// Prompts user to select an operation
///
/// Returns the user's choice as String
fn prompt_choice() -> Result<String> {
    use std::io::{Write, stdin, stdout};

    println!("Select an operation:");
    println!("1. Sync Assets (diff, upload changes, delete orphans) (or type 'sync')");
    println!("2. Push Assets (upload everything) (or type 'push')");
    println!("3. Empty CDN Disk (delete all remote files) (or type 'empty')");
    print!("Enter your choice: ");
    let _ = stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;
    Ok(input.trim().to_string())
}
