//! shipwright - one-shot deploy driver
//!
//! Drives a single deployment from the command line:
//!
//! ```text
//! shipwright --provider=netlify --path=/p --name="My App" --token=... --env=API_KEY=abc
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::error;

use shipwright::cli::locate::PackagingMode;
use shipwright::deploy::netlify::read_site_state;
use shipwright::logs::{init_logging, LogLevel, LogOptions};
use shipwright::models::request::{DeploymentRequest, Provider};
use shipwright::DeploymentService;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();
    let mut env_vars: Vec<(String, String)> = Vec::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format; --env=K=V may repeat
            let clean_key = key.trim_start_matches('-');
            if clean_key == "env" {
                if let Some((name, val)) = value.split_once('=') {
                    env_vars.push((name.to_string(), val.to_string()));
                }
            } else {
                cli_args.insert(clean_key.to_string(), value.to_string());
            }
        } else if arg.starts_with("--") {
            cli_args.insert(arg.trim_start_matches('-').to_string(), "true".to_string());
        }
    }

    let log_level = cli_args
        .get("log-level")
        .and_then(|s| s.parse::<LogLevel>().ok())
        .unwrap_or_default();
    if let Err(e) = init_logging(LogOptions {
        log_level,
        ..Default::default()
    }) {
        println!("Failed to initialize logging: {e}");
    }

    let provider: Provider = match cli_args.get("provider").map(|s| s.parse()) {
        Some(Ok(provider)) => provider,
        _ => {
            eprintln!(
                "Usage: shipwright --provider=railway|netlify --path=<dir> --name=<name> \
                 --token=<token> [--id=<existing id>] [--env=K=V ...]"
            );
            std::process::exit(2);
        }
    };

    let project_path = PathBuf::from(
        cli_args
            .get("path")
            .cloned()
            .unwrap_or_else(|| ".".to_string()),
    );
    let project_name = cli_args
        .get("name")
        .cloned()
        .unwrap_or_else(|| "web-project".to_string());
    let Some(token) = cli_args.get("token").cloned() else {
        eprintln!("Missing --token=<auth token>");
        std::process::exit(2);
    };

    let existing_id = match cli_args.get("id").cloned() {
        Some(id) => Some(id),
        None if provider == Provider::Netlify => read_site_state(&project_path).await,
        None => None,
    };

    let mut service = match DeploymentService::new(PackagingMode::Development) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to construct deployment service: {}", e);
            std::process::exit(1);
        }
    };
    service.initialize().await;

    let request = DeploymentRequest {
        provider,
        project_path,
        project_name,
        auth_token: SecretString::from(token),
        env_vars,
        existing_id,
        progress: Arc::new(|line: &str| println!("{line}")),
    };

    let result = service.deploy(&request).await;
    match serde_json::to_string_pretty(&result) {
        Ok(body) => println!("{body}"),
        Err(e) => error!("Failed to serialize result: {}", e),
    }
    if !result.success {
        std::process::exit(1);
    }
}
