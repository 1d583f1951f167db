//! Guardrail CLI
//!
//! Probes and exercises a running PII, toxicity or policy service.

#![allow(clippy::print_stdout)]

use std::io::Read;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_URL: &str = "http://localhost:8001";

/// Guardrail CLI
#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(author, version, about = "Guardrail services CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check liveness (used by the container healthcheck)
    Health {
        /// Service URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// Show backend readiness
    Ready {
        /// Service URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,
    },

    /// Validate a text and print the report
    ///
    /// Example: guard-cli validate "call me at 555-123-4567" --url http://localhost:8001
    /// Example: echo "you idiot" | guard-cli validate - --url http://localhost:8002 \
    ///          --options '{"action_on_fail": "redact"}'
    Validate {
        /// Text to validate, or `-` to read it from stdin
        text: String,

        /// Service URL
        #[arg(short, long, default_value = DEFAULT_URL)]
        url: String,

        /// API key sent as `X-API-Key`
        #[arg(long, env = "GUARD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Extra request options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Format endpoint URL
fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Merge `text` into the optional JSON options object
fn validate_body(text: String, options: Option<&str>) -> anyhow::Result<Value> {
    let mut body = match options {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("Invalid --options JSON")? {
            Value::Object(map) => map,
            _ => bail!("--options must be a JSON object"),
        },
        None => Map::new(),
    };
    body.insert("text".to_string(), Value::String(text));
    Ok(Value::Object(body))
}

fn read_text(arg: String) -> anyhow::Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health { url } => match client.get(endpoint_url(&url, "/health")).send().await {
            Ok(resp) if resp.status().is_success() => {
                println!("✅ Healthy");
            },
            Ok(resp) => {
                println!("❌ Unhealthy: HTTP {}", resp.status());
                std::process::exit(1);
            },
            Err(e) => {
                println!("❌ Unhealthy: {e}");
                std::process::exit(1);
            },
        },

        Commands::Ready { url } => {
            let resp = client.get(endpoint_url(&url, "/ready")).send().await?;
            let status = resp.status();
            let body = resp.json::<Value>().await?;

            println!("📊 Readiness:");
            println!("{}", serde_json::to_string_pretty(&body)?);
            if !status.is_success() {
                std::process::exit(1);
            }
        },

        Commands::Validate {
            text,
            url,
            api_key,
            options,
        } => {
            let body = validate_body(read_text(text)?, options.as_deref())?;
            debug!(url = %url, "Sending validation request");

            let mut request = client.post(endpoint_url(&url, "/validate")).json(&body);
            if let Some(key) = api_key {
                request = request.header("X-API-Key", key);
            }

            let resp = request.send().await?;
            let status = resp.status();
            let report = resp.json::<Value>().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !status.is_success() {
                bail!("Validation request failed: HTTP {status}");
            }
        },
    }

    Ok(())
}
