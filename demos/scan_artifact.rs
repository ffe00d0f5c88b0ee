//! Scans one artifact from an MWDB repository.
//!
//! This example shows how to:
//! - Load configuration from the environment (and an optional `.env` file)
//! - Build a ScanOrchestrator backed by the MWDB client
//! - Process an artifact and inspect the summary
//!
//! Run with:
//!
//! ```text
//! SCANHOOK_REPOSITORY_URL=https://mwdb.example.org/api/ \
//! SCANHOOK_REPOSITORY_API_KEY=... \
//! cargo run --example scan_artifact -- <sha256> [--reuploaded]
//! ```

use scanhook::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(artifact_id) = args.next() else {
        eprintln!("usage: scan_artifact <artifact-id> [--reuploaded]");
        std::process::exit(2);
    };
    let reason = match args.next().as_deref() {
        Some("--reuploaded") => ScanReason::Reuploaded,
        _ => ScanReason::Created,
    };

    let config = ScanHookConfig::from_env()?;
    let orchestrator = ScanOrchestrator::from_config(&config)?;

    println!("=== Scanhook ===\n");
    println!("Artifact: {}", artifact_id);
    println!("Engines: {:?}", config.enabled_engines());
    println!("Sandbox: {}", config.sandbox_dir.display());

    let summary = orchestrator.process(&artifact_id, reason).await;

    println!("\n=== Summary ===");
    println!("Run ID: {}", summary.run_id);
    println!("Stage: {} (last completed: {})", summary.stage, summary.last_stage);
    println!("Duration: {} ms", summary.duration_ms());

    for result in &summary.results {
        println!("  {:?} -> {:?}", result.engine, result.outcome);
    }
    if let Some(ref comment) = summary.comment {
        println!("\nComment:\n{}", comment);
    }
    if !summary.tags_added.is_empty() {
        println!("Tags added: {}", summary.tags_added.join(", "));
    }
    if !summary.tags_removed.is_empty() {
        println!("Tags removed: {}", summary.tags_removed.join(", "));
    }
    if let Some(ref error) = summary.error {
        println!("\nStopped: {}", error);
    }

    Ok(())
}
