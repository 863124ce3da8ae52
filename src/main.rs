//! Rulebridge stdio front end.
//!
//! Reads one JSON tool call per line from stdin:
//! `{"id": "1", "name": "find_tool", "arguments": {...}}`
//! and writes one JSON response per line to stdout:
//! `{"id": "1", "ok": true, "body": ...}` or
//! `{"id": "1", "ok": false, "error": {"code": ..., "message": ...}}`.
//! Calls run concurrently; responses are written as they complete.

use clap::Parser;
use rulebridge::tools::{PluginManifest, StaticManifests};
use rulebridge::{Config, Dispatcher, Error, InvocationRequest};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "rulebridge", version, about = "Tool-invocation bridge over stdio")]
struct Args {
    /// JSON config file.
    #[arg(long, env = "RULEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON array of plugin manifests to publish at startup.
    #[arg(long, env = "RULEBRIDGE_MANIFESTS")]
    manifests: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .apply_env();

    // Initialize observability
    rulebridge::observability::init_tracing(&config.observability);

    let dispatcher = Arc::new(Dispatcher::from_config(config)?);

    if let Some(path) = &args.manifests {
        let manifests: Vec<PluginManifest> =
            serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let count = dispatcher.resync(&StaticManifests(manifests)).await?;
        tracing::info!("Loaded {} tools from {}", count, path.display());
    }

    tracing::info!("Rulebridge ready on stdio");

    let (tx, mut rx) = mpsc::channel::<Value>(64);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = response.to_string();
            line.push('\n');
            stdout.write_all(line.as_bytes()).await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let dispatcher = Arc::clone(&dispatcher);
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = handle_line(&dispatcher, &line).await;
            if tx.send(response).await.is_err() {
                tracing::warn!("Response dropped: writer closed");
            }
        });
    }

    // Writer exits once every in-flight call has sent its response.
    drop(tx);
    writer.await??;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Parse and dispatch one request line into a response envelope.
async fn handle_line(dispatcher: &Dispatcher, line: &str) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return error_envelope(Value::Null, &Error::validation(format!("Invalid JSON: {}", e))),
    };
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    let invocation: InvocationRequest = match serde_json::from_value(request) {
        Ok(invocation) => invocation,
        Err(e) => {
            return error_envelope(id, &Error::validation(format!("Invalid invocation: {}", e)))
        }
    };

    match dispatcher.invoke(invocation).await {
        Ok(body) => serde_json::json!({
            "id": id,
            "ok": true,
            "body": body,
        }),
        Err(e) => error_envelope(id, &e),
    }
}

fn error_envelope(id: Value, err: &Error) -> Value {
    serde_json::json!({
        "id": id,
        "ok": false,
        "error": {
            "code": err.to_error_code(),
            "message": err.to_string(),
        }
    })
}
