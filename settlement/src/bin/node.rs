//! Settlement node binary
//!
//! Reads one JSON command per line from stdin and writes one JSON result
//! per line to stdout. Logs go to stderr. Prometheus metrics are served on
//! `metrics_listen_addr` when it is set.
//!
//! A line with `federation_id` is a group optimization, a line with
//! `instrument_type` is an instrument issuance, anything else is a
//! settlement request. Amounts and rates are JSON strings, e.g.
//! `"amount": "50000"`.

use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use settlement::{
    Config, GroupOptimizationRequest, InstrumentRequest, SettlementEngine, SettlementRequest,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum Command {
    Settle(SettlementRequest),
    OptimizeGroup(GroupOptimizationRequest),
    IssueInstrument(InstrumentRequest),
}

impl Command {
    /// Parse one line, picking the variant by its key field
    fn parse(line: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let has = |key: &str| value.get(key).is_some();

        if has("federation_id") {
            serde_json::from_value(value).map(Command::OptimizeGroup)
        } else if has("instrument_type") {
            serde_json::from_value(value).map(Command::IssueInstrument)
        } else {
            serde_json::from_value(value).map(Command::Settle)
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: &'static str,
    corridors: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(config.log_json);

    info!(service = %config.service_name, "Starting settlement node");

    let engine = Arc::new(SettlementEngine::new(config).await?);

    let listen_addr = engine.config().metrics_listen_addr.clone();
    if !listen_addr.is_empty() {
        let listener = tokio::net::TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("Failed to bind metrics listener on {}", listen_addr))?;
        info!(addr = %listen_addr, "Serving /health and /metrics");

        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(engine.clone());

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling in-flight settlements");
                cancel.cancel();
            }
        });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let output = handle_line(&engine, &line, &cancel).await;
        stdout.write_all(output.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.shutdown().await?,
        Err(_) => info!("Engine still shared by the metrics server, exiting"),
    }

    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    let config = match std::env::var("RAIL_CONFIG") {
        Ok(path) => {
            let mut config = Config::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path))?;
            config.apply_env()?;
            config
        }
        Err(_) => Config::from_env()?,
    };
    Ok(config)
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn handle_line(
    engine: &SettlementEngine,
    line: &str,
    cancel: &CancellationToken,
) -> serde_json::Value {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Malformed command");
            return serde_json::json!({
                "error": { "kind": "malformed_command", "message": e.to_string() }
            });
        }
    };

    let result = match command {
        Command::Settle(request) => engine
            .settle_with_cancel(request, cancel.child_token())
            .await
            .and_then(|r| to_value(&r)),
        Command::OptimizeGroup(request) => engine
            .optimize_group(&request)
            .and_then(|r| to_value(&r)),
        Command::IssueInstrument(request) => engine
            .issue_instrument(&request)
            .and_then(|r| to_value(&r)),
    };

    match result {
        Ok(value) => serde_json::json!({ "ok": value }),
        Err(e) => serde_json::json!({
            "error": { "kind": e.kind(), "message": e.to_string() }
        }),
    }
}

fn to_value<T: Serialize>(value: &T) -> settlement::Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| settlement::Error::Other(e.to_string()))
}

async fn health_handler(State(engine): State<Arc<SettlementEngine>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: engine.config().service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        corridors: engine.snapshot().corridors().len(),
    })
}

async fn metrics_handler(
    State(engine): State<Arc<SettlementEngine>>,
) -> Result<String, (StatusCode, String)> {
    engine.export_metrics().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to export metrics: {}", e),
        )
    })
}
