//! minarai console client
//!
//! - Loads `minarai.yaml` (or the path given as first argument)
//! - Connects over WebSocket and joins as a client
//! - Prints every session event, sends each stdin line as a message
//!
//! Line commands: `/cmd <name> [json]`, `/logs [limit]`, `/upload <path>`,
//! `/bye` (force-disconnect).

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, EnvFilter};

use minarai_client::log::Logger;
use minarai_client::transport::WsTransportFactory;
use minarai_client::{config, Attachment, ClientOptions, SendOptions, SessionClient, UploadOptions};
use minarai_core::error::{MinaraiError, Result};
use minarai_core::protocol::LogsQuery;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;

    // RUST_LOG wins; otherwise the config's logging flags pick the level
    let directive = Logger::new(cfg.logging.debug, cfg.logging.silent).default_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    fmt().with_env_filter(filter).init();
    let client = SessionClient::new(ClientOptions::from_config(&cfg), &WsTransportFactory::new())?;

    let mut events = client.subscribe();
    client.initialize()?;
    tracing::info!(url = %cfg.realtime.url, "minarai-client starting");

    tokio::spawn(async move {
        loop {
            let ev = match events.recv().await {
                Ok(ev) => ev,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event printer fell behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match ev.payload() {
                Some(p) => println!("<- {} {}", ev.name(), p),
                None => println!("<- {}", ev.name()),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| MinaraiError::Internal(format!("stdin: {e}")))?
    {
        if let Err(e) = run_line(&client, line.trim()).await {
            tracing::warn!(error = %e, "command failed");
        }
    }

    client.close();
    Ok(())
}

async fn run_line(client: &SessionClient, line: &str) -> Result<()> {
    if line.is_empty() {
        return Ok(());
    }
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    match head {
        "/cmd" => {
            let (name, extra) = rest.split_once(' ').unwrap_or((rest, ""));
            let extra = if extra.is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(extra)?
            };
            client.send_command(name, extra)
        }
        "/logs" => {
            let limit = rest.parse().ok();
            client.get_logs(LogsQuery { lt_date: None, limit })
        }
        "/upload" => {
            let file = Attachment::from_path(rest).await?;
            let outcome = client.upload_attachment(file, UploadOptions::default()).await?;
            println!("-> upload {}", outcome.to_json());
            Ok(())
        }
        "/bye" => client.force_disconnect(),
        _ => client.send(line, SendOptions::default()),
    }
}
