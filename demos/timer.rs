//! Timed alert timeline.
//!
//! Connects to a device and walks a fixed timeline of alerts — the sort of
//! thing that keeps a workshop on schedule from the room system itself.
//!
//! Usage:
//!   XAPI_URL=wss://device.example.net/ws \
//!   XAPI_USER=admin XAPI_PASSWORD=secret \
//!   cargo run --example timer
//!
//! Set XAPI_INSECURE=1 for devices with self-signed certificates.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webex_xapi::Client;

const DISPLAY_TIME: Duration = Duration::from_secs(10);

const TIMELINE: &[(u64, &str, &str)] = &[
    (0, "Workshop", "Welcome! First session starts now"),
    (25 * 60, "Workshop", "Five minutes left in this session"),
    (30 * 60, "Workshop", "Break time — back in ten"),
    (40 * 60, "Workshop", "Second session starts now"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::var("XAPI_URL").context("XAPI_URL not set")?;
    let user = std::env::var("XAPI_USER").context("XAPI_USER not set")?;
    let password = std::env::var("XAPI_PASSWORD").context("XAPI_PASSWORD not set")?;
    let insecure = std::env::var("XAPI_INSECURE").is_ok();

    let client = Client::builder()
        .url(&url)
        .credentials(user, password)
        .insecure(insecure)
        .connect()
        .await?;

    info!(url, "connected");

    let session = client.clone();
    let run = tokio::spawn(async move { session.run().await });

    let mut elapsed = 0;
    for &(at, title, message) in TIMELINE {
        tokio::time::sleep(Duration::from_secs(at - elapsed)).await;
        elapsed = at;

        info!(title, message, "sending alert");
        client.alert(title, message, DISPLAY_TIME).await?;
    }

    client.close().await?;
    if let Err(err) = run.await? {
        warn!(error = %err, "receive loop ended with error");
    }

    Ok(())
}
