//! War room listener.
//!
//! Connects to a war-room hub, prints attack updates and chat messages, and
//! rebuilds its subscriptions after every reconnect.
//!
//! Usage:
//!   WARROOM_HUB_URL=https://host/hubs/warroom WARROOM_TOKEN=... \
//!   cargo run --example warroom
//!
//! Set `RUST_LOG=hub_longpoll=debug` to watch the session lifecycle.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use hub_longpoll::{ChangeKind, ConnectionEvent, HubClient};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attack {
    id: u64,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    is_done: bool,
    #[serde(default)]
    is_full: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttackUpdate {
    #[serde(default)]
    event_type: ChangeKind,
    attack: Attack,
}

#[derive(Debug, Deserialize)]
struct WarRoomAttacks {
    #[serde(default)]
    attacks: Vec<Attack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WarRoom {
    #[serde(alias = "id")]
    war_room_id: u64,
}

// ============================================================================
// Resync
// ============================================================================

/// Announces the display name and reloads attacks of every war room.
async fn subscribe(client: HubClient, display_name: String) -> hub_longpoll::Result<()> {
    client.send("SetDisplayName", vec![json!(display_name)]).await;

    let rooms: Vec<WarRoom> = client.invoke_as("GetWarRooms", vec![]).await?;
    for room in rooms {
        if let Err(e) = client.invoke("GetAttacks", vec![json!(room.war_room_id)]).await {
            warn!(war_room_id = room.war_room_id, error = %e, "Failed to load attacks");
        }
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let hub_url = env::var("WARROOM_HUB_URL").context("WARROOM_HUB_URL is not set")?;
    let token = env::var("WARROOM_TOKEN").context("WARROOM_TOKEN is not set")?;
    let display_name = env::var("WARROOM_NAME").unwrap_or_else(|_| "Rust".to_string());

    let resync_name = display_name.clone();
    let client = HubClient::builder()
        .url(hub_url)
        .access_token(token)
        .on_reconnect(move |client| subscribe(client, resync_name.clone()))
        .on_lifecycle(|event| match event {
            ConnectionEvent::ConnectionLost => warn!("Connection lost, giving up"),
            ConnectionEvent::Closed { error } => warn!(?error, "Hub closed the connection"),
            other => info!(?other, "Lifecycle"),
        })
        .build()?;

    client.on_arg("AttackUpdate", |update: AttackUpdate| {
        let attack = &update.attack;
        if update.event_type.is_terminal() || attack.is_done {
            info!(attack_id = attack.id, "Attack finished");
        } else if attack.is_full && attack.link.is_none() {
            info!(attack_id = attack.id, "Attack full");
        } else {
            info!(attack_id = attack.id, kind = %update.event_type, link = ?attack.link, "Attack");
        }
        Ok(())
    });

    client.on_arg("WarRoomAttacks", |data: WarRoomAttacks| {
        let open = data.attacks.iter().filter(|attack| !attack.is_done).count();
        info!(open, total = data.attacks.len(), "War room attacks loaded");
        Ok(())
    });

    client.on("ReceiveMessage", |args: &[Value]| {
        info!(message = ?args.first(), "Message");
        Ok(())
    });

    client.start().await.context("failed to connect")?;
    subscribe(client.clone(), display_name).await?;
    info!(connection_id = ?client.connection_id(), "Listening for attacks");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        () = wait_until_stopped(&client) => {}
    }

    client.stop();
    Ok(())
}

async fn wait_until_stopped(client: &HubClient) {
    while client.state() != hub_longpoll::SessionState::Stopped {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
