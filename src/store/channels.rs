// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    models::channel::Channel,
    packets::server as packets,
    server::context::App,
    store::sessions,
    utils::make_safe_name,
};

const CHANNELS_HASH: &str = "herbert:channels";

fn channel_key(name: &str) -> String {
    format!("name_{}", make_safe_name(name))
}

fn channel_lock(name: &str) -> String {
    format!("herbert:locks:channels:{name}")
}

pub async fn fetch_by_name(app: &App, name: &str) -> Result<Option<Channel>> {
    let Some(raw) = app.kv.hget(CHANNELS_HASH, &channel_key(name)).await? else {
        return Ok(None);
    };

    Ok(Some(
        serde_json::from_slice(&raw).context("corrupt channel record")?,
    ))
}

pub async fn fetch_all(app: &App) -> Result<Vec<Channel>> {
    app.kv
        .hgetall(CHANNELS_HASH)
        .await?
        .iter()
        .map(|(_, raw)| {
            serde_json::from_slice(raw).context("corrupt channel record")
        })
        .collect()
}

/// Writes the channel record, then advertises the new member count: to the
/// members only for temp channels, otherwise to every session allowed to see
/// the channel.
pub async fn update(app: &App, channel: &Channel) -> Result<()> {
    write_record(app, channel).await?;

    let info_packet = packets::channel_info(channel);
    if channel.temp {
        for &member_id in &channel.members {
            sessions::enqueue_data(app, member_id, &info_packet).await?;
        }
    } else {
        for target in sessions::fetch_all(app).await? {
            if !channel.public_read && !target.account.is_staff() {
                continue;
            }
            sessions::enqueue_data(app, target.id(), &info_packet).await?;
        }
    }

    Ok(())
}

/// Record write without the CHANNEL_INFO fan-out.
pub async fn write_record(app: &App, channel: &Channel) -> Result<()> {
    let raw = serde_json::to_vec(channel).context("failed to encode channel")?;

    let _guard = app.kv.lock(&channel_lock(&channel.name)).await?;
    app.kv.hset(CHANNELS_HASH, &channel_key(&channel.name), raw).await
}

pub async fn delete(app: &App, channel: &Channel) -> Result<()> {
    let _guard = app.kv.lock(&channel_lock(&channel.name)).await?;
    app.kv.hdel(CHANNELS_HASH, &channel_key(&channel.name)).await
}

/// Seeds persistent channels from config, skipping names that already exist
/// in the store (a replica may have gotten there first).
pub async fn initialise(app: &App) -> Result<()> {
    for seed in &app.cfg.channels {
        if fetch_by_name(app, &seed.name).await?.is_some() {
            continue;
        }

        let channel = Channel {
            name: seed.name.clone(),
            description: seed.description.clone(),
            public_read: seed.public_read,
            public_write: seed.public_write,
            temp: false,
            hidden: seed.hidden,
            members: vec![],
        };
        write_record(app, &channel).await?;
        info!("seeded channel {}", channel.name);
    }

    Ok(())
}
