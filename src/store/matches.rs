// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};

use crate::{
    models::multiplayer::Match,
    packets::server as packets,
    server::context::App,
    store::{channels, sessions},
    utils::make_safe_name,
};

const MATCHES_ID_HASH: &str = "herbert:matches:id";
const MATCHES_NAME_HASH: &str = "herbert:matches:name";

fn match_lock(match_id: i32) -> String {
    format!("herbert:locks:matches:{match_id}")
}

pub async fn fetch_by_id(app: &App, id: i32) -> Result<Option<Match>> {
    let Some(raw) = app.kv.hget(MATCHES_ID_HASH, &id.to_string()).await? else {
        return Ok(None);
    };

    Ok(Some(
        serde_json::from_slice(&raw).context("corrupt match record")?,
    ))
}

pub async fn fetch_by_name(app: &App, name: &str) -> Result<Option<Match>> {
    let Some(raw) = app
        .kv
        .hget(MATCHES_NAME_HASH, &make_safe_name(name))
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(
        serde_json::from_slice(&raw).context("corrupt match record")?,
    ))
}

pub async fn fetch_all(app: &App) -> Result<Vec<Match>> {
    app.kv
        .hgetall(MATCHES_NAME_HASH)
        .await?
        .iter()
        .map(|(_, raw)| serde_json::from_slice(raw).context("corrupt match record"))
        .collect()
}

/// Persists the match, then streams UPDATE_MATCH to the room (with the
/// password) and, when `lobby` is set, to `#lobby` (with the password
/// suppressed).
pub async fn update(app: &App, m: &Match, lobby: bool) -> Result<()> {
    write_record(app, m).await?;

    if let Some(match_chat) = channels::fetch_by_name(app, &format!("#multi_{}", m.id)).await? {
        let update_packet = packets::update_match(m, true);
        for &member_id in &match_chat.members {
            sessions::enqueue_data(app, member_id, &update_packet).await?;
        }
    }

    if lobby
        && let Some(lobby_chat) = channels::fetch_by_name(app, "#lobby").await?
    {
        let update_packet = packets::update_match(m, false);
        for &member_id in &lobby_chat.members {
            sessions::enqueue_data(app, member_id, &update_packet).await?;
        }
    }

    Ok(())
}

/// Record write without the UPDATE_MATCH fan-out.
pub async fn write_record(app: &App, m: &Match) -> Result<()> {
    let raw = serde_json::to_vec(m).context("failed to encode match")?;

    let _guard = app.kv.lock(&match_lock(m.id)).await?;
    app.kv.hset(MATCHES_ID_HASH, &m.id.to_string(), raw.clone()).await?;
    app.kv
        .hset(MATCHES_NAME_HASH, &make_safe_name(&m.name), raw)
        .await
}

pub async fn delete(app: &App, m: &Match) -> Result<()> {
    let _guard = app.kv.lock(&match_lock(m.id)).await?;
    app.kv.hdel(MATCHES_ID_HASH, &m.id.to_string()).await?;
    app.kv
        .hdel(MATCHES_NAME_HASH, &make_safe_name(&m.name))
        .await
}

/// The next free match id: max over live matches, plus one.
pub async fn next_match_id(app: &App) -> Result<i32> {
    let max_id = fetch_all(app)
        .await?
        .iter()
        .map(|m| m.id)
        .max()
        .unwrap_or(0);
    Ok(max_id + 1)
}
