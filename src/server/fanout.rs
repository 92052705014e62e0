// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Fan-out primitives: one byte blob, many outbound queues. Appends to
//! different queues are not a single atomic event; per-queue order is the
//! only guarantee.

use anyhow::Result;

use crate::{
    models::{channel::Channel, session::Session},
    server::context::App,
    store::{channels, sessions},
};

/// Every member of a channel.
pub async fn to_channel(app: &App, channel: &Channel, data: &[u8]) -> Result<()> {
    to_members(app, &channel.members, data).await
}

/// An explicit recipient list.
pub async fn to_members(app: &App, members: &[i32], data: &[u8]) -> Result<()> {
    for &member_id in members {
        sessions::enqueue_data(app, member_id, data).await?;
    }
    Ok(())
}

/// Everyone in the match's room channel minus the immune ids, and optionally
/// everyone watching `#lobby`.
pub async fn to_match(
    app: &App,
    match_id: i32,
    data: &[u8],
    lobby: bool,
    immune: &[i32],
) -> Result<()> {
    if let Some(match_chat) =
        channels::fetch_by_name(app, &format!("#multi_{match_id}")).await?
    {
        let recipients: Vec<i32> = match_chat
            .members
            .iter()
            .copied()
            .filter(|member_id| !immune.contains(member_id))
            .collect();
        to_members(app, &recipients, data).await?;
    }

    if lobby
        && let Some(lobby_chat) = channels::fetch_by_name(app, "#lobby").await?
    {
        to_members(app, &lobby_chat.members, data).await?;
    }

    Ok(())
}

/// Every spectator of the given host.
pub async fn to_spectators(app: &App, host: &Session, data: &[u8]) -> Result<()> {
    to_members(app, &host.spectators, data).await
}

/// Every session in the global list minus the immune ids.
pub async fn to_global(app: &App, data: &[u8], immune: &[i32]) -> Result<()> {
    sessions::enqueue_global(app, data, immune).await
}
