// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    models::session::Session,
    packets::models::{FriendPacket, ToggleDmsPacket},
    server::context::App,
    store::sessions,
};

pub async fn friend_add(
    app: &App,
    session: &mut Session,
    packet: FriendPacket,
) -> Result<()> {
    let Some(target) = sessions::fetch_by_id(app, packet.target_id).await? else {
        warn!(
            "{} tried to befriend offline user {}",
            session.name(),
            packet.target_id
        );
        return Ok(());
    };

    if session.account.friends.contains(&target.id()) {
        warn!(
            "{} tried to add {}, but they are already friends",
            session.name(),
            target.name()
        );
        return Ok(());
    }

    session.account.friends.push(target.id());
    app.accounts.add_friend(session.id(), target.id()).await?;

    info!("{} added {} as a friend", session.name(), target.name());
    Ok(())
}

pub async fn friend_remove(
    app: &App,
    session: &mut Session,
    packet: FriendPacket,
) -> Result<()> {
    let Some(target) = sessions::fetch_by_id(app, packet.target_id).await? else {
        warn!(
            "{} tried to unfriend offline user {}",
            session.name(),
            packet.target_id
        );
        return Ok(());
    };

    if !session.account.friends.contains(&target.id()) {
        warn!(
            "{} tried to remove {}, but they are not friends",
            session.name(),
            target.name()
        );
        return Ok(());
    }

    session.account.friends.retain(|&id| id != target.id());
    app.accounts.remove_friend(session.id(), target.id()).await?;

    info!("{} removed {} from their friends", session.name(), target.name());
    Ok(())
}

pub async fn toggle_block_non_friend_dms(
    _app: &App,
    session: &mut Session,
    packet: ToggleDmsPacket,
) -> Result<()> {
    session.friend_only_dms = packet.value == 1;
    Ok(())
}
